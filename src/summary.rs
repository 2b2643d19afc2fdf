/*!
 * Scope summary assembly
 *
 * [`WrappedEngine`] resolves a scope, builds its facility join and then runs
 * the ranking, extremes, trend, ownership and regulatory stages against the
 * completed join. The engine only reads the dataset, so summaries of
 * different scopes can be computed on independent threads.
 */

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aggregate::{region_members, scope_basics, RegionMemberSummary, ScopeBasics};
use crate::config::WrappedConfig;
use crate::data_types::{QuarterPair, RegionNumber, Scope, ScopeType, StateCode, StateMinimumStandard};
use crate::dataset::WrappedDataset;
use crate::extremes::{select_extremes, Extremes};
use crate::join::join_scope;
use crate::normalize::resolve_identifier;
use crate::observe::{Observer, TracingObserver};
use crate::ownership::{ownership_breakdown, state_compliance, ComplianceSummary, OwnershipBreakdown};
use crate::ranking::{rank_scope, Rankings};
use crate::regulatory::{regulatory_summary, RegulatoryStatusSummary};
use crate::resolver::resolve;
use crate::trends::{region_movers, scope_movers, scope_trends, Movers, TrendSummary};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeIdentity {
    pub scope_type: ScopeType,
    pub identifier: String,
    pub display_name: String,
    pub quarters: QuarterPair,
}

/// Everything known about one scope for one quarter pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSummary {
    pub identity: ScopeIdentity,
    pub basics: ScopeBasics,
    pub rankings: Rankings,
    pub extremes: Extremes,
    pub trends: TrendSummary,
    pub movers: Movers,
    /// Region leaderboards, nation only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_movers: Option<Movers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ownership: Option<OwnershipBreakdown>,
    pub regulatory_status: RegulatoryStatusSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<ComplianceSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_minimum: Option<StateMinimumStandard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_members: Option<Vec<RegionMemberSummary>>,
}

/// Computes scope summaries over one dataset
pub struct WrappedEngine<'a> {
    dataset: &'a WrappedDataset,
    config: WrappedConfig,
    observer: Arc<dyn Observer>,
}

impl<'a> WrappedEngine<'a> {
    /// Engine with default configuration and a tracing observer
    pub fn new(dataset: &'a WrappedDataset) -> Self {
        Self {
            dataset,
            config: WrappedConfig::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_config(mut self, config: WrappedConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn dataset(&self) -> &'a WrappedDataset {
        self.dataset
    }

    pub fn config(&self) -> &WrappedConfig {
        &self.config
    }

    /// Summarize a free-form identifier such as `"new-york"` or `"region_2"`
    pub fn summarize(&self, identifier: &str) -> Result<ScopeSummary> {
        self.summarize_scope(resolve_identifier(identifier)?)
    }

    /// Summarize a scope
    ///
    /// Fails only when the scope has no current-quarter row.
    pub fn summarize_scope(&self, scope: Scope) -> Result<ScopeSummary> {
        let dataset = self.dataset;
        let observer = self.observer.as_ref();
        let config = &self.config;

        let resolved = resolve(dataset, scope)?;
        // Every later stage reads the completed join
        let join = join_scope(dataset, &resolved, observer);

        let basics = scope_basics(&resolved, &join);
        let rankings = rank_scope(&dataset.current, scope);
        let extremes = select_extremes(&join, &dataset.current, config);
        let trends = scope_trends(&resolved, dataset.quarters.prior, observer);
        let movers = scope_movers(dataset, &join, config);
        let region_movers = matches!(scope, Scope::Usa).then(|| region_movers(dataset, config));
        let ownership = ownership_breakdown(&join);
        let regulatory_status = regulatory_summary(dataset, &join, config);

        let (compliance, state_minimum) = match scope {
            Scope::State(state) => (state_compliance(dataset, &join), dataset.state_minimum(state).copied()),
            _ => (None, None),
        };
        let region_members = match scope {
            Scope::Region(region) => Some(region_members(dataset, region, &join)),
            _ => None,
        };

        Ok(ScopeSummary {
            identity: ScopeIdentity {
                scope_type: scope.scope_type(),
                identifier: scope.canonical_key(),
                display_name: scope.display_name(),
                quarters: dataset.quarters,
            },
            basics,
            rankings,
            extremes,
            trends,
            movers,
            region_movers,
            ownership,
            regulatory_status,
            compliance,
            state_minimum,
            region_members,
        })
    }

    /// The nation, every state and DC, and every region
    pub fn all_scopes() -> Vec<Scope> {
        std::iter::once(Scope::Usa)
            .chain(StateCode::states_and_dc().map(Scope::State))
            .chain(RegionNumber::all().map(Scope::Region))
            .collect()
    }

    /// Summarize every scope, in [`Self::all_scopes`] order
    pub fn summarize_all(&self) -> Vec<(Scope, Result<ScopeSummary>)> {
        let scopes = Self::all_scopes();

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let run = || -> Vec<(Scope, Result<ScopeSummary>)> {
                scopes
                    .par_iter()
                    .map(|scope| (*scope, self.summarize_scope(*scope)))
                    .collect()
            };
            match self.config.parallel_threads {
                Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                    Ok(pool) => pool.install(run),
                    Err(e) => {
                        tracing::warn!(error = %e, "falling back to the global thread pool");
                        run()
                    }
                },
                None => run(),
            }
        }

        #[cfg(not(feature = "parallel"))]
        {
            scopes
                .iter()
                .map(|scope| (*scope, self.summarize_scope(*scope)))
                .collect()
        }
    }
}
