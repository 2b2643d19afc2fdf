/*!
 * Quarter-over-quarter trends and mover leaderboards
 *
 * A missing prior row yields zero deltas with `has_prior_data == false`, so
 * callers can tell "no prior data" from "no change".
 */

use serde::{Deserialize, Serialize};

use crate::config::WrappedConfig;
use crate::data_types::{QuarterTag, Scope, ScopeType, StateCode};
use crate::dataset::WrappedDataset;
use crate::extremes::eligible;
use crate::join::ScopeJoin;
use crate::observe::{Diagnostic, Observer};
use crate::ranking::{peers, StaffingMetric};
use crate::resolver::ResolvedScope;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub has_prior_data: bool,
    pub prior_quarter: QuarterTag,
    #[serde(rename = "totalHPRDChange")]
    pub total_hprd_change: f64,
    #[serde(rename = "directCareHPRDChange")]
    pub direct_care_hprd_change: f64,
    #[serde(rename = "rnHPRDChange")]
    pub rn_hprd_change: f64,
    pub contract_percent_change: f64,
}

/// Deltas of the scope's own headline metrics
pub fn scope_trends(resolved: &ResolvedScope<'_>, prior_quarter: QuarterTag, observer: &dyn Observer) -> TrendSummary {
    let Some(prior) = resolved.prior else {
        observer.record(&Diagnostic::MissingPriorQuarter {
            scope: resolved.scope,
            quarter: prior_quarter,
        });
        return TrendSummary {
            has_prior_data: false,
            prior_quarter,
            total_hprd_change: 0.0,
            direct_care_hprd_change: 0.0,
            rn_hprd_change: 0.0,
            contract_percent_change: 0.0,
        };
    };

    let current = resolved.current;
    TrendSummary {
        has_prior_data: true,
        prior_quarter,
        total_hprd_change: current.hprd.total - prior.hprd.total,
        direct_care_hprd_change: current.hprd.direct_care - prior.hprd.direct_care,
        rn_hprd_change: current.hprd.rn - prior.hprd.rn,
        contract_percent_change: current.contract_percent - prior.contract_percent,
    }
}

/// Kind of constituent ranked in the leaderboards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstituentKind {
    Facility,
    State,
    Region,
}

/// Change record of one constituent on one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoverEntry {
    pub identifier: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<StateCode>,
    pub current: f64,
    pub prior: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub risers: Vec<MoverEntry>,
    pub decliners: Vec<MoverEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movers {
    pub constituent: ConstituentKind,
    #[serde(rename = "totalHPRD")]
    pub total_hprd: Leaderboard,
    #[serde(rename = "directCareHPRD")]
    pub direct_care_hprd: Leaderboard,
    #[serde(rename = "rnHPRD")]
    pub rn_hprd: Leaderboard,
}

/// Both-quarter values of one constituent
struct Constituent {
    identifier: String,
    display_name: String,
    state: Option<StateCode>,
    current: [f64; 3],
    prior: [f64; 3],
}

/// Mover leaderboards for a scope
///
/// Constituents are facilities for a state or region (usable staffing in both
/// quarters, census floor applied) and states for the nation. Only positive
/// deltas rise and only negative deltas decline.
pub fn scope_movers(dataset: &WrappedDataset, join: &ScopeJoin<'_>, config: &WrappedConfig) -> Movers {
    match join.scope {
        Scope::Usa => movers(ConstituentKind::State, entity_constituents(dataset, ScopeType::State), config),
        Scope::State(_) | Scope::Region(_) => {
            movers(ConstituentKind::Facility, facility_constituents(join, config), config)
        }
    }
}

/// Region leaderboards, reported alongside the state movers of the nation
pub fn region_movers(dataset: &WrappedDataset, config: &WrappedConfig) -> Movers {
    movers(ConstituentKind::Region, entity_constituents(dataset, ScopeType::Region), config)
}

fn movers(constituent: ConstituentKind, records: Vec<Constituent>, config: &WrappedConfig) -> Movers {
    let board = |idx: usize| leaderboard(&records, idx, config.movers_count);
    Movers {
        constituent,
        total_hprd: board(0),
        direct_care_hprd: board(1),
        rn_hprd: board(2),
    }
}

fn metric_values(value: impl Fn(StaffingMetric) -> f64) -> [f64; 3] {
    StaffingMetric::ALL.map(value)
}

fn facility_constituents(join: &ScopeJoin<'_>, config: &WrappedConfig) -> Vec<Constituent> {
    eligible(join, config.min_census)
        .into_iter()
        .filter_map(|f| {
            let prior = join
                .prior_facility(&f.metrics.facility_id)
                .filter(|p| p.has_usable_staffing())?;
            Some(Constituent {
                identifier: f.metrics.facility_id.to_string(),
                display_name: f.profile.name.clone(),
                state: Some(f.metrics.state),
                current: metric_values(|m| m.facility_value(f.metrics)),
                prior: metric_values(|m| m.facility_value(prior)),
            })
        })
        .collect()
}

fn entity_constituents(dataset: &WrappedDataset, level: ScopeType) -> Vec<Constituent> {
    let Some(prior_data) = dataset.prior.as_ref() else {
        return Vec::new();
    };
    peers(&dataset.current, level)
        .into_iter()
        .filter_map(|row| {
            let prior = prior_data.entity(row.entity)?;
            let state = match row.entity {
                Scope::State(state) => Some(state),
                _ => None,
            };
            Some(Constituent {
                identifier: row.entity.canonical_key(),
                display_name: row.entity.display_name(),
                state,
                current: metric_values(|m| m.entity_value(row)),
                prior: metric_values(|m| m.entity_value(prior)),
            })
        })
        .collect()
}

fn leaderboard(records: &[Constituent], idx: usize, n: usize) -> Leaderboard {
    let mut entries: Vec<MoverEntry> = records
        .iter()
        .map(|c| MoverEntry {
            identifier: c.identifier.clone(),
            display_name: c.display_name.clone(),
            state: c.state,
            current: c.current[idx],
            prior: c.prior[idx],
            delta: c.current[idx] - c.prior[idx],
        })
        .collect();

    entries.sort_by(|a, b| b.delta.total_cmp(&a.delta).then_with(|| a.identifier.cmp(&b.identifier)));
    let risers = entries.iter().filter(|e| e.delta > 0.0).take(n).cloned().collect();

    entries.sort_by(|a, b| a.delta.total_cmp(&b.delta).then_with(|| a.identifier.cmp(&b.identifier)));
    let decliners = entries.into_iter().filter(|e| e.delta < 0.0).take(n).collect();

    Leaderboard { risers, decliners }
}
