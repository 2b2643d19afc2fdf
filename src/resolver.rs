/*!
 * Scope resolution against a built dataset
 */

use std::collections::BTreeSet;

use crate::data_types::{QuarterlyEntityMetrics, Scope, StateCode};
use crate::dataset::WrappedDataset;
use crate::normalize::resolve_identifier;
use crate::{Result, WrappedError};

/// A scope with its entity rows and member jurisdictions
#[derive(Debug, Clone)]
pub struct ResolvedScope<'a> {
    pub scope: Scope,
    pub current: &'a QuarterlyEntityMetrics,
    /// `None` when the prior quarter has no row for this scope
    pub prior: Option<&'a QuarterlyEntityMetrics>,
    members: Option<BTreeSet<StateCode>>,
}

impl<'a> ResolvedScope<'a> {
    /// Jurisdictions whose facilities belong to this scope; `None` means all
    pub fn jurisdictions(&self) -> Option<&BTreeSet<StateCode>> {
        self.members.as_ref()
    }

    pub fn contains(&self, state: StateCode) -> bool {
        self.members.as_ref().map_or(true, |members| members.contains(&state))
    }
}

/// Resolve a free-form identifier
pub fn resolve_str<'a>(dataset: &'a WrappedDataset, identifier: &str) -> Result<ResolvedScope<'a>> {
    resolve(dataset, resolve_identifier(identifier)?)
}

/// Look up the current and prior rows of `scope`
///
/// A scope with no current-quarter row is an error; a missing prior row is not.
pub fn resolve(dataset: &WrappedDataset, scope: Scope) -> Result<ResolvedScope<'_>> {
    let current = dataset.current.entity(scope).ok_or_else(|| WrappedError::NoCurrentData {
        scope: scope.canonical_key(),
        quarter: dataset.quarters.current.to_string(),
    })?;
    let prior = dataset.prior.as_ref().and_then(|prior| prior.entity(scope));

    let members = match scope {
        Scope::Usa => None,
        Scope::State(state) => Some(BTreeSet::from([state])),
        Scope::Region(region) => Some(
            dataset
                .region_membership
                .members(region)
                .cloned()
                .unwrap_or_default(),
        ),
    };

    Ok(ResolvedScope { scope, current, prior, members })
}
