/*!
 * Facility joiner
 *
 * Selects the facilities of a scope and pairs each metrics row with the
 * provider profile of the same facility. Stages that need both sides read the
 * inner join; the counts-only stages read the wider single-sided lists.
 */

use std::collections::HashMap;

use crate::data_types::{FacilityId, FacilityMetrics, ProviderProfile, Scope};
use crate::dataset::WrappedDataset;
use crate::observe::{Diagnostic, Observer};
use crate::resolver::ResolvedScope;

/// Metrics row and profile of one facility
#[derive(Debug, Clone, Copy)]
pub struct JoinedFacility<'a> {
    pub metrics: &'a FacilityMetrics,
    pub profile: &'a ProviderProfile,
}

impl<'a> JoinedFacility<'a> {
    pub fn facility_id(&self) -> &'a FacilityId {
        &self.metrics.facility_id
    }
}

/// Facility population of one scope
#[derive(Debug, Clone)]
pub struct ScopeJoin<'a> {
    pub scope: Scope,
    /// Current metrics rows in scope, input order
    pub facilities: Vec<&'a FacilityMetrics>,
    /// Current profiles in scope, input order
    pub profiles: Vec<&'a ProviderProfile>,
    /// Inner join of the two lists above, in metrics order
    pub joined: Vec<JoinedFacility<'a>>,
    pub prior_facilities: HashMap<&'a FacilityId, &'a FacilityMetrics>,
    pub prior_profiles: HashMap<&'a FacilityId, &'a ProviderProfile>,
    pub metrics_only: usize,
    pub profile_only: usize,
}

impl<'a> ScopeJoin<'a> {
    /// Joined facilities whose staffing may be used
    pub fn usable(&self) -> impl Iterator<Item = &JoinedFacility<'a>> {
        self.joined.iter().filter(|f| f.metrics.has_usable_staffing())
    }

    pub fn prior_facility(&self, id: &FacilityId) -> Option<&'a FacilityMetrics> {
        self.prior_facilities.get(id).copied()
    }

    pub fn prior_profile(&self, id: &FacilityId) -> Option<&'a ProviderProfile> {
        self.prior_profiles.get(id).copied()
    }
}

/// Build the facility population of a resolved scope
///
/// Facilities are placed by the jurisdiction on their own row. Facilities
/// present on one side only are reported to `observer` and left out of
/// `joined`.
pub fn join_scope<'a>(
    dataset: &'a WrappedDataset,
    resolved: &ResolvedScope<'_>,
    observer: &dyn Observer,
) -> ScopeJoin<'a> {
    let current = &dataset.current;

    let facilities: Vec<&FacilityMetrics> = current
        .facilities
        .iter()
        .filter(|f| resolved.contains(f.state))
        .collect();
    let profiles: Vec<&ProviderProfile> = current
        .providers
        .iter()
        .filter(|p| resolved.contains(p.state))
        .collect();

    let joined: Vec<JoinedFacility> = facilities
        .iter()
        .copied()
        .filter_map(|metrics| {
            current
                .provider(&metrics.facility_id)
                .filter(|profile| resolved.contains(profile.state))
                .map(|profile| JoinedFacility { metrics, profile })
        })
        .collect();

    let metrics_only = facilities.len() - joined.len();
    let profile_only = profiles
        .iter()
        .filter(|p| current.facility(&p.facility_id).map_or(true, |f| !resolved.contains(f.state)))
        .count();
    if metrics_only > 0 || profile_only > 0 {
        observer.record(&Diagnostic::IncompleteJoin {
            scope: resolved.scope,
            metrics_only,
            profile_only,
        });
    }

    let (prior_facilities, prior_profiles) = match &dataset.prior {
        Some(prior) => (
            prior
                .facilities
                .iter()
                .filter(|f| resolved.contains(f.state))
                .map(|f| (&f.facility_id, f))
                .collect(),
            prior
                .providers
                .iter()
                .filter(|p| resolved.contains(p.state))
                .map(|p| (&p.facility_id, p))
                .collect(),
        ),
        None => (HashMap::new(), HashMap::new()),
    };

    ScopeJoin {
        scope: resolved.scope,
        facilities,
        profiles,
        joined,
        prior_facilities,
        prior_profiles,
        metrics_only,
        profile_only,
    }
}
