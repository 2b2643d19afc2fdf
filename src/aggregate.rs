/*!
 * Scope basics and statistical helpers
 */

use serde::{Deserialize, Serialize};

use crate::data_types::{RegionNumber, Scope, StateCode, StateMinimumStandard};
use crate::dataset::WrappedDataset;
use crate::join::ScopeJoin;
use crate::resolver::ResolvedScope;

/// Headline staffing figures of a scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeBasics {
    pub facility_count: u32,
    pub avg_daily_residents: f64,
    #[serde(rename = "totalHPRD")]
    pub total_hprd: f64,
    #[serde(rename = "directCareHPRD")]
    pub direct_care_hprd: f64,
    #[serde(rename = "rnHPRD")]
    pub rn_hprd: f64,
    #[serde(rename = "rnDirectCareHPRD")]
    pub rn_direct_care_hprd: f64,
    #[serde(rename = "nurseAideHPRD", skip_serializing_if = "Option::is_none")]
    pub nurse_aide_hprd: Option<f64>,
    pub contract_percent: f64,
    /// Median facility total HPRD, national scope only
    #[serde(rename = "medianHPRD", skip_serializing_if = "Option::is_none")]
    pub median_hprd: Option<f64>,
}

/// Copy the entity row figures, adding the facility median for the nation
pub fn scope_basics(resolved: &ResolvedScope<'_>, join: &ScopeJoin<'_>) -> ScopeBasics {
    let row = resolved.current;
    let median_hprd = match resolved.scope {
        Scope::Usa => median(
            join.facilities
                .iter()
                .filter(|f| f.has_usable_staffing())
                .map(|f| f.total_hprd)
                .collect(),
        ),
        _ => None,
    };

    ScopeBasics {
        facility_count: row.facility_count,
        avg_daily_residents: row.avg_daily_residents(),
        total_hprd: row.hprd.total,
        direct_care_hprd: row.hprd.direct_care,
        rn_hprd: row.hprd.rn,
        rn_direct_care_hprd: row.hprd.rn_direct_care,
        nurse_aide_hprd: row.hprd.nurse_aide,
        contract_percent: row.contract_percent,
        median_hprd,
    }
}

/// One member jurisdiction of a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionMemberSummary {
    pub state: StateCode,
    pub name: String,
    /// Facilities of this jurisdiction present in the facility file
    pub facility_count: usize,
    /// Mean total HPRD over facilities with usable staffing
    #[serde(rename = "avgFacilityHPRD")]
    pub avg_facility_hprd: Option<f64>,
    /// Total HPRD from the state entity row, when one exists
    #[serde(rename = "stateHPRD")]
    pub state_hprd: Option<f64>,
    pub state_minimum: Option<StateMinimumStandard>,
}

/// Per-member roll-up for a region, in membership order
pub fn region_members(dataset: &WrappedDataset, region: RegionNumber, join: &ScopeJoin<'_>) -> Vec<RegionMemberSummary> {
    let Some(members) = dataset.region_membership.members(region) else {
        return Vec::new();
    };

    members
        .iter()
        .map(|&state| {
            let in_state: Vec<f64> = join
                .facilities
                .iter()
                .filter(|f| f.state == state)
                .filter(|f| f.has_usable_staffing())
                .map(|f| f.total_hprd)
                .collect();
            RegionMemberSummary {
                state,
                name: state.name().to_string(),
                facility_count: join.facilities.iter().filter(|f| f.state == state).count(),
                avg_facility_hprd: mean(&in_state),
                state_hprd: dataset.current.entity(Scope::State(state)).map(|row| row.hprd.total),
                state_minimum: dataset.state_minimum(state).copied(),
            }
        })
        .collect()
}

/// Median of `values`; `None` when empty
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(Vec::new()), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }
}
