/*!
 * Lowest and highest facilities and peer entities
 */

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::WrappedConfig;
use crate::data_types::{FacilityId, QuarterlyEntityMetrics, Scope, ScopeType, StateCode};
use crate::dataset::QuarterData;
use crate::join::{JoinedFacility, ScopeJoin};
use crate::ranking::peers;

/// One facility in an extremes list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityHighlight {
    pub facility_id: FacilityId,
    pub name: String,
    pub city: Option<String>,
    pub state: StateCode,
    pub census: f64,
    #[serde(rename = "totalHPRD")]
    pub total_hprd: f64,
    /// Metric the list is ordered by
    pub value: f64,
}

/// One state or region in a USA peer list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityHighlight {
    pub identifier: String,
    pub display_name: String,
    #[serde(rename = "totalHPRD")]
    pub total_hprd: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extremes {
    #[serde(rename = "lowestByHPRD")]
    pub lowest_by_hprd: Vec<FacilityHighlight>,
    #[serde(rename = "highestByHPRD")]
    pub highest_by_hprd: Vec<FacilityHighlight>,
    pub lowest_by_percent_of_expected: Vec<FacilityHighlight>,
    pub highest_by_percent_of_expected: Vec<FacilityHighlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_states: Option<Vec<EntityHighlight>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_states: Option<Vec<EntityHighlight>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_regions: Option<Vec<EntityHighlight>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_regions: Option<Vec<EntityHighlight>>,
}

/// Joined facilities with usable staffing at or above the census floor
pub fn eligible<'j, 'a>(join: &'j ScopeJoin<'a>, min_census: f64) -> Vec<&'j JoinedFacility<'a>> {
    join.usable().filter(|f| f.metrics.census >= min_census).collect()
}

/// Select the extremes of a scope
pub fn select_extremes(join: &ScopeJoin<'_>, current: &QuarterData, config: &WrappedConfig) -> Extremes {
    let n = config.extremes_count;
    let pool = eligible(join, config.min_census);

    let by_hprd: Vec<FacilityHighlight> = pool
        .iter()
        .map(|f| highlight(f, f.metrics.total_hprd))
        .collect();
    let by_expected: Vec<FacilityHighlight> = pool
        .iter()
        .filter_map(|f| {
            f.profile
                .percent_of_expected(f.metrics.total_hprd)
                .map(|pct| highlight(f, pct))
        })
        .collect();

    let (lowest_by_hprd, highest_by_hprd) = lowest_and_highest(by_hprd, n, |h| h.value, |h| &h.facility_id);
    let (lowest_by_percent_of_expected, highest_by_percent_of_expected) =
        lowest_and_highest(by_expected, n, |h| h.value, |h| &h.facility_id);

    let mut extremes = Extremes {
        lowest_by_hprd,
        highest_by_hprd,
        lowest_by_percent_of_expected,
        highest_by_percent_of_expected,
        ..Default::default()
    };

    if join.scope == Scope::Usa {
        let (low, high) = entity_extremes(current, ScopeType::State, n);
        extremes.lowest_states = Some(low);
        extremes.highest_states = Some(high);
        let (low, high) = entity_extremes(current, ScopeType::Region, n);
        extremes.lowest_regions = Some(low);
        extremes.highest_regions = Some(high);
    }

    extremes
}

fn highlight(facility: &JoinedFacility<'_>, value: f64) -> FacilityHighlight {
    FacilityHighlight {
        facility_id: facility.metrics.facility_id.clone(),
        name: facility.profile.name.clone(),
        city: facility.profile.city.clone(),
        state: facility.metrics.state,
        census: facility.metrics.census,
        total_hprd: facility.metrics.total_hprd,
        value,
    }
}

/// Peer entities of one granularity, no census floor
fn entity_extremes(current: &QuarterData, scope_type: ScopeType, n: usize) -> (Vec<EntityHighlight>, Vec<EntityHighlight>) {
    let rows: Vec<&QuarterlyEntityMetrics> = peers(current, scope_type);
    let highlights: Vec<EntityHighlight> = rows
        .iter()
        .map(|row| EntityHighlight {
            identifier: row.entity.canonical_key(),
            display_name: row.entity.display_name(),
            total_hprd: row.hprd.total,
        })
        .collect();
    lowest_and_highest(highlights, n, |h| h.total_hprd, |h| &h.identifier)
}

/// Bottom-`n` ascending and top-`n` descending, ties broken by `key`
pub fn lowest_and_highest<T, K, V, I>(items: Vec<T>, n: usize, value: V, key: I) -> (Vec<T>, Vec<T>)
where
    T: Clone,
    K: Ord + ?Sized,
    V: Fn(&T) -> f64,
    I: Fn(&T) -> &K,
{
    let mut ascending = items;
    ascending.sort_by(|a, b| value(a).total_cmp(&value(b)).then_with(|| key(a).cmp(key(b))));
    let lowest: Vec<T> = ascending.iter().take(n).cloned().collect();

    let mut descending = ascending;
    descending.sort_by(|a, b| match value(b).total_cmp(&value(a)) {
        Ordering::Equal => key(a).cmp(key(b)),
        other => other,
    });
    let highest: Vec<T> = descending.into_iter().take(n).collect();

    (lowest, highest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_and_highest_ties_break_by_key() {
        let items = vec![("c", 2.0), ("a", 1.0), ("b", 2.0), ("d", 3.0)];
        let (low, high) = lowest_and_highest(items, 2, |i| i.1, |i| i.0);
        assert_eq!(low, vec![("a", 1.0), ("b", 2.0)]);
        assert_eq!(high, vec![("d", 3.0), ("b", 2.0)]);
    }

    #[test]
    fn test_lowest_and_highest_short_input() {
        let (low, high) = lowest_and_highest(vec![("a", 1.0)], 3, |i| i.1, |i| i.0);
        assert_eq!(low.len(), 1);
        assert_eq!(high.len(), 1);
    }
}
