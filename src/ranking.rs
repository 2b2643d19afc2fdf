/*!
 * Peer ranking
 *
 * Rank 1 is the highest value. Ties keep the order of the entity file.
 */

use serde::{Deserialize, Serialize};

use crate::data_types::{FacilityMetrics, QuarterlyEntityMetrics, Scope, ScopeType};
use crate::dataset::QuarterData;

/// Staffing metrics tracked by rankings and movers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffingMetric {
    #[serde(rename = "totalHPRD")]
    TotalHprd,
    #[serde(rename = "directCareHPRD")]
    DirectCareHprd,
    #[serde(rename = "rnHPRD")]
    RnHprd,
}

impl StaffingMetric {
    pub const ALL: [StaffingMetric; 3] = [
        StaffingMetric::TotalHprd,
        StaffingMetric::DirectCareHprd,
        StaffingMetric::RnHprd,
    ];

    pub fn entity_value(&self, row: &QuarterlyEntityMetrics) -> f64 {
        match self {
            StaffingMetric::TotalHprd => row.hprd.total,
            StaffingMetric::DirectCareHprd => row.hprd.direct_care,
            StaffingMetric::RnHprd => row.hprd.rn,
        }
    }

    pub fn facility_value(&self, row: &FacilityMetrics) -> f64 {
        match self {
            StaffingMetric::TotalHprd => row.total_hprd,
            StaffingMetric::DirectCareHprd => row.direct_care_hprd,
            StaffingMetric::RnHprd => row.rn_hprd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
    pub rank: usize,
    pub percentile: u32,
    pub peer_count: usize,
}

/// Rank of a scope on each tracked metric
///
/// A metric is `None` when the scope is not in its own peer set (territories).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    #[serde(rename = "totalHPRD")]
    pub total_hprd: Option<RankEntry>,
    #[serde(rename = "directCareHPRD")]
    pub direct_care_hprd: Option<RankEntry>,
    #[serde(rename = "rnHPRD")]
    pub rn_hprd: Option<RankEntry>,
}

impl Rankings {
    pub fn get(&self, metric: StaffingMetric) -> Option<&RankEntry> {
        match metric {
            StaffingMetric::TotalHprd => self.total_hprd.as_ref(),
            StaffingMetric::DirectCareHprd => self.direct_care_hprd.as_ref(),
            StaffingMetric::RnHprd => self.rn_hprd.as_ref(),
        }
    }
}

/// `round((N - rank + 1) / N * 100)`
pub fn percentile(rank: usize, peer_count: usize) -> u32 {
    if peer_count == 0 || rank == 0 || rank > peer_count {
        return 0;
    }
    (((peer_count - rank + 1) as f64 / peer_count as f64) * 100.0).round() as u32
}

/// Current-quarter rows of one granularity eligible for peer comparison
pub fn peers(data: &QuarterData, scope_type: ScopeType) -> Vec<&QuarterlyEntityMetrics> {
    data.entities_of(scope_type)
        .filter(|row| match row.entity {
            Scope::State(state) => !state.is_territory(),
            _ => true,
        })
        .collect()
}

/// 1-based position of `scope` among `peers` sorted descending by `metric`
pub fn rank_among(peers: &[&QuarterlyEntityMetrics], scope: Scope, metric: StaffingMetric) -> Option<usize> {
    let mut ordered = peers.to_vec();
    // sort_by is stable, so tied values keep file order
    ordered.sort_by(|a, b| metric.entity_value(b).total_cmp(&metric.entity_value(a)));
    ordered.iter().position(|row| row.entity == scope).map(|idx| idx + 1)
}

/// Rank `scope` on every tracked metric
pub fn rank_scope(data: &QuarterData, scope: Scope) -> Rankings {
    let entry = |metric: StaffingMetric| -> Option<RankEntry> {
        if scope == Scope::Usa {
            return Some(RankEntry { rank: 1, percentile: 100, peer_count: 1 });
        }
        let peers = peers(data, scope.scope_type());
        rank_among(&peers, scope, metric).map(|rank| RankEntry {
            rank,
            percentile: percentile(rank, peers.len()),
            peer_count: peers.len(),
        })
    };

    Rankings {
        total_hprd: entry(StaffingMetric::TotalHprd),
        direct_care_hprd: entry(StaffingMetric::DirectCareHprd),
        rn_hprd: entry(StaffingMetric::RnHprd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_formula() {
        assert_eq!(percentile(1, 50), 100);
        assert_eq!(percentile(12, 50), 78);
        assert_eq!(percentile(50, 50), 2);
        assert_eq!(percentile(1, 1), 100);
        assert_eq!(percentile(0, 0), 0);
        assert_eq!(percentile(3, 2), 0);
    }
}
