/*!
 * Special-focus status classification
 *
 * Profile status strings and feed categories are classified with ordered
 * rule tables (first match wins). "Newly SFF" is decided by exactly one
 * method per computation: tenure when the status feed is loaded, otherwise a
 * prior-to-current profile comparison.
 */

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::config::WrappedConfig;
use crate::data_types::{FacilityId, ProviderProfile, RegulatoryCategory, StateCode};
use crate::dataset::WrappedDataset;
use crate::join::ScopeJoin;

/// How a classification rule matches the uppercased status string
#[derive(Debug, Clone, Copy)]
pub enum StatusPattern {
    Contains(&'static str),
    /// Contains the first pattern but not the second
    ContainsWithout(&'static str, &'static str),
    Equals(&'static str),
}

impl StatusPattern {
    fn matches(&self, text: &str) -> bool {
        match self {
            StatusPattern::Contains(pattern) => text.contains(pattern),
            StatusPattern::ContainsWithout(pattern, excluded) => text.contains(pattern) && !text.contains(excluded),
            StatusPattern::Equals(pattern) => text == *pattern,
        }
    }
}

/// Rules for the profile's special focus status column
pub const PROFILE_STATUS_RULES: &[(StatusPattern, RegulatoryCategory)] = &[
    (StatusPattern::ContainsWithout("CANDIDATE", "SFF"), RegulatoryCategory::Candidate),
    (StatusPattern::Equals("SPECIAL FOCUS FACILITY"), RegulatoryCategory::Sff),
    (StatusPattern::Contains("SFF"), RegulatoryCategory::Sff),
];

/// Rules for the category column of the status feed
pub const FEED_CATEGORY_RULES: &[(StatusPattern, RegulatoryCategory)] = &[
    (StatusPattern::Contains("GRADUAT"), RegulatoryCategory::Graduate),
    (StatusPattern::Contains("TERMINAT"), RegulatoryCategory::Terminated),
    (StatusPattern::ContainsWithout("CANDIDATE", "SFF"), RegulatoryCategory::Candidate),
    (StatusPattern::Equals("SPECIAL FOCUS FACILITY"), RegulatoryCategory::Sff),
    (StatusPattern::Contains("SFF"), RegulatoryCategory::Sff),
];

fn classify(rules: &[(StatusPattern, RegulatoryCategory)], raw: &str) -> RegulatoryCategory {
    let text = raw.trim().to_uppercase();
    rules
        .iter()
        .find(|(pattern, _)| pattern.matches(&text))
        .map(|(_, category)| *category)
        .unwrap_or(RegulatoryCategory::None)
}

/// Classify a provider profile status; never yields Graduate or Terminated
pub fn classify_status(raw: &str) -> RegulatoryCategory {
    classify(PROFILE_STATUS_RULES, raw)
}

/// Classify a status feed category
pub fn classify_feed_category(raw: &str) -> RegulatoryCategory {
    classify(FEED_CATEGORY_RULES, raw)
}

/// Method used to decide which facilities are newly SFF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransitionBasis {
    /// Profile status changed to SFF between the two quarters
    QuarterOverQuarter,
    /// Feed tenure at or below the configured threshold
    Tenure,
    /// No prior profiles and no feed
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedFacility {
    pub facility_id: FacilityId,
    pub name: String,
    pub city: Option<String>,
    pub state: StateCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub months_as_sff: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulatoryStatusSummary {
    pub counts: BTreeMap<RegulatoryCategory, usize>,
    /// Whether Graduate and Terminated counts are meaningful
    pub feed_available: bool,
    pub transition_basis: TransitionBasis,
    /// All newly SFF facilities before truncation
    pub newly_sff_count: usize,
    pub newly_sff: Vec<FlaggedFacility>,
}

impl RegulatoryStatusSummary {
    pub fn count(&self, category: RegulatoryCategory) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }
}

/// Counts and newly-SFF list over the scope's current profiles
///
/// Profiles are enough here, so facilities without a metrics row still count.
pub fn regulatory_summary(dataset: &WrappedDataset, join: &ScopeJoin<'_>, config: &WrappedConfig) -> RegulatoryStatusSummary {
    let mut counts: BTreeMap<RegulatoryCategory, usize> =
        RegulatoryCategory::ALL.iter().map(|c| (*c, 0)).collect();

    let (basis, mut newly) = match &dataset.regulatory_feed {
        Some(feed) => {
            let as_of = dataset.quarters.current.end_date();
            let mut newly = Vec::new();
            for profile in &join.profiles {
                let entry = feed.get(&profile.facility_id);
                let category = entry.map_or(RegulatoryCategory::None, |e| e.category);
                *counts.entry(category).or_insert(0) += 1;

                if let Some(entry) = entry.filter(|e| e.category == RegulatoryCategory::Sff) {
                    if let Some(tenure) = entry.tenure_months(as_of) {
                        if tenure <= config.sff_new_tenure_months {
                            newly.push(flagged(profile, Some(tenure)));
                        }
                    }
                }
            }
            (TransitionBasis::Tenure, newly)
        }
        None => {
            let has_prior_profiles = dataset.prior.as_ref().is_some_and(|p| !p.providers.is_empty());
            let mut newly = Vec::new();
            for profile in &join.profiles {
                let category = classify_status(&profile.regulatory_status_raw);
                *counts.entry(category).or_insert(0) += 1;

                // a facility absent from the prior profiles was not SFF then
                if has_prior_profiles && category == RegulatoryCategory::Sff {
                    let was_sff = join
                        .prior_profile(&profile.facility_id)
                        .is_some_and(|prior| classify_status(&prior.regulatory_status_raw) == RegulatoryCategory::Sff);
                    if !was_sff {
                        newly.push(flagged(profile, None));
                    }
                }
            }
            let basis = if has_prior_profiles {
                TransitionBasis::QuarterOverQuarter
            } else {
                TransitionBasis::Unavailable
            };
            (basis, newly)
        }
    };

    let newly_sff_count = newly.len();
    rotate(&mut newly, config.highlight_seed);
    newly.truncate(config.newly_flagged_limit);

    RegulatoryStatusSummary {
        counts,
        feed_available: dataset.regulatory_feed.is_some(),
        transition_basis: basis,
        newly_sff_count,
        newly_sff: newly,
    }
}

/// Sort by facility id, then shuffle reproducibly when a seed is configured
pub fn rotate(list: &mut [FlaggedFacility], seed: Option<u64>) {
    list.sort_by(|a, b| a.facility_id.cmp(&b.facility_id));
    if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        list.shuffle(&mut rng);
    }
}

fn flagged(profile: &ProviderProfile, months_as_sff: Option<u32>) -> FlaggedFacility {
    FlaggedFacility {
        facility_id: profile.facility_id.clone(),
        name: profile.name.clone(),
        city: profile.city.clone(),
        state: profile.state,
        months_as_sff,
    }
}
