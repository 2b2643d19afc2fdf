/*!
 * Ingestion: validation and repair of raw rows
 *
 * Raw rows arrive as decoded strings and loosely typed numbers. This stage
 * runs once per dataset build and produces the typed rows every later stage
 * reads. Facility identifiers are canonicalized (first row wins on a
 * collision), quarter tags are checked, and facility rows whose staffing
 * columns fail the dominance check are repaired or zeroed here and nowhere
 * else.
 */

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data_types::*;
use crate::normalize::{normalize_text, parse_region, parse_state};
use crate::observe::{Diagnostic, Observer};
use crate::regulatory::classify_feed_category;

/// Pre-aggregated entity row as decoded from a national, state or region file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntityRow {
    pub entity: String,
    pub quarter: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub facility_count: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub avg_days_reported: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub total_resident_days: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub avg_daily_census: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub total_hours: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub rn_hours: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub direct_care_hours: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub rn_direct_care_hours: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub nurse_aide_hours: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub contract_hours: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub total_hprd: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub direct_care_hprd: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub rn_hprd: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub rn_direct_care_hprd: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub nurse_aide_hprd: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub contract_percent: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub direct_care_percent: Option<f64>,
}

/// Facility staffing row as published in the PBJ facility file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFacilityRow {
    #[serde(rename = "PROVNUM")]
    pub facility_id: String,
    #[serde(rename = "STATE")]
    pub state: String,
    #[serde(rename = "CY_Qtr")]
    pub quarter: String,
    #[serde(rename = "Total_Nurse_HPRD", default, deserialize_with = "csv::invalid_option")]
    pub total_hprd: Option<f64>,
    #[serde(rename = "Nurse_Care_HPRD", default, deserialize_with = "csv::invalid_option")]
    pub direct_care_hprd: Option<f64>,
    #[serde(rename = "Total_RN_HPRD", default, deserialize_with = "csv::invalid_option")]
    pub rn_hprd: Option<f64>,
    #[serde(rename = "Direct_Care_RN_HPRD", default, deserialize_with = "csv::invalid_option")]
    pub rn_direct_care_hprd: Option<f64>,
    #[serde(rename = "Contract_Percentage", default, deserialize_with = "csv::invalid_option")]
    pub contract_percent: Option<f64>,
    #[serde(rename = "Census", default, deserialize_with = "csv::invalid_option")]
    pub census: Option<f64>,
}

/// Provider information row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProviderRow {
    #[serde(rename = "CMS Certification Number (CCN)")]
    pub facility_id: String,
    #[serde(rename = "Provider Name")]
    pub name: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "City/Town", default)]
    pub city: Option<String>,
    #[serde(rename = "County/Parish", default)]
    pub county: Option<String>,
    #[serde(rename = "Ownership Type", default)]
    pub ownership: String,
    #[serde(rename = "Special Focus Status", default)]
    pub regulatory_status: String,
    #[serde(
        rename = "Case-Mix Total Nurse Staffing Hours per Resident per Day",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub case_mix_expected_hprd: Option<f64>,
    #[serde(rename = "Overall Rating", default, deserialize_with = "csv::invalid_option")]
    pub overall_rating: Option<u8>,
    #[serde(rename = "Staffing Rating", default, deserialize_with = "csv::invalid_option")]
    pub staffing_rating: Option<u8>,
    #[serde(
        rename = "Average Number of Residents per Day",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub avg_residents_per_day: Option<f64>,
}

/// Row of the region membership side table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRegionMemberRow {
    pub region: String,
    pub state: String,
}

/// Row of the state minimum staffing side table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStateMinimumRow {
    pub state: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub min_hprd: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub max_hprd: Option<f64>,
}

/// Row of the richer special-focus status feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRegulatoryRow {
    pub facility_id: String,
    pub category: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub months_as_sff: Option<u32>,
    #[serde(default)]
    pub designated_on: Option<String>,
    #[serde(default)]
    pub last_inspection: Option<String>,
}

/// Granularity of an entity file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityLevel {
    National,
    State,
    Region,
}

impl EntityLevel {
    fn dataset_name(&self) -> &'static str {
        match self {
            EntityLevel::National => "national",
            EntityLevel::State => "state",
            EntityLevel::Region => "region",
        }
    }

    /// Parse an entity key of this level
    pub fn parse_key(&self, raw: &str) -> Option<Scope> {
        let text = normalize_text(raw);
        match self {
            EntityLevel::National => matches!(text.as_str(), "usa" | "us" | "national" | "nation" | "united states")
                .then_some(Scope::Usa),
            EntityLevel::State => parse_state(&text).map(Scope::State),
            EntityLevel::Region => parse_region(&text)
                .or_else(|| text.parse::<u8>().ok().and_then(RegionNumber::new))
                .map(Scope::Region),
        }
    }
}

/// Counters and diagnostics produced by one ingestion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub collisions: usize,
    pub repaired: usize,
    pub zeroed: usize,
    pub rejected: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl IngestReport {
    fn note(&mut self, observer: &dyn Observer, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::DuplicateFacilityId { .. } => self.collisions += 1,
            Diagnostic::MisalignedRecord { repaired: true, .. } => self.repaired += 1,
            Diagnostic::MisalignedRecord { repaired: false, .. } => self.zeroed += 1,
            Diagnostic::RejectedRow { .. } => self.rejected += 1,
            _ => {}
        }
        observer.record(&diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn reject(&mut self, observer: &dyn Observer, dataset: &'static str, reason: String) {
        self.note(observer, Diagnostic::RejectedRow { dataset, reason });
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: IngestReport) {
        self.accepted += other.accepted;
        self.collisions += other.collisions;
        self.repaired += other.repaired;
        self.zeroed += other.zeroed;
        self.rejected += other.rejected;
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Staffing columns of one facility row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaffingColumns {
    pub total: f64,
    pub direct_care: f64,
    pub rn: f64,
    pub rn_direct_care: f64,
}

impl StaffingColumns {
    fn dominance_holds(&self) -> bool {
        self.total >= self.direct_care && self.total >= self.rn
    }

    fn zeroed() -> Self {
        Self { total: 0.0, direct_care: 0.0, rn: 0.0, rn_direct_care: 0.0 }
    }
}

/// Apply the column-shift repair
///
/// The known upstream defect transposes the total and direct-care columns.
/// Swapping them back is accepted only when it restores the dominance check
/// with both values positive; otherwise the staffing values are zeroed.
pub fn repair_column_shift(columns: StaffingColumns) -> (StaffingColumns, StaffingQuality) {
    if columns.dominance_holds() {
        return (columns, StaffingQuality::Valid);
    }

    let swapped = StaffingColumns {
        total: columns.direct_care,
        direct_care: columns.total,
        ..columns
    };
    if swapped.dominance_holds() && swapped.total > 0.0 && swapped.direct_care > 0.0 {
        (swapped, StaffingQuality::Repaired)
    } else {
        (StaffingColumns::zeroed(), StaffingQuality::Zeroed)
    }
}

/// Convert entity rows of one level, keeping the first row per entity
pub fn ingest_entities(
    level: EntityLevel,
    rows: &[RawEntityRow],
    quarter: QuarterTag,
    observer: &dyn Observer,
    report: &mut IngestReport,
) -> Vec<QuarterlyEntityMetrics> {
    let dataset = level.dataset_name();
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(entity) = level.parse_key(&row.entity) else {
            report.reject(observer, dataset, format!("unknown entity key '{}'", row.entity));
            continue;
        };
        match QuarterTag::parse(&row.quarter) {
            Ok(tag) if tag == quarter => {}
            Ok(tag) => {
                report.reject(observer, dataset, format!("{} row tagged {} in a {} file", entity, tag, quarter));
                continue;
            }
            Err(_) => {
                report.reject(observer, dataset, format!("invalid quarter tag '{}' for {}", row.quarter, entity));
                continue;
            }
        }
        if !seen.insert(entity) {
            report.reject(observer, dataset, format!("duplicate {} row for {}", quarter, entity));
            continue;
        }

        out.push(QuarterlyEntityMetrics {
            entity,
            quarter,
            facility_count: row.facility_count.unwrap_or(0),
            avg_days_reported: row.avg_days_reported,
            total_resident_days: row.total_resident_days,
            avg_daily_census: row.avg_daily_census.unwrap_or(0.0),
            hours: StaffingHours {
                total: row.total_hours.unwrap_or(0.0),
                rn: row.rn_hours.unwrap_or(0.0),
                direct_care: row.direct_care_hours.unwrap_or(0.0),
                rn_direct_care: row.rn_direct_care_hours.unwrap_or(0.0),
                nurse_aide: row.nurse_aide_hours.unwrap_or(0.0),
                contract: row.contract_hours.unwrap_or(0.0),
            },
            hprd: HprdFamily {
                total: row.total_hprd.unwrap_or(0.0),
                direct_care: row.direct_care_hprd.unwrap_or(0.0),
                rn: row.rn_hprd.unwrap_or(0.0),
                rn_direct_care: row.rn_direct_care_hprd.unwrap_or(0.0),
                nurse_aide: row.nurse_aide_hprd,
            },
            contract_percent: row.contract_percent.unwrap_or(0.0),
            direct_care_percent: row.direct_care_percent.unwrap_or(0.0),
        });
        report.accepted += 1;
    }

    out
}

/// Convert facility rows, canonicalizing ids and repairing misaligned staffing
pub fn ingest_facilities(
    rows: &[RawFacilityRow],
    quarter: QuarterTag,
    observer: &dyn Observer,
    report: &mut IngestReport,
) -> Vec<FacilityMetrics> {
    let mut seen: HashMap<FacilityId, &str> = HashMap::new();
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let facility_id = match FacilityId::canonicalize(&row.facility_id) {
            Ok(id) => id,
            Err(e) => {
                report.reject(observer, "facility", e.to_string());
                continue;
            }
        };
        match QuarterTag::parse(&row.quarter) {
            Ok(tag) if tag == quarter => {}
            _ => {
                report.reject(
                    observer,
                    "facility",
                    format!("{} has quarter '{}' in a {} file", facility_id, row.quarter, quarter),
                );
                continue;
            }
        }
        let Some(state) = parse_state(&normalize_text(&row.state)) else {
            report.reject(observer, "facility", format!("{} has unknown state '{}'", facility_id, row.state));
            continue;
        };
        if let Some(kept) = seen.get(&facility_id) {
            let diagnostic = Diagnostic::DuplicateFacilityId {
                dataset: "facility",
                facility_id,
                raw_kept: kept.to_string(),
                raw_dropped: row.facility_id.clone(),
                quarter: Some(quarter),
            };
            report.note(observer, diagnostic);
            continue;
        }
        seen.insert(facility_id.clone(), row.facility_id.as_str());

        let (columns, quality) = repair_column_shift(StaffingColumns {
            total: row.total_hprd.unwrap_or(0.0),
            direct_care: row.direct_care_hprd.unwrap_or(0.0),
            rn: row.rn_hprd.unwrap_or(0.0),
            rn_direct_care: row.rn_direct_care_hprd.unwrap_or(0.0),
        });
        if quality != StaffingQuality::Valid {
            report.note(
                observer,
                Diagnostic::MisalignedRecord {
                    facility_id: facility_id.clone(),
                    quarter,
                    repaired: quality == StaffingQuality::Repaired,
                },
            );
        }

        out.push(FacilityMetrics {
            facility_id,
            quarter,
            state,
            total_hprd: columns.total,
            direct_care_hprd: columns.direct_care,
            rn_hprd: columns.rn,
            rn_direct_care_hprd: columns.rn_direct_care,
            contract_percent: row.contract_percent.unwrap_or(0.0),
            census: row.census.unwrap_or(0.0),
            quality,
        });
        report.accepted += 1;
    }

    out
}

/// Convert provider rows for a quarter, canonicalizing ids
pub fn ingest_providers(
    rows: &[RawProviderRow],
    quarter: QuarterTag,
    observer: &dyn Observer,
    report: &mut IngestReport,
) -> Vec<ProviderProfile> {
    let mut seen: HashMap<FacilityId, &str> = HashMap::new();
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        let facility_id = match FacilityId::canonicalize(&row.facility_id) {
            Ok(id) => id,
            Err(e) => {
                report.reject(observer, "provider", e.to_string());
                continue;
            }
        };
        let Some(state) = parse_state(&normalize_text(&row.state)) else {
            report.reject(observer, "provider", format!("{} has unknown state '{}'", facility_id, row.state));
            continue;
        };
        if let Some(kept) = seen.get(&facility_id) {
            let diagnostic = Diagnostic::DuplicateFacilityId {
                dataset: "provider",
                facility_id,
                raw_kept: kept.to_string(),
                raw_dropped: row.facility_id.clone(),
                quarter: Some(quarter),
            };
            report.note(observer, diagnostic);
            continue;
        }
        seen.insert(facility_id.clone(), row.facility_id.as_str());

        out.push(ProviderProfile {
            facility_id,
            quarter,
            name: row.name.trim().to_string(),
            state,
            city: non_empty(&row.city),
            county: non_empty(&row.county),
            ownership_raw: row.ownership.trim().to_string(),
            regulatory_status_raw: row.regulatory_status.trim().to_string(),
            case_mix_expected_hprd: row.case_mix_expected_hprd,
            overall_rating: row.overall_rating.filter(|r| (1..=5).contains(r)),
            staffing_rating: row.staffing_rating.filter(|r| (1..=5).contains(r)),
            avg_residents_per_day: row.avg_residents_per_day,
        });
        report.accepted += 1;
    }

    out
}

/// Convert region membership rows
pub fn ingest_region_membership(
    rows: &[RawRegionMemberRow],
    observer: &dyn Observer,
    report: &mut IngestReport,
) -> crate::Result<RegionMembership> {
    let mut pairs = Vec::with_capacity(rows.len());
    for row in rows {
        let region = EntityLevel::Region.parse_key(&row.region);
        let state = parse_state(&normalize_text(&row.state));
        match (region, state) {
            (Some(Scope::Region(region)), Some(state)) => pairs.push((region, state)),
            _ => report.reject(
                observer,
                "region_membership",
                format!("cannot read membership '{}' -> '{}'", row.region, row.state),
            ),
        }
    }
    RegionMembership::from_pairs(pairs)
}

/// Convert state minimum rows
pub fn ingest_state_minimums(
    rows: &[RawStateMinimumRow],
    observer: &dyn Observer,
    report: &mut IngestReport,
) -> HashMap<StateCode, StateMinimumStandard> {
    let mut out = HashMap::new();
    for row in rows {
        let state = parse_state(&normalize_text(&row.state));
        match (state, row.min_hprd) {
            (Some(state), Some(_)) if out.contains_key(&state) => {
                report.reject(observer, "state_minimums", format!("duplicate minimum for {}", state))
            }
            (Some(state), Some(min_hprd)) if min_hprd >= 0.0 => {
                let max_hprd = row.max_hprd.filter(|max| *max > min_hprd);
                out.insert(
                    state,
                    StateMinimumStandard {
                        min_hprd,
                        max_hprd,
                        is_range: max_hprd.is_some(),
                    },
                );
                report.accepted += 1;
            }
            _ => report.reject(observer, "state_minimums", format!("cannot read minimum for '{}'", row.state)),
        }
    }
    out
}

/// Convert the regulatory-status feed
pub fn ingest_regulatory_feed(
    rows: &[RawRegulatoryRow],
    observer: &dyn Observer,
    report: &mut IngestReport,
) -> HashMap<FacilityId, RegulatoryFeedEntry> {
    let mut out: HashMap<FacilityId, RegulatoryFeedEntry> = HashMap::new();
    let mut raw_ids: HashMap<FacilityId, &str> = HashMap::new();
    for row in rows {
        let facility_id = match FacilityId::canonicalize(&row.facility_id) {
            Ok(id) => id,
            Err(e) => {
                report.reject(observer, "regulatory_feed", e.to_string());
                continue;
            }
        };
        if let Some(kept) = raw_ids.get(&facility_id) {
            let diagnostic = Diagnostic::DuplicateFacilityId {
                dataset: "regulatory_feed",
                facility_id,
                raw_kept: kept.to_string(),
                raw_dropped: row.facility_id.clone(),
                quarter: None,
            };
            report.note(observer, diagnostic);
            continue;
        }
        raw_ids.insert(facility_id.clone(), row.facility_id.as_str());

        out.insert(
            facility_id.clone(),
            RegulatoryFeedEntry {
                facility_id,
                category: classify_feed_category(&row.category),
                months_as_sff: row.months_as_sff,
                designated_on: row.designated_on.as_deref().and_then(parse_date),
                last_inspection: row.last_inspection.as_deref().and_then(parse_date),
            },
        );
        report.accepted += 1;
    }
    out
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
