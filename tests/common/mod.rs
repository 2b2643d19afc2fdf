//! Synthetic two-quarter PBJ fixture shared by the integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use pbj_wrapped::prelude::*;

pub const CURRENT: &str = "2025Q2";
pub const PRIOR: &str = "2025Q1";

pub fn q(tag: &str) -> QuarterTag {
    QuarterTag::parse(tag).unwrap()
}

fn entity(key: &str, quarter: &str, total: f64, contract: f64) -> RawEntityRow {
    RawEntityRow {
        entity: key.to_string(),
        quarter: quarter.to_string(),
        facility_count: Some(100),
        avg_days_reported: Some(91.0),
        total_resident_days: Some(91.0 * 5_000.0),
        avg_daily_census: Some(5_000.0),
        total_hprd: Some(total),
        direct_care_hprd: Some(total * 0.9),
        rn_hprd: Some(total * 0.2),
        rn_direct_care_hprd: Some(total * 0.15),
        nurse_aide_hprd: Some(total * 0.5),
        contract_percent: Some(contract),
        ..Default::default()
    }
}

/// Fifty peer states (WY has no row), NY ranked 12th on total HPRD
///
/// NJ moves 3.20 -> 3.50, VT has no prior row, MT is unchanged, and PR is a
/// territory with the highest value of all.
fn state_rows(quarter: &str, prior: bool) -> Vec<RawEntityRow> {
    let mut rows = Vec::new();
    let mut others = 0usize;
    for state in StateCode::states_and_dc().filter(|s| *s != StateCode::WY) {
        let total = match state {
            StateCode::NY => 3.10,
            StateCode::NJ if prior => 3.20,
            StateCode::NJ => 3.50,
            _ => {
                others += 1;
                if others <= 10 {
                    4.00 + others as f64 * 0.01
                } else {
                    2.50 + others as f64 * 0.01
                }
            }
        };
        if prior && state == StateCode::VT {
            continue;
        }
        let mut row = entity(state.as_code(), quarter, total, 10.0);
        if state == StateCode::NY {
            row.facility_count = Some(589);
            row.contract_percent = Some(if prior { 6.0 } else { 8.5 });
        }
        rows.push(row);
    }
    rows.push(entity("PR", quarter, 9.00, 1.0));
    rows
}

fn region_rows(quarter: &str, prior: bool) -> Vec<RawEntityRow> {
    (1..=10)
        .map(|n| {
            let base = 3.0 + n as f64 * 0.05;
            // region 2 rises most, region 10 declines
            let shift = match n {
                2 => 0.40,
                10 => -0.05,
                _ => 0.10,
            };
            let total = if prior { base - shift } else { base };
            entity(&format!("region{}", n), quarter, total, 9.0)
        })
        .collect()
}

fn facility(id: &str, state: &str, quarter: &str, total: f64, direct: f64, rn: f64, census: f64) -> RawFacilityRow {
    RawFacilityRow {
        facility_id: id.to_string(),
        state: state.to_string(),
        quarter: quarter.to_string(),
        total_hprd: Some(total),
        direct_care_hprd: Some(direct),
        rn_hprd: Some(rn),
        rn_direct_care_hprd: Some(rn * 0.8),
        contract_percent: Some(5.0),
        census: Some(census),
    }
}

fn provider(id: &str, name: &str, state: &str, ownership: &str, status: &str, expected: Option<f64>) -> RawProviderRow {
    RawProviderRow {
        facility_id: id.to_string(),
        name: name.to_string(),
        state: state.to_string(),
        city: Some("Somewhere".to_string()),
        county: None,
        ownership: ownership.to_string(),
        regulatory_status: status.to_string(),
        case_mix_expected_hprd: expected,
        overall_rating: Some(3),
        staffing_rating: Some(2),
        avg_residents_per_day: Some(80.0),
    }
}

pub fn current_input() -> QuarterInput {
    let c = CURRENT;
    let mut input = QuarterInput::new(q(c));
    input.national.push(entity("usa", c, 3.80, 11.0));
    input.states = state_rows(c, false);
    input.regions = region_rows(c, false);
    input.facilities = vec![
        facility("335001", "NY", c, 3.0, 2.6, 0.6, 100.0),
        facility("335002", "NY", c, 4.2, 3.8, 1.0, 80.0),
        // below the census floor
        facility("335003", "NY", c, 1.5, 1.3, 0.2, 10.0),
        // total missing: unrepairable
        facility("335004", "NY", c, 0.0, 2.8, 0.9, 90.0),
        // total and direct care transposed
        facility("335005", "NY", c, 3.1, 3.6, 0.7, 70.0),
        facility("335006", "NY", c, 2.2, 2.0, 0.4, 120.0),
        facility("35007", "NY", c, 3.3, 3.0, 0.7, 65.0),
        // collides with the row above
        facility("035007", "NY", c, 9.9, 9.0, 2.0, 65.0),
        facility("315001", "NJ", c, 3.4, 3.0, 0.7, 60.0),
        facility("315002", "NJ", c, 2.9, 2.6, 0.5, 55.0),
        // no provider profile
        facility("315003", "NJ", c, 3.0, 2.7, 0.5, 50.0),
        facility("405001", "PR", c, 2.5, 2.2, 0.3, 40.0),
        facility("485001", "VI", c, 2.7, 2.4, 0.4, 35.0),
        facility("075001", "CT", c, 3.9, 3.5, 0.9, 90.0),
    ];
    input.providers = vec![
        provider("335001", "Hudson Care", "NY", "For profit - Corporation", "SFF", Some(3.5)),
        provider("335002", "Lakeview Home", "NY", "Non profit - Church related", "SFF Candidate", Some(3.6)),
        provider("335003", "Tiny Manor", "NY", "For profit - Individual", "Candidate", Some(3.0)),
        provider("335004", "Shifted Columns", "NY", "Non profit - Corporation", "", Some(3.5)),
        provider("335005", "County Home", "NY", "Government - County", "", Some(4.0)),
        provider("335006", "Empire Living", "NY", "For profit - Corporation", "", Some(0.0)),
        provider("035007", "Mystery Hall", "NY", "Unknown", "", Some(3.0)),
        // no metrics row
        provider("335099", "Profile Only", "NY", "For profit - Corporation", "SFF", None),
        provider("315001", "Shore House", "NJ", "For profit - Corporation", "", Some(3.2)),
        provider("315002", "Pine Barrens", "NJ", "Non profit - Corporation", "SFF", Some(3.3)),
        provider("405001", "San Juan Care", "PR", "Government - State", "", Some(3.0)),
        provider("485001", "Island Rest", "VI", "Government - Federal", "", Some(3.0)),
        provider("075001", "Harbor Point", "CT", "For profit - Corporation", "SFF", Some(3.5)),
    ];
    input
}

pub fn prior_input() -> QuarterInput {
    let p = PRIOR;
    let mut input = QuarterInput::new(q(p));
    input.national.push(entity("usa", p, 3.70, 12.0));
    input.states = state_rows(p, true);
    input.regions = region_rows(p, true);
    input.facilities = vec![
        facility("335001", "NY", p, 2.5, 2.2, 0.5, 100.0),
        facility("335002", "NY", p, 4.5, 4.0, 1.1, 80.0),
        facility("335005", "NY", p, 3.0, 2.8, 0.6, 70.0),
        facility("335006", "NY", p, 2.2, 2.0, 0.4, 120.0),
        facility("315001", "NJ", p, 3.0, 2.7, 0.6, 60.0),
        facility("315002", "NJ", p, 3.1, 2.8, 0.6, 55.0),
        facility("075001", "CT", p, 3.8, 3.4, 0.9, 90.0),
    ];
    input.providers = vec![
        provider("335001", "Hudson Care", "NY", "For profit - Corporation", "", Some(3.5)),
        provider("335002", "Lakeview Home", "NY", "Non profit - Church related", "", Some(3.6)),
        provider("335099", "Profile Only", "NY", "For profit - Corporation", "SFF", None),
        provider("315001", "Shore House", "NJ", "For profit - Corporation", "", Some(3.2)),
        provider("315002", "Pine Barrens", "NJ", "Non profit - Corporation", "", Some(3.3)),
        provider("075001", "Harbor Point", "CT", "For profit - Corporation", "SFF", Some(3.5)),
    ];
    input
}

pub fn state_minimum_rows() -> Vec<RawStateMinimumRow> {
    vec![
        RawStateMinimumRow { state: "NY".to_string(), min_hprd: Some(3.5), max_hprd: None },
        RawStateMinimumRow { state: "NJ".to_string(), min_hprd: Some(2.5), max_hprd: Some(3.0) },
    ]
}

pub fn regulatory_feed_rows() -> Vec<RawRegulatoryRow> {
    vec![
        RawRegulatoryRow {
            facility_id: "335001".to_string(),
            category: "SFF".to_string(),
            months_as_sff: Some(2),
            ..Default::default()
        },
        RawRegulatoryRow {
            facility_id: "335099".to_string(),
            category: "SFF".to_string(),
            months_as_sff: Some(14),
            ..Default::default()
        },
        RawRegulatoryRow {
            facility_id: "335002".to_string(),
            category: "Graduated".to_string(),
            ..Default::default()
        },
        RawRegulatoryRow {
            facility_id: "335006".to_string(),
            category: "Terminated".to_string(),
            ..Default::default()
        },
        RawRegulatoryRow {
            facility_id: "335005".to_string(),
            category: "SFF".to_string(),
            designated_on: Some("2025-05-01".to_string()),
            ..Default::default()
        },
    ]
}

/// Both quarters plus state minimums, no regulatory feed
pub fn builder(observer: Arc<dyn Observer>) -> DatasetBuilder {
    DatasetBuilder::new()
        .observer(observer)
        .current(current_input())
        .prior(prior_input())
        .state_minimums(state_minimum_rows())
}

pub fn dataset() -> WrappedDataset {
    builder(Arc::new(NullObserver)).build().unwrap()
}

pub fn dataset_with_feed() -> WrappedDataset {
    builder(Arc::new(NullObserver))
        .regulatory_feed(regulatory_feed_rows())
        .build()
        .unwrap()
}

pub fn dataset_without_prior() -> WrappedDataset {
    DatasetBuilder::new()
        .observer(Arc::new(NullObserver))
        .current(current_input())
        .build()
        .unwrap()
}

fn write_csv<T: serde::Serialize>(path: &Path, rows: &[T]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    for row in rows {
        writer.serialize(row).unwrap();
    }
    writer.flush().unwrap();
}

/// Write the fixture as files named the way the directory loader expects
pub fn write_directory(dir: &Path) {
    for input in [current_input(), prior_input()] {
        let quarter = Some(input.quarter);
        write_csv(&dir.join(FileKind::National.file_name(quarter)), &input.national);
        write_csv(&dir.join(FileKind::State.file_name(quarter)), &input.states);
        write_csv(&dir.join(FileKind::Region.file_name(quarter)), &input.regions);
        write_csv(&dir.join(FileKind::Facility.file_name(quarter)), &input.facilities);
        write_csv(&dir.join(FileKind::Provider.file_name(quarter)), &input.providers);
    }
    write_csv(&dir.join(FileKind::StateMinimums.file_name(None)), &state_minimum_rows());
}

pub fn ids(list: &[pbj_wrapped::extremes::FacilityHighlight]) -> Vec<&str> {
    list.iter().map(|h| h.facility_id.as_str()).collect()
}
