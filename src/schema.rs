/*!
 * Schema definitions for PBJ data files
 *
 * This module names every file family the loader understands, the file
 * naming pattern used for directory discovery, and the columns each file
 * must carry. Extra columns are allowed; the published files carry many
 * more than the engine reads.
 */

use std::fmt;

use crate::data_types::QuarterTag;
use crate::{Result, WrappedError};

/// File families read by [`crate::reader::PbjReader`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    National,
    State,
    Region,
    Facility,
    Provider,
    RegionMembership,
    StateMinimums,
    RegulatoryFeed,
}

const ENTITY_COLUMNS: &[&str] = &["entity", "quarter", "facility_count", "total_hprd"];

impl FileKind {
    pub const ALL: [FileKind; 8] = [
        FileKind::National,
        FileKind::State,
        FileKind::Region,
        FileKind::Facility,
        FileKind::Provider,
        FileKind::RegionMembership,
        FileKind::StateMinimums,
        FileKind::RegulatoryFeed,
    ];

    /// Whether files of this kind exist once per quarter
    pub fn is_quarterly(&self) -> bool {
        matches!(
            self,
            FileKind::National | FileKind::State | FileKind::Region | FileKind::Facility | FileKind::Provider
        )
    }

    /// File name used for directory discovery
    ///
    /// Quarterly kinds are named `<stem>_<YYYYQN>.csv`; side tables have a fixed
    /// name and ignore `quarter`.
    pub fn file_name(&self, quarter: Option<QuarterTag>) -> String {
        let stem = self.stem();
        match (self.is_quarterly(), quarter) {
            (true, Some(quarter)) => format!("{}_{}.csv", stem, quarter),
            _ => format!("{}.csv", stem),
        }
    }

    fn stem(&self) -> &'static str {
        match self {
            FileKind::National => "national",
            FileKind::State => "state",
            FileKind::Region => "region",
            FileKind::Facility => "facility",
            FileKind::Provider => "provider_info",
            FileKind::RegionMembership => "region_membership",
            FileKind::StateMinimums => "state_minimums",
            FileKind::RegulatoryFeed => "sff_status",
        }
    }

    /// Columns that must be present in the header row
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            FileKind::National | FileKind::State | FileKind::Region => ENTITY_COLUMNS,
            FileKind::Facility => &[
                "PROVNUM",
                "STATE",
                "CY_Qtr",
                "Total_Nurse_HPRD",
                "Nurse_Care_HPRD",
                "Total_RN_HPRD",
            ],
            FileKind::Provider => &[
                "CMS Certification Number (CCN)",
                "Provider Name",
                "State",
                "Ownership Type",
            ],
            FileKind::RegionMembership => &["region", "state"],
            FileKind::StateMinimums => &["state", "min_hprd"],
            FileKind::RegulatoryFeed => &["facility_id", "category"],
        }
    }

    /// Check that every required column appears in `headers`
    pub fn validate_headers(&self, headers: &[String]) -> Result<()> {
        let missing: Vec<String> = self
            .required_columns()
            .iter()
            .filter(|column| !headers.iter().any(|h| h.trim() == **column))
            .map(|column| column.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(WrappedError::missing_columns(&self.to_string(), missing))
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileKind::National => "National",
            FileKind::State => "State",
            FileKind::Region => "Region",
            FileKind::Facility => "Facility",
            FileKind::Provider => "Provider information",
            FileKind::RegionMembership => "Region membership",
            FileKind::StateMinimums => "State minimums",
            FileKind::RegulatoryFeed => "SFF status",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_file_names() {
        let q = QuarterTag::parse("2025Q2").unwrap();
        assert_eq!(FileKind::Facility.file_name(Some(q)), "facility_2025Q2.csv");
        assert_eq!(FileKind::Provider.file_name(Some(q)), "provider_info_2025Q2.csv");
        assert_eq!(FileKind::StateMinimums.file_name(Some(q)), "state_minimums.csv");
        assert_eq!(FileKind::RegulatoryFeed.file_name(None), "sff_status.csv");
    }

    #[test]
    fn test_extra_columns_allowed() {
        let h = headers(&["PROVNUM", "PROVNAME", "STATE", "CY_Qtr", "Total_Nurse_HPRD", "Nurse_Care_HPRD", "Total_RN_HPRD"]);
        assert!(FileKind::Facility.validate_headers(&h).is_ok());
    }

    #[test]
    fn test_missing_columns_listed() {
        let h = headers(&["entity", "quarter"]);
        match FileKind::State.validate_headers(&h) {
            Err(WrappedError::SchemaMismatch { missing_columns, .. }) => {
                assert_eq!(missing_columns, vec!["facility_count".to_string(), "total_hprd".to_string()]);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }
}
