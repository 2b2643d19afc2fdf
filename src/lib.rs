/*!
 * # PBJ Wrapped: quarterly nursing-home staffing summaries
 *
 * A Rust library that turns two quarters of CMS Payroll-Based Journal (PBJ)
 * staffing data into a "wrapped" summary for the whole country, one state, or
 * one of the ten CMS regions.
 *
 * ## Features
 *
 * - **Scope resolution**: "New York", "new-york", "NY", "region_2" and "usa" all resolve
 * - **Ingestion repair**: canonical facility ids, collision reporting, column-shift repair
 * - **Peer rankings**: rank and percentile among states or regions
 * - **Extremes and movers**: lowest/highest facilities and quarter-over-quarter leaderboards
 * - **Ownership and compliance**: ownership buckets and state minimum compliance
 * - **Special focus status**: SFF counts and newly flagged facilities
 * - **Batch and cache**: every scope in parallel, or memoized single-flight lookups
 * - **Multiple Export Formats**: JSON, JSON Lines and CSV
 *
 * ## Quick Start
 *
 * ```no_run
 * use pbj_wrapped::prelude::*;
 *
 * # fn main() -> Result<()> {
 * let current = QuarterTag::parse("2025Q2")?;
 * let dataset = WrappedDataset::load_directory("./data", current, None)?;
 *
 * let engine = WrappedEngine::new(&dataset);
 * let summary = engine.summarize("new-york")?;
 * println!(
 *     "{}: {:.2} HPRD, rank {:?}",
 *     summary.identity.display_name,
 *     summary.basics.total_hprd,
 *     summary.rankings.total_hprd.map(|r| r.rank)
 * );
 * # Ok(())
 * # }
 * ```
 *
 * ## Building a Dataset from Rows
 *
 * Rows decoded elsewhere can be handed over directly:
 *
 * ```no_run
 * # use pbj_wrapped::prelude::*;
 * # fn main() -> Result<()> {
 * let mut current = QuarterInput::new(QuarterTag::parse("2025Q2")?);
 * current.states.push(RawEntityRow {
 *     entity: "NY".to_string(),
 *     quarter: "2025Q2".to_string(),
 *     total_hprd: Some(3.10),
 *     ..Default::default()
 * });
 *
 * let observer = std::sync::Arc::new(CollectingObserver::new());
 * let dataset = DatasetBuilder::new()
 *     .current(current)
 *     .observer(observer.clone())
 *     .build()?;
 * println!("{} diagnostics", observer.len());
 * # Ok(())
 * # }
 * ```
 *
 * ## Configuration
 *
 * ```no_run
 * # use pbj_wrapped::prelude::*;
 * # fn main() -> Result<()> {
 * let config = ConfigBuilder::new()
 *     .min_census(20.0)
 *     .movers_count(10)
 *     .highlight_seed(Some(2025))
 *     .build()?;
 * pbj_wrapped::config::set_global_config(config);
 * # Ok(())
 * # }
 * ```
 *
 * ## Data Files
 *
 * [`DatasetBuilder::from_directory`](dataset::DatasetBuilder::from_directory) looks for:
 *
 * - `national_YYYYQN.csv`, `state_YYYYQN.csv`, `region_YYYYQN.csv`: pre-aggregated rows
 * - `facility_YYYYQN.csv`: the PBJ facility staffing file
 * - `provider_info_YYYYQN.csv`: the Provider Information file
 * - `region_membership.csv`, `state_minimums.csv`, `sff_status.csv`: optional side tables
 */

// Re-export error types from root
pub use error::{ErrorContext, ExportFormat, Result, WrappedError};

// Public modules
pub mod aggregate;
pub mod cache;
pub mod config;
pub mod data_types;
pub mod dataset;
pub mod error;
pub mod export;
pub mod extremes;
pub mod ingest;
pub mod join;
pub mod normalize;
pub mod observe;
pub mod ownership;
pub mod ranking;
pub mod reader;
pub mod regulatory;
pub mod resolver;
pub mod schema;
pub mod summary;
pub mod trends;

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```
/// use pbj_wrapped::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cache::SummaryCache;
    pub use crate::config::{ConfigBuilder, WrappedConfig};
    pub use crate::data_types::*;
    pub use crate::dataset::{DatasetBuilder, QuarterData, QuarterInput, WrappedDataset};
    pub use crate::error::{Result, WrappedError};
    pub use crate::export::{CsvExporter, JsonExporter, SummaryExporter};
    pub use crate::ingest::{
        IngestReport, RawEntityRow, RawFacilityRow, RawProviderRow, RawRegionMemberRow, RawRegulatoryRow,
        RawStateMinimumRow,
    };
    pub use crate::normalize::{normalize, resolve_identifier};
    pub use crate::observe::{CollectingObserver, Diagnostic, NullObserver, Observer, TracingObserver};
    pub use crate::ranking::StaffingMetric;
    pub use crate::reader::PbjReader;
    pub use crate::schema::FileKind;
    pub use crate::summary::{ScopeSummary, WrappedEngine};
    pub use crate::ExportFormat;
}

/// PBJ data constants
pub mod constants {
    /// Width of a canonical facility identifier (CCN)
    pub const FACILITY_ID_WIDTH: usize = 6;

    /// Default census eligibility floor for extremes and movers
    pub const DEFAULT_MIN_CENSUS: f64 = 30.0;

    /// Default size of each lowest/highest list
    pub const DEFAULT_EXTREMES_COUNT: usize = 3;

    /// Default size of each mover leaderboard
    pub const DEFAULT_MOVERS_COUNT: usize = 5;

    /// Default size of the newly-SFF list
    pub const DEFAULT_NEWLY_FLAGGED_LIMIT: usize = 5;

    /// Default tenure at or below which a feed SFF is new
    pub const DEFAULT_SFF_NEW_TENURE_MONTHS: u32 = 3;

    /// Number of CMS regions
    pub const REGION_COUNT: u8 = 10;
}

/// Common recipes and utility functions
pub mod cookbook {
    use crate::prelude::*;

    /// Summarize one identifier and render it as pretty JSON
    ///
    /// # Example
    /// ```no_run
    /// # use pbj_wrapped::prelude::*;
    /// # use pbj_wrapped::cookbook::summary_json;
    /// # fn main() -> Result<()> {
    /// # let dataset = WrappedDataset::load_directory("./data", QuarterTag::parse("2025Q2")?, None)?;
    /// println!("{}", summary_json(&dataset, "region-2")?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn summary_json(dataset: &WrappedDataset, identifier: &str) -> Result<String> {
        let summary = WrappedEngine::new(dataset).summarize(identifier)?;
        Ok(serde_json::to_string_pretty(&summary)?)
    }

    /// States ordered by total HPRD, highest first, territories excluded
    pub fn states_by_total_hprd(dataset: &WrappedDataset) -> Vec<(StateCode, f64)> {
        let mut states: Vec<(StateCode, f64)> = crate::ranking::peers(&dataset.current, ScopeType::State)
            .into_iter()
            .filter_map(|row| match row.entity {
                Scope::State(state) => Some((state, row.hprd.total)),
                _ => None,
            })
            .collect();
        states.sort_by(|a, b| b.1.total_cmp(&a.1));
        states
    }

    /// Scopes whose summary could not be computed, with the reason
    pub fn failed_scopes(dataset: &WrappedDataset) -> Vec<(Scope, String)> {
        WrappedEngine::new(dataset)
            .summarize_all()
            .into_iter()
            .filter_map(|(scope, result)| result.err().map(|e| (scope, e.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::{FacilityId, QuarterTag};

    #[test]
    fn test_facility_id_canonicalization() {
        assert_eq!(FacilityId::canonicalize("15009").unwrap().as_str(), "015009");
        assert_eq!(FacilityId::canonicalize("15009.0").unwrap().as_str(), "015009");
        assert!(FacilityId::canonicalize("").is_err());
    }

    #[test]
    fn test_quarter_tag() {
        assert_eq!(QuarterTag::parse("2025q1").unwrap().previous().to_string(), "2024Q4");
        assert!(QuarterTag::parse("2025Q5").is_err());
    }

    #[test]
    fn test_all_scopes_count() {
        // nation + 50 states + DC + 10 regions
        assert_eq!(summary::WrappedEngine::all_scopes().len(), 62);
    }
}
