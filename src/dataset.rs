/*!
 * Unified dataset API for PBJ staffing data
 *
 * Provides a builder that ingests the raw rows of two quarters plus the
 * optional side tables, and a dataset whose lookup indexes are built once,
 * before any summary stage reads them.
 */

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::data_types::*;
use crate::ingest::{self, EntityLevel, IngestReport};
use crate::ingest::{RawEntityRow, RawFacilityRow, RawProviderRow, RawRegionMemberRow, RawRegulatoryRow, RawStateMinimumRow};
use crate::observe::{Diagnostic, Observer, TracingObserver};
use crate::reader::PbjReader;
use crate::schema::FileKind;
use crate::{Result, WrappedError};

/// Raw rows of one quarter, as handed over by a loader
#[derive(Debug, Clone)]
pub struct QuarterInput {
    pub quarter: QuarterTag,
    pub national: Vec<RawEntityRow>,
    pub states: Vec<RawEntityRow>,
    pub regions: Vec<RawEntityRow>,
    pub facilities: Vec<RawFacilityRow>,
    pub providers: Vec<RawProviderRow>,
}

impl QuarterInput {
    pub fn new(quarter: QuarterTag) -> Self {
        Self {
            quarter,
            national: Vec::new(),
            states: Vec::new(),
            regions: Vec::new(),
            facilities: Vec::new(),
            providers: Vec::new(),
        }
    }

    /// Load every file of `quarter` found in `dir`
    ///
    /// The national, state and facility files are required; region and
    /// provider files may be absent.
    pub fn load_from_directory<P: AsRef<Path>>(reader: &PbjReader, dir: P, quarter: QuarterTag) -> Result<Self> {
        let dir = dir.as_ref();
        let path_of = |kind: FileKind| -> PathBuf { dir.join(kind.file_name(Some(quarter))) };
        let optional = |kind: FileKind| -> Option<PathBuf> {
            let path = path_of(kind);
            path.exists().then_some(path)
        };

        let mut input = Self::new(quarter);
        input.national = reader.load_rows(path_of(FileKind::National), FileKind::National)?;
        input.states = reader.load_rows(path_of(FileKind::State), FileKind::State)?;
        input.facilities = reader.load_rows(path_of(FileKind::Facility), FileKind::Facility)?;
        if let Some(path) = optional(FileKind::Region) {
            input.regions = reader.load_rows(path, FileKind::Region)?;
        }
        if let Some(path) = optional(FileKind::Provider) {
            input.providers = reader.load_rows(path, FileKind::Provider)?;
        }
        Ok(input)
    }
}

/// Typed rows of one quarter with their lookup indexes
#[derive(Debug, Clone)]
pub struct QuarterData {
    pub quarter: QuarterTag,
    /// National, state and region rows in input order
    pub entities: Vec<QuarterlyEntityMetrics>,
    pub facilities: Vec<FacilityMetrics>,
    pub providers: Vec<ProviderProfile>,

    entity_index: HashMap<Scope, usize>,
    facility_index: HashMap<FacilityId, usize>,
    provider_index: HashMap<FacilityId, usize>,
}

impl QuarterData {
    /// Assemble typed rows and build their indexes
    pub fn new(
        quarter: QuarterTag,
        entities: Vec<QuarterlyEntityMetrics>,
        facilities: Vec<FacilityMetrics>,
        providers: Vec<ProviderProfile>,
    ) -> Self {
        let mut data = Self {
            quarter,
            entities,
            facilities,
            providers,
            entity_index: HashMap::new(),
            facility_index: HashMap::new(),
            provider_index: HashMap::new(),
        };
        data.build_indexes();
        data
    }

    fn from_input(input: &QuarterInput, observer: &dyn Observer, report: &mut IngestReport) -> Self {
        let quarter = input.quarter;
        let mut entities = ingest::ingest_entities(EntityLevel::National, &input.national, quarter, observer, report);
        entities.extend(ingest::ingest_entities(EntityLevel::State, &input.states, quarter, observer, report));
        entities.extend(ingest::ingest_entities(EntityLevel::Region, &input.regions, quarter, observer, report));
        let facilities = ingest::ingest_facilities(&input.facilities, quarter, observer, report);
        let providers = ingest::ingest_providers(&input.providers, quarter, observer, report);
        Self::new(quarter, entities, facilities, providers)
    }

    /// Build indexes for fast lookups; rows are already unique per key
    fn build_indexes(&mut self) {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            self.facility_index = self.facilities
                .par_iter()
                .enumerate()
                .map(|(idx, facility)| (facility.facility_id.clone(), idx))
                .collect();
            self.provider_index = self.providers
                .par_iter()
                .enumerate()
                .map(|(idx, provider)| (provider.facility_id.clone(), idx))
                .collect();
        }

        #[cfg(not(feature = "parallel"))]
        {
            self.facility_index = self.facilities
                .iter()
                .enumerate()
                .map(|(idx, facility)| (facility.facility_id.clone(), idx))
                .collect();
            self.provider_index = self.providers
                .iter()
                .enumerate()
                .map(|(idx, provider)| (provider.facility_id.clone(), idx))
                .collect();
        }

        let mut entity_index = HashMap::new();
        for (idx, entity) in self.entities.iter().enumerate() {
            entity_index.entry(entity.entity).or_insert(idx);
        }
        self.entity_index = entity_index;
    }

    pub fn entity(&self, scope: Scope) -> Option<&QuarterlyEntityMetrics> {
        self.entity_index.get(&scope).and_then(|&idx| self.entities.get(idx))
    }

    /// Entity rows of one granularity, in input order
    pub fn entities_of(&self, scope_type: ScopeType) -> impl Iterator<Item = &QuarterlyEntityMetrics> {
        self.entities.iter().filter(move |e| e.entity.scope_type() == scope_type)
    }

    pub fn facility(&self, id: &FacilityId) -> Option<&FacilityMetrics> {
        self.facility_index.get(id).and_then(|&idx| self.facilities.get(idx))
    }

    pub fn provider(&self, id: &FacilityId) -> Option<&ProviderProfile> {
        self.provider_index.get(id).and_then(|&idx| self.providers.get(idx))
    }
}

/// Builder for a two-quarter dataset
///
/// # Example
/// ```no_run
/// # use pbj_wrapped::prelude::*;
/// # fn main() -> Result<()> {
/// let current = QuarterTag::parse("2025Q2")?;
/// let dataset = DatasetBuilder::from_directory("./data", current, None)?.build()?;
/// # Ok(())
/// # }
/// ```
pub struct DatasetBuilder {
    current: Option<QuarterInput>,
    prior: Option<QuarterInput>,
    region_membership: Option<Vec<RawRegionMemberRow>>,
    state_minimums: Option<Vec<RawStateMinimumRow>>,
    regulatory_feed: Option<Vec<RawRegulatoryRow>>,
    observer: Arc<dyn Observer>,
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            current: None,
            prior: None,
            region_membership: None,
            state_minimums: None,
            regulatory_feed: None,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn current(mut self, input: QuarterInput) -> Self {
        self.current = Some(input);
        self
    }

    pub fn prior(mut self, input: QuarterInput) -> Self {
        self.prior = Some(input);
        self
    }

    /// Replace the built-in CMS region table
    pub fn region_membership(mut self, rows: Vec<RawRegionMemberRow>) -> Self {
        self.region_membership = Some(rows);
        self
    }

    pub fn state_minimums(mut self, rows: Vec<RawStateMinimumRow>) -> Self {
        self.state_minimums = Some(rows);
        self
    }

    pub fn regulatory_feed(mut self, rows: Vec<RawRegulatoryRow>) -> Self {
        self.regulatory_feed = Some(rows);
        self
    }

    /// Receiver of ingestion diagnostics
    pub fn observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Ingest everything and build the indexes
    pub fn build(self) -> Result<WrappedDataset> {
        let current_input = self.current.ok_or_else(|| WrappedError::Custom {
            message: "Current quarter rows not specified".to_string(),
            suggestion: Some("Use .current() to supply the current quarter".to_string()),
        })?;
        let observer = self.observer.as_ref();
        let prior_tag = self
            .prior
            .as_ref()
            .map(|p| p.quarter)
            .unwrap_or_else(|| current_input.quarter.previous());
        let quarters = QuarterPair::new(current_input.quarter, prior_tag)?;

        let mut report = IngestReport::default();
        let current = QuarterData::from_input(&current_input, observer, &mut report);
        let prior = self
            .prior
            .as_ref()
            .map(|input| QuarterData::from_input(input, observer, &mut report));

        let region_membership = match &self.region_membership {
            Some(rows) => ingest::ingest_region_membership(rows, observer, &mut report)?,
            None => RegionMembership::standard(),
        };
        let state_minimums = self
            .state_minimums
            .as_ref()
            .map(|rows| ingest::ingest_state_minimums(rows, observer, &mut report));
        let regulatory_feed = self
            .regulatory_feed
            .as_ref()
            .map(|rows| ingest::ingest_regulatory_feed(rows, observer, &mut report));

        tracing::info!(
            current = %quarters.current,
            prior = %quarters.prior,
            facilities = current.facilities.len(),
            providers = current.providers.len(),
            collisions = report.collisions,
            repaired = report.repaired,
            zeroed = report.zeroed,
            rejected = report.rejected,
            "dataset built"
        );

        Ok(WrappedDataset {
            quarters,
            current,
            prior,
            region_membership,
            state_minimums,
            regulatory_feed,
            ingest_report: report,
            id: NEXT_DATASET_ID.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Discover files for `current` (and `prior`, defaulting to the preceding
    /// quarter when its files exist) in a directory
    ///
    /// File names follow the patterns in [`FileKind::file_name`].
    pub fn from_directory<P: AsRef<Path>>(dir: P, current: QuarterTag, prior: Option<QuarterTag>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(WrappedError::Custom {
                message: format!("'{}' is not a directory", dir.display()),
                suggestion: Some("Provide a directory path containing PBJ data files".to_string()),
            });
        }

        let config = crate::config::global_config();
        let reader = PbjReader::new()
            .with_skip_invalid_records(config.skip_invalid_records)
            .with_progress_bar(config.enable_progress_bar);

        let mut builder = Self::new().current(QuarterInput::load_from_directory(&reader, dir, current)?);

        let prior_tag = prior.unwrap_or_else(|| current.previous());
        if dir.join(FileKind::National.file_name(Some(prior_tag))).exists() {
            builder = builder.prior(QuarterInput::load_from_directory(&reader, dir, prior_tag)?);
        } else if prior.is_some() {
            return Err(WrappedError::file_not_found_with_suggestion(
                dir.join(FileKind::National.file_name(Some(prior_tag))),
            ));
        }

        for kind in FileKind::ALL.into_iter().filter(|kind| !kind.is_quarterly()) {
            let path = dir.join(kind.file_name(None));
            if !path.exists() {
                continue;
            }
            builder = match kind {
                FileKind::RegionMembership => builder.region_membership(reader.load_rows(path, kind)?),
                FileKind::StateMinimums => builder.state_minimums(reader.load_rows(path, kind)?),
                FileKind::RegulatoryFeed => builder.regulatory_feed(reader.load_rows(path, kind)?),
                _ => builder,
            };
        }

        Ok(builder)
    }
}

/// Two quarters of typed, indexed rows plus side tables
///
/// Immutable once built; every summary stage only reads it.
#[derive(Debug, Clone)]
pub struct WrappedDataset {
    pub quarters: QuarterPair,
    pub current: QuarterData,
    /// Absent when no prior-quarter rows were supplied
    pub prior: Option<QuarterData>,
    pub region_membership: RegionMembership,
    pub state_minimums: Option<HashMap<StateCode, StateMinimumStandard>>,
    pub regulatory_feed: Option<HashMap<FacilityId, RegulatoryFeedEntry>>,
    pub ingest_report: IngestReport,
    id: u64,
}

static NEXT_DATASET_ID: AtomicU64 = AtomicU64::new(1);

impl WrappedDataset {
    /// Identity assigned at build time; clones share it
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Load from a directory using the naming patterns of [`FileKind`]
    pub fn load_directory<P: AsRef<Path>>(dir: P, current: QuarterTag, prior: Option<QuarterTag>) -> Result<Self> {
        DatasetBuilder::from_directory(dir, current, prior)?.build()
    }

    pub fn state_minimum(&self, state: StateCode) -> Option<&StateMinimumStandard> {
        self.state_minimums.as_ref()?.get(&state)
    }

    /// Report optional side tables that were not supplied
    pub fn report_missing_optional(&self, observer: &dyn Observer) {
        if self.state_minimums.is_none() {
            observer.record(&Diagnostic::MissingOptionalDataset { dataset: "state_minimums" });
        }
        if self.regulatory_feed.is_none() {
            observer.record(&Diagnostic::MissingOptionalDataset { dataset: "regulatory_feed" });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::CollectingObserver;

    fn entity(key: &str, quarter: &str, total: f64) -> RawEntityRow {
        RawEntityRow {
            entity: key.to_string(),
            quarter: quarter.to_string(),
            facility_count: Some(10),
            total_hprd: Some(total),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_requires_current_quarter() {
        assert!(DatasetBuilder::new().build().is_err());
    }

    #[test]
    fn test_prior_defaults_to_previous_quarter() {
        let current = QuarterTag::parse("2025Q1").unwrap();
        let mut input = QuarterInput::new(current);
        input.national.push(entity("usa", "2025Q1", 3.8));
        let dataset = DatasetBuilder::new()
            .observer(Arc::new(CollectingObserver::new()))
            .current(input)
            .build()
            .unwrap();

        assert_eq!(dataset.quarters.prior, QuarterTag::parse("2024Q4").unwrap());
        assert!(dataset.prior.is_none());
        assert_eq!(dataset.current.entity(Scope::Usa).unwrap().hprd.total, 3.8);
    }

    #[test]
    fn test_prior_must_precede_current() {
        let current = QuarterInput::new(QuarterTag::parse("2025Q1").unwrap());
        let prior = QuarterInput::new(QuarterTag::parse("2025Q2").unwrap());
        let result = DatasetBuilder::new().current(current).prior(prior).build();
        assert!(matches!(result, Err(WrappedError::QuarterMismatch { .. })));
    }

    #[test]
    fn test_entity_index_by_level() {
        let current = QuarterTag::parse("2025Q2").unwrap();
        let mut input = QuarterInput::new(current);
        input.national.push(entity("national", "2025Q2", 3.8));
        input.states.push(entity("NY", "2025Q2", 3.1));
        input.states.push(entity("New Jersey", "2025Q2", 3.4));
        input.regions.push(entity("2", "2025Q2", 3.3));
        let dataset = DatasetBuilder::new()
            .observer(Arc::new(CollectingObserver::new()))
            .current(input)
            .build()
            .unwrap();

        assert_eq!(dataset.current.entities_of(ScopeType::State).count(), 2);
        let region = Scope::Region(RegionNumber::new(2).unwrap());
        assert_eq!(dataset.current.entity(region).unwrap().hprd.total, 3.3);
        assert!(dataset.state_minimums.is_none());
    }
}
