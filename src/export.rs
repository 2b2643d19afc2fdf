/*!
 * Export functionality for scope summaries
 *
 * JSON (a pretty array, or JSON Lines with one summary per line) carries the
 * full summary. CSV carries one headline row per scope.
 */

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::data_types::{RegulatoryCategory, ScopeType};
use crate::summary::ScopeSummary;
use crate::{ExportFormat, Result, WrappedError};

/// Trait for implementing summary exporters
pub trait SummaryExporter {
    /// Write summaries to any writer
    fn write(&self, summaries: &[ScopeSummary], writer: &mut dyn Write) -> Result<()>;

    fn format(&self) -> ExportFormat;

    /// Write summaries to a file, replacing it
    fn export(&self, summaries: &[ScopeSummary], path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(summaries, &mut writer)?;
        writer.flush()?;
        tracing::info!(path = %path.display(), count = summaries.len(), format = %self.format(), "summaries exported");
        Ok(())
    }
}

/// JSON exporter
#[derive(Debug, Clone)]
pub struct JsonExporter {
    /// Whether to pretty-print the JSON
    pub pretty_print: bool,
    /// Whether to export as JSON Lines (one summary per line)
    pub json_lines: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self {
            pretty_print: true,
            json_lines: false,
        }
    }
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    pub fn as_json_lines(mut self) -> Self {
        self.json_lines = true;
        self.pretty_print = false;
        self
    }
}

impl SummaryExporter for JsonExporter {
    fn write(&self, summaries: &[ScopeSummary], writer: &mut dyn Write) -> Result<()> {
        if self.json_lines {
            for summary in summaries {
                let json = serde_json::to_string(summary)?;
                writeln!(writer, "{}", json)?;
            }
        } else if self.pretty_print {
            serde_json::to_writer_pretty(&mut *writer, summaries)?;
            writeln!(writer)?;
        } else {
            serde_json::to_writer(&mut *writer, summaries)?;
            writeln!(writer)?;
        }
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        if self.json_lines {
            ExportFormat::JsonLines
        } else {
            ExportFormat::Json
        }
    }
}

/// Headline figures of one scope, flattened for CSV
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub scope_type: ScopeType,
    pub identifier: String,
    pub display_name: String,
    pub current_quarter: String,
    pub prior_quarter: String,
    pub facility_count: u32,
    pub avg_daily_residents: f64,
    pub total_hprd: f64,
    pub direct_care_hprd: f64,
    pub rn_hprd: f64,
    pub contract_percent: f64,
    pub median_hprd: Option<f64>,
    pub total_hprd_rank: Option<usize>,
    pub total_hprd_percentile: Option<u32>,
    pub has_prior_data: bool,
    pub total_hprd_change: f64,
    pub direct_care_hprd_change: f64,
    pub rn_hprd_change: f64,
    pub sff_count: usize,
    pub candidate_count: usize,
    pub newly_sff_count: usize,
    pub below_minimum: Option<usize>,
}

impl From<&ScopeSummary> for SummaryRow {
    fn from(summary: &ScopeSummary) -> Self {
        let rank = summary.rankings.total_hprd.as_ref();
        Self {
            scope_type: summary.identity.scope_type,
            identifier: summary.identity.identifier.clone(),
            display_name: summary.identity.display_name.clone(),
            current_quarter: summary.identity.quarters.current.to_string(),
            prior_quarter: summary.identity.quarters.prior.to_string(),
            facility_count: summary.basics.facility_count,
            avg_daily_residents: summary.basics.avg_daily_residents,
            total_hprd: summary.basics.total_hprd,
            direct_care_hprd: summary.basics.direct_care_hprd,
            rn_hprd: summary.basics.rn_hprd,
            contract_percent: summary.basics.contract_percent,
            median_hprd: summary.basics.median_hprd,
            total_hprd_rank: rank.map(|r| r.rank),
            total_hprd_percentile: rank.map(|r| r.percentile),
            has_prior_data: summary.trends.has_prior_data,
            total_hprd_change: summary.trends.total_hprd_change,
            direct_care_hprd_change: summary.trends.direct_care_hprd_change,
            rn_hprd_change: summary.trends.rn_hprd_change,
            sff_count: summary.regulatory_status.count(RegulatoryCategory::Sff),
            candidate_count: summary.regulatory_status.count(RegulatoryCategory::Candidate),
            newly_sff_count: summary.regulatory_status.newly_sff_count,
            below_minimum: summary.compliance.as_ref().map(|c| c.below_minimum),
        }
    }
}

/// CSV exporter, one headline row per scope
#[derive(Debug, Clone)]
pub struct CsvExporter {
    pub include_headers: bool,
    pub delimiter: u8,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            include_headers: true,
            delimiter: b',',
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_headers(mut self, include: bool) -> Self {
        self.include_headers = include;
        self
    }
}

impl SummaryExporter for CsvExporter {
    fn write(&self, summaries: &[ScopeSummary], writer: &mut dyn Write) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(self.include_headers)
            .delimiter(self.delimiter)
            .from_writer(writer);
        for summary in summaries {
            csv_writer.serialize(SummaryRow::from(summary)).map_err(|e| WrappedError::Export {
                message: format!("cannot write row for {}: {}", summary.identity.identifier, e),
                format: ExportFormat::Csv,
                suggestion: None,
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }
}

/// Exporter for a format with default settings
pub fn exporter_for(format: ExportFormat) -> Box<dyn SummaryExporter> {
    match format {
        ExportFormat::Json => Box::new(JsonExporter::new()),
        ExportFormat::JsonLines => Box::new(JsonExporter::new().as_json_lines()),
        ExportFormat::Csv => Box::new(CsvExporter::new()),
    }
}

/// Export summaries to `path` in `format`
pub fn export_summaries<P: AsRef<Path>>(summaries: &[ScopeSummary], path: P, format: ExportFormat) -> Result<()> {
    exporter_for(format).export(summaries, path.as_ref())
}
