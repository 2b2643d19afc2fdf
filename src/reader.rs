/*!
 * CSV reader for PBJ data files
 *
 * Decodes the national, state, region, facility and provider files and the
 * side tables into the raw row types of [`crate::ingest`], with header
 * validation, optional skipping of undecodable rows and an optional
 * progress spinner.
 */

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

use csv::ReaderBuilder;
use serde::de::DeserializeOwned;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

use crate::schema::FileKind;
use crate::{ErrorContext, Result, WrappedError};

/// Skipped rows logged individually before the reader goes quiet
const MAX_LOGGED_SKIPS: usize = 10;

/// PBJ data reader
#[derive(Debug, Clone)]
pub struct PbjReader {
    /// Whether to validate CSV headers against the expected schema
    validate_headers: bool,
    /// Whether to skip undecodable rows (true) or fail on the first one (false)
    skip_invalid_records: bool,
    /// Whether to show a spinner; ignored without the `progress` feature
    show_progress_bar: bool,
}

impl Default for PbjReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PbjReader {
    pub fn new() -> Self {
        Self {
            validate_headers: true,
            skip_invalid_records: true,
            show_progress_bar: false,
        }
    }

    pub fn with_header_validation(mut self, validate: bool) -> Self {
        self.validate_headers = validate;
        self
    }

    pub fn with_skip_invalid_records(mut self, skip: bool) -> Self {
        self.skip_invalid_records = skip;
        self
    }

    pub fn with_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = show;
        self
    }

    /// Load every row of a file of the given kind
    pub fn load_rows<T, P>(&self, path: P, kind: FileKind) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WrappedError::file_not_found_with_suggestion(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|source| WrappedError::Io {
            message: format!("cannot open {}", path.display()),
            source,
            context: ErrorContext {
                file_path: Some(path.to_path_buf()),
                ..Default::default()
            },
        })?;

        self.read_rows(file, kind, Some(path)).map_err(|e| match e {
            WrappedError::CsvParse { message, line, context } => WrappedError::CsvParse {
                message,
                line,
                context: ErrorContext {
                    file_path: Some(path.to_path_buf()),
                    ..context
                },
            },
            other => other,
        })
    }

    /// Decode rows from any reader; `source` only labels log events
    pub fn read_rows<T, R>(&self, input: R, kind: FileKind, source: Option<&Path>) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        R: Read,
    {
        let label = source
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| kind.to_string());
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(input);

        if self.validate_headers {
            let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
            kind.validate_headers(&headers)?;
        }

        #[cfg(feature = "progress")]
        let spinner = self.show_progress_bar.then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} [{elapsed_precise}] {msg} {pos} rows") {
                pb.set_style(style);
            }
            pb.set_message(format!("Loading {}", label));
            pb
        });

        let start_time = Instant::now();
        let mut rows = Vec::new();
        let mut invalid_count = 0usize;

        for (idx, result) in reader.deserialize::<T>().enumerate() {
            // header is line 1
            let line = idx + 2;

            #[cfg(feature = "progress")]
            if let Some(pb) = &spinner {
                if idx % 1000 == 0 {
                    pb.set_position(idx as u64);
                }
            }

            match result {
                Ok(row) => rows.push(row),
                Err(e) => {
                    let error = WrappedError::CsvParse {
                        message: e.to_string(),
                        line: Some(line),
                        context: ErrorContext {
                            line_number: Some(line),
                            ..Default::default()
                        },
                    };
                    if !self.skip_invalid_records {
                        return Err(error);
                    }
                    invalid_count += 1;
                    if invalid_count <= MAX_LOGGED_SKIPS {
                        tracing::warn!(file = %label, line, error = %e, "skipping undecodable row");
                    }
                }
            }
        }

        #[cfg(feature = "progress")]
        if let Some(pb) = spinner {
            pb.finish_with_message(format!("Loaded {}", label));
        }

        tracing::info!(
            file = %label,
            rows = rows.len(),
            skipped = invalid_count,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "file loaded"
        );

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{RawEntityRow, RawFacilityRow};
    use std::io::Write;

    const STATE_CSV: &str = "entity,quarter,facility_count,total_hprd,direct_care_hprd,rn_hprd\n\
        NY,2025Q2,589,3.10,2.90,0.70\n\
        NJ,2025Q2,,3.40,3.10,0.80\n";

    #[test]
    fn test_read_entity_rows_with_blank_numbers() {
        let rows: Vec<RawEntityRow> = PbjReader::new()
            .read_rows(STATE_CSV.as_bytes(), FileKind::State, None)
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].facility_count, Some(589));
        assert_eq!(rows[1].facility_count, None);
        assert_eq!(rows[1].total_hprd, Some(3.40));
    }

    #[test]
    fn test_header_validation_rejects_wrong_file() {
        let result: Result<Vec<RawFacilityRow>> =
            PbjReader::new().read_rows(STATE_CSV.as_bytes(), FileKind::Facility, None);
        assert!(matches!(result, Err(WrappedError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_strict_reader_fails_on_bad_row() {
        let csv = "region,state\n1,CT\n2\n";
        let strict: Result<Vec<crate::ingest::RawRegionMemberRow>> = PbjReader::new()
            .with_skip_invalid_records(false)
            .read_rows(csv.as_bytes(), FileKind::RegionMembership, None);
        assert!(matches!(strict, Err(WrappedError::CsvParse { line: Some(3), .. })));

        let lenient: Vec<crate::ingest::RawRegionMemberRow> = PbjReader::new()
            .read_rows(csv.as_bytes(), FileKind::RegionMembership, None)
            .unwrap();
        assert_eq!(lenient.len(), 1);
    }

    #[test]
    fn test_load_rows_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(STATE_CSV.as_bytes()).unwrap();
        let rows: Vec<RawEntityRow> = PbjReader::new().load_rows(file.path(), FileKind::State).unwrap();
        assert_eq!(rows[0].entity, "NY");

        let missing: Result<Vec<RawEntityRow>> = PbjReader::new().load_rows("/nonexistent/state.csv", FileKind::State);
        assert!(matches!(missing, Err(WrappedError::FileNotFound { .. })));
    }
}
