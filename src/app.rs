use std::collections::HashMap;
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::domain::{AssemblyRecord, RecordTable};
use crate::ena::FastaSource;
use crate::error::EnaError;
use crate::fs_util;
use crate::report::ReportParser;
use crate::summary::write_summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchAction {
    Fetched,
    /// The record has no FASTA link.
    Unavailable,
    DownloadFailed,
    /// The download is kept as `.fasta.gz` but does not decode.
    Corrupt,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchItemResult {
    pub unique_id: String,
    pub action: FetchAction,
    pub path: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchResult {
    pub items: Vec<FetchItemResult>,
}

impl FetchResult {
    pub fn count(&self, action: FetchAction) -> usize {
        self.items.iter().filter(|item| item.action == action).count()
    }

    pub fn item(&self, unique_id: &str) -> Option<&FetchItemResult> {
        self.items.iter().find(|item| item.unique_id == unique_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub records: usize,
    pub summary_path: String,
    pub fetch: FetchResult,
}

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Phase(String),
    Unavailable { unique_id: String },
    NotUnzipped { path: String },
    Fetched {
        unique_id: String,
        path: String,
        elapsed: Duration,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::Phase(message) => write!(f, "{message}"),
            ProgressEvent::Unavailable { unique_id } => {
                write!(f, "FASTA not available for {unique_id}")
            }
            ProgressEvent::NotUnzipped { path } => write!(f, "File could not be unzipped: {path}"),
            ProgressEvent::Fetched {
                unique_id,
                path,
                elapsed,
            } => write!(
                f,
                "Fetched {unique_id} -> {path} ({} ms)",
                elapsed.as_millis()
            ),
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: FastaSource> {
    client: C,
    settings: Settings,
    output_dir: Utf8PathBuf,
}

impl<C: FastaSource> App<C> {
    pub fn new(client: C, settings: Settings, output_dir: Utf8PathBuf) -> Self {
        Self {
            client,
            settings,
            output_dir,
        }
    }

    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    pub fn summary_path(&self) -> Utf8PathBuf {
        self.output_dir.join(&self.settings.summary_file)
    }

    /// Parses the report and builds the (optionally filtered) record table.
    pub fn build_table(&self, input: &Path) -> Result<RecordTable, EnaError> {
        let parser = ReportParser::new(self.settings.fasta_label.as_str());
        let entries = parser.parse_file(input)?;
        RecordTable::build(entries, self.settings.organism_prefix.as_deref())
    }

    /// Runs the whole pipeline. The index is written before the first
    /// download, so it lists the full fetch set whatever happens afterwards.
    pub fn run(&self, input: &Path, sink: &dyn ProgressSink) -> Result<RunResult, EnaError> {
        fs_util::ensure_dir(&self.output_dir)?;

        sink.event(ProgressEvent::Phase(format!(
            "phase=Parse; reading {}",
            input.display()
        )));
        let table = self.build_table(input)?;

        let summary_path = self.summary_path();
        sink.event(ProgressEvent::Phase(format!(
            "phase=Index; writing {} records to {summary_path}",
            table.len()
        )));
        write_summary(&table, &summary_path)?;

        let fetch = self.fetch_all(&table, sink);
        Ok(RunResult {
            records: table.len(),
            summary_path: summary_path.to_string(),
            fetch,
        })
    }

    /// Fetches every row in table order. Per-row failures are reported and
    /// recorded, never returned.
    pub fn fetch_all(&self, table: &RecordTable, sink: &dyn ProgressSink) -> FetchResult {
        let mut stems = StemRegistry::default();
        let items = table
            .rows()
            .iter()
            .map(|record| self.fetch_record(record, &mut stems, sink))
            .collect();
        let result = FetchResult { items };
        info!(
            fetched = result.count(FetchAction::Fetched),
            unavailable = result.count(FetchAction::Unavailable),
            failed = result.count(FetchAction::DownloadFailed),
            corrupt = result.count(FetchAction::Corrupt),
            "fetch finished"
        );
        result
    }

    fn fetch_record(
        &self,
        record: &AssemblyRecord,
        stems: &mut StemRegistry,
        sink: &dyn ProgressSink,
    ) -> FetchItemResult {
        let unique_id = record.unique_id.clone();
        let Some(url) = record.fasta_url.as_deref() else {
            debug!(%unique_id, "no FASTA link");
            sink.event(ProgressEvent::Unavailable {
                unique_id: unique_id.clone(),
            });
            return FetchItemResult {
                unique_id,
                action: FetchAction::Unavailable,
                path: None,
                error: None,
            };
        };

        let stem = stems.claim(&unique_id);
        let zipped = self.output_dir.join(format!("{stem}.fasta.gz"));
        let fasta = self.output_dir.join(format!("{stem}.fasta"));
        let start = Instant::now();

        if let Err(err) = self.download(url, &zipped) {
            warn!(%unique_id, %url, error = %err, "download failed");
            sink.event(ProgressEvent::Unavailable {
                unique_id: unique_id.clone(),
            });
            return FetchItemResult {
                unique_id,
                action: FetchAction::DownloadFailed,
                path: None,
                error: Some(err.to_string()),
            };
        }

        match fs_util::gunzip_file(&zipped, &fasta) {
            Ok(bytes) => debug!(%unique_id, bytes, "decompressed"),
            Err(err) => {
                warn!(%unique_id, path = %zipped, error = %err, "decompression failed");
                sink.event(ProgressEvent::NotUnzipped {
                    path: zipped.to_string(),
                });
                return FetchItemResult {
                    unique_id,
                    action: FetchAction::Corrupt,
                    path: Some(zipped.to_string()),
                    error: Some(err.to_string()),
                };
            }
        }

        if let Err(err) = fs_util::remove_file(&zipped) {
            warn!(%unique_id, error = %err, "could not remove compressed download");
        }

        sink.event(ProgressEvent::Fetched {
            unique_id: unique_id.clone(),
            path: fasta.to_string(),
            elapsed: start.elapsed(),
        });
        FetchItemResult {
            unique_id,
            action: FetchAction::Fetched,
            path: Some(fasta.to_string()),
            error: None,
        }
    }

    /// Downloads into a temp file and only then moves it to `dest`, so a
    /// failed transfer leaves nothing behind.
    fn download(&self, url: &str, dest: &Utf8Path) -> Result<u64, EnaError> {
        let mut temp = fs_util::temp_file_for(dest)?;
        let bytes = {
            let mut writer = BufWriter::new(temp.as_file_mut());
            let bytes = self.client.download(url, &mut writer)?;
            writer
                .flush()
                .map_err(|err| EnaError::Filesystem(err.to_string()))?;
            bytes
        };
        fs_util::persist(temp, dest)?;
        debug!(%url, bytes, path = %dest, "downloaded");
        Ok(bytes)
    }
}

/// File stems handed out during one run. Distinct ids that sanitize to the
/// same stem get a numeric suffix instead of overwriting each other.
#[derive(Debug, Default)]
struct StemRegistry {
    owners: HashMap<String, String>,
}

impl StemRegistry {
    fn claim(&mut self, unique_id: &str) -> String {
        let base = fs_util::file_stem(unique_id);
        let mut stem = base.clone();
        let mut suffix = 1;
        while self.owners.contains_key(&stem) {
            suffix += 1;
            stem = format!("{base}_{suffix}");
        }
        if let Some(owner) = self.owners.get(&base).filter(|_| stem != base) {
            warn!(%unique_id, %owner, %stem, "file name already taken in this run");
        }
        self.owners.insert(stem.clone(), unique_id.to_string());
        stem
    }
}
