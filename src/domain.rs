use std::collections::HashMap;

/// Link label ENA uses for the gzipped WGS contig set.
pub const WGS_FASTA_LABEL: &str = "WGS_SET_FASTA";

pub const TOTAL_LENGTH_TAG: &str = "total-length";
pub const CONTIG_COUNT_TAG: &str = "count-contig";

/// Column headers of the summary sheet, `unique_id` first.
pub const COLUMNS: [&str; 9] = [
    "unique_id",
    "accession",
    "alias",
    "center_name",
    "taxon",
    "strain",
    "fasta_url",
    "length",
    "contigs",
];

/// One assembly entry as read from the report, before numeric coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub unique_id: String,
    pub accession: Option<String>,
    pub alias: Option<String>,
    pub center_name: Option<String>,
    pub taxon: String,
    pub strain: Option<String>,
    pub fasta_url: Option<String>,
    pub length: Option<String>,
    pub contigs: Option<String>,
}

/// Report entries keyed by `unique_id`, kept in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ReportEntries {
    entries: Vec<ReportEntry>,
    index: HashMap<String, usize>,
}

impl ReportEntries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry. A repeated id replaces the earlier entry in place and
    /// hands the replaced one back.
    pub fn insert(&mut self, entry: ReportEntry) -> Option<ReportEntry> {
        match self.index.get(&entry.unique_id) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot], entry)),
            None => {
                self.index
                    .insert(entry.unique_id.clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn get(&self, unique_id: &str) -> Option<&ReportEntry> {
        self.index.get(unique_id).map(|&slot| &self.entries[slot])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for ReportEntries {
    type Item = ReportEntry;
    type IntoIter = std::vec::IntoIter<ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A row of the record table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyRecord {
    pub unique_id: String,
    pub accession: Option<String>,
    pub alias: Option<String>,
    pub center_name: Option<String>,
    pub taxon: String,
    pub strain: Option<String>,
    pub fasta_url: Option<String>,
    pub length: i64,
    pub contigs: i64,
}

#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    rows: Vec<AssemblyRecord>,
}

impl RecordTable {
    pub fn from_rows(rows: Vec<AssemblyRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[AssemblyRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, unique_id: &str) -> Option<&AssemblyRecord> {
        self.rows.iter().find(|row| row.unique_id == unique_id)
    }
}
