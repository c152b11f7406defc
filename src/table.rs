use tracing::debug;

use crate::domain::{
    AssemblyRecord, CONTIG_COUNT_TAG, RecordTable, ReportEntries, ReportEntry, TOTAL_LENGTH_TAG,
};
use crate::error::EnaError;

impl RecordTable {
    /// Builds the table from parsed entries.
    ///
    /// Rows whose taxon does not start with `organism_prefix` are dropped
    /// before numeric coercion, so they never fail the run. Every remaining
    /// row must carry numeric `total-length` and `count-contig` values.
    pub fn build(
        entries: ReportEntries,
        organism_prefix: Option<&str>,
    ) -> Result<Self, EnaError> {
        let total = entries.len();
        let rows = entries
            .into_iter()
            .filter(|entry| {
                organism_prefix
                    .map(|prefix| entry.taxon.starts_with(prefix))
                    .unwrap_or(true)
            })
            .map(AssemblyRecord::try_from)
            .collect::<Result<Vec<_>, EnaError>>()?;
        debug!(
            total,
            kept = rows.len(),
            organism_prefix = organism_prefix.unwrap_or("<none>"),
            "built record table"
        );
        Ok(Self::from_rows(rows))
    }
}

impl TryFrom<ReportEntry> for AssemblyRecord {
    type Error = EnaError;

    fn try_from(entry: ReportEntry) -> Result<Self, Self::Error> {
        let length = coerce_count(&entry.unique_id, "length", TOTAL_LENGTH_TAG, entry.length)?;
        let contigs = coerce_count(&entry.unique_id, "contigs", CONTIG_COUNT_TAG, entry.contigs)?;
        Ok(Self {
            unique_id: entry.unique_id,
            accession: entry.accession,
            alias: entry.alias,
            center_name: entry.center_name,
            taxon: entry.taxon,
            strain: entry.strain,
            fasta_url: entry.fasta_url,
            length,
            contigs,
        })
    }
}

fn coerce_count(
    id: &str,
    field: &'static str,
    tag: &'static str,
    value: Option<String>,
) -> Result<i64, EnaError> {
    let value = value.ok_or_else(|| EnaError::MissingAttribute {
        id: id.to_string(),
        tag,
    })?;
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| EnaError::InvalidNumber {
            id: id.to_string(),
            field,
            value,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surrounding_whitespace_is_accepted() {
        assert_eq!(
            coerce_count("X", "length", TOTAL_LENGTH_TAG, Some(" 4641652\n".to_string())).unwrap(),
            4_641_652
        );
    }

    #[test]
    fn negative_count_is_kept() {
        assert_eq!(
            coerce_count("X", "contigs", CONTIG_COUNT_TAG, Some("-3".to_string())).unwrap(),
            -3
        );
    }

    #[test]
    fn fractional_count_is_rejected() {
        let err = coerce_count("X", "contigs", CONTIG_COUNT_TAG, Some("3.5".to_string()));
        assert!(matches!(err, Err(EnaError::InvalidNumber { field: "contigs", .. })));
    }
}
