//! Spreadsheet index of the fetch set.
//!
//! The workbook is a minimal Office Open XML package: one worksheet named
//! `summary` with a header row and one row per record, strings stored inline.

use std::fmt::Write as _;
use std::io::Write;

use camino::Utf8Path;
use chrono::{SecondsFormat, Utc};
use quick_xml::escape::escape;
use tracing::info;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::domain::{AssemblyRecord, COLUMNS, RecordTable};
use crate::error::EnaError;
use crate::fs_util;

const SHEET_NAME: &str = "summary";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs></styleSheet>"#;

/// Style index of the bold header cells in `STYLES`.
const HEADER_STYLE: u8 = 1;

enum Cell<'a> {
    Text(&'a str),
    Number(i64),
    Blank,
}

impl<'a> From<Option<&'a String>> for Cell<'a> {
    fn from(value: Option<&'a String>) -> Self {
        value.map_or(Cell::Blank, |text| Cell::Text(text))
    }
}

fn record_cells(record: &AssemblyRecord) -> [Cell<'_>; 9] {
    [
        Cell::Text(&record.unique_id),
        record.accession.as_ref().into(),
        record.alias.as_ref().into(),
        record.center_name.as_ref().into(),
        Cell::Text(&record.taxon),
        record.strain.as_ref().into(),
        record.fasta_url.as_ref().into(),
        Cell::Number(record.length),
        Cell::Number(record.contigs),
    ]
}

/// Spreadsheet column letters: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_name(index: usize) -> String {
    let mut name = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn write_row(out: &mut String, row: usize, cells: &[Cell<'_>], style: Option<u8>) {
    let style = style.map(|s| format!(" s=\"{s}\"")).unwrap_or_default();
    let _ = write!(out, "<row r=\"{row}\">");
    for (col, cell) in cells.iter().enumerate() {
        let reference = format!("{}{row}", column_name(col));
        match cell {
            Cell::Text(text) => {
                let _ = write!(
                    out,
                    "<c r=\"{reference}\" t=\"inlineStr\"{style}><is><t xml:space=\"preserve\">{}</t></is></c>",
                    escape(*text)
                );
            }
            Cell::Number(value) => {
                let _ = write!(out, "<c r=\"{reference}\"{style}><v>{value}</v></c>");
            }
            Cell::Blank => {}
        }
    }
    out.push_str("</row>");
}

pub fn worksheet_xml(table: &RecordTable) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">",
    );
    let last = format!("{}{}", column_name(COLUMNS.len() - 1), table.len() + 1);
    let _ = write!(out, "<dimension ref=\"A1:{last}\"/><sheetData>");

    let header: Vec<Cell<'_>> = COLUMNS.iter().map(|name| Cell::Text(*name)).collect();
    write_row(&mut out, 1, &header, Some(HEADER_STYLE));
    for (offset, record) in table.rows().iter().enumerate() {
        write_row(&mut out, offset + 2, &record_cells(record), None);
    }

    out.push_str("</sheetData></worksheet>");
    out
}

fn workbook_xml() -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
         xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
         <sheets><sheet name=\"{SHEET_NAME}\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>"
    )
}

fn core_xml() -> String {
    let created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:dcterms=\"http://purl.org/dc/terms/\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
         <dc:creator>ena-fasta {}</dc:creator>\
         <dcterms:created xsi:type=\"dcterms:W3CDTF\">{created}</dcterms:created>\
         </cp:coreProperties>",
        env!("CARGO_PKG_VERSION")
    )
}

/// Writes `table` as an xlsx workbook at `path`, replacing any existing file.
pub fn write_summary(table: &RecordTable, path: &Utf8Path) -> Result<(), EnaError> {
    let temp = fs_util::temp_file_for(path)?;
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("docProps/core.xml", core_xml()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
        ("xl/styles.xml", STYLES.to_string()),
        ("xl/worksheets/sheet1.xml", worksheet_xml(table)),
    ];

    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(temp.as_file());
    for (name, content) in &parts {
        zip.start_file(*name, options)
            .map_err(|err| EnaError::Spreadsheet(err.to_string()))?;
        zip.write_all(content.as_bytes())
            .map_err(|err| EnaError::Spreadsheet(err.to_string()))?;
    }
    zip.finish()
        .map_err(|err| EnaError::Spreadsheet(err.to_string()))?;

    fs_util::persist(temp, path)?;
    info!(path = %path, rows = table.len(), "wrote summary index");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(8), "I");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn text_is_escaped() {
        let table = RecordTable::from_rows(vec![AssemblyRecord {
            unique_id: "X<1>".to_string(),
            accession: None,
            alias: Some("a&b".to_string()),
            center_name: None,
            taxon: "Escherichia coli".to_string(),
            strain: None,
            fasta_url: None,
            length: 10,
            contigs: 2,
        }]);
        let xml = worksheet_xml(&table);
        assert!(xml.contains("X&lt;1&gt;"));
        assert!(xml.contains("a&amp;b"));
        assert!(xml.contains("<c r=\"H2\"><v>10</v></c>"));
        assert!(!xml.contains("r=\"B2\""));
    }
}
