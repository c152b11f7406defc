use std::fs::File;
use std::io::Read;

use camino::Utf8PathBuf;
use zip::ZipArchive;

use ena_fasta::domain::{AssemblyRecord, RecordTable};
use ena_fasta::summary::write_summary;

fn record(id: &str, url: Option<&str>) -> AssemblyRecord {
    AssemblyRecord {
        unique_id: id.to_string(),
        accession: Some(format!("GCA_{id}")),
        alias: Some(format!("alias-{id}")),
        center_name: Some("EBI".to_string()),
        taxon: "Escherichia coli".to_string(),
        strain: None,
        fasta_url: url.map(str::to_string),
        length: 4_641_652,
        contigs: 7,
    }
}

fn read_part(path: &Utf8PathBuf, name: &str) -> String {
    let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut content = String::new();
    part.read_to_string(&mut content).unwrap();
    content
}

#[test]
fn writes_workbook_with_header_and_rows() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("summary.xlsx")).unwrap();
    let table = RecordTable::from_rows(vec![
        record("AAAA02", Some("ftp://ftp.ebi.ac.uk/AAAA02.fasta.gz")),
        record("BBBB01", None),
    ]);

    write_summary(&table, &path).unwrap();

    let workbook = read_part(&path, "xl/workbook.xml");
    assert!(workbook.contains("<sheet name=\"summary\""));

    let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<dimension ref=\"A1:I3\"/>"));
    assert!(sheet.contains(
        "<c r=\"A1\" t=\"inlineStr\" s=\"1\"><is><t xml:space=\"preserve\">unique_id</t></is></c>"
    ));
    assert!(sheet.contains("<t xml:space=\"preserve\">contigs</t>"));
    assert!(sheet.contains("<c r=\"A2\" t=\"inlineStr\"><is><t xml:space=\"preserve\">AAAA02</t></is></c>"));
    assert!(sheet.contains("ftp://ftp.ebi.ac.uk/AAAA02.fasta.gz"));
    assert!(sheet.contains("<c r=\"H3\"><v>4641652</v></c>"));
    assert!(sheet.contains("<c r=\"I3\"><v>7</v></c>"));
    assert!(!sheet.contains("r=\"G3\""));
    assert!(!sheet.contains("r=\"F2\""));
}

#[test]
fn empty_table_still_writes_header() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("summary.xlsx")).unwrap();

    write_summary(&RecordTable::default(), &path).unwrap();

    let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains("<row r=\"1\">"));
    assert!(!sheet.contains("<row r=\"2\">"));
    let content_types = read_part(&path, "[Content_Types].xml");
    assert!(content_types.contains("/xl/worksheets/sheet1.xml"));
}

#[test]
fn overwrites_existing_index() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("summary.xlsx")).unwrap();
    std::fs::write(&path, b"stale").unwrap();

    write_summary(&RecordTable::from_rows(vec![record("X", None)]), &path).unwrap();

    let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(">X</t>"));
    let leftovers: Vec<_> = std::fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers.len(), 1);
}
