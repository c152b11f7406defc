use std::path::Path;

use assert_matches::assert_matches;

use ena_fasta::error::EnaError;
use ena_fasta::report::ReportParser;

fn fixture() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/assemblies.xml"))
}

fn parse(xml: &str) -> Result<ena_fasta::domain::ReportEntries, EnaError> {
    ReportParser::default().parse_reader(xml.as_bytes())
}

fn assembly(attrs: &str, body: &str) -> String {
    format!("<ASSEMBLY_SET><ASSEMBLY {attrs}>{body}</ASSEMBLY></ASSEMBLY_SET>")
}

const TAXON: &str = "<TAXON><SCIENTIFIC_NAME>Escherichia coli</SCIENTIFIC_NAME></TAXON>";

#[test]
fn parses_fixture_in_document_order() {
    let entries = ReportParser::default().parse_file(fixture()).unwrap();
    let ids: Vec<_> = entries.iter().map(|e| e.unique_id.as_str()).collect();
    assert_eq!(ids, vec!["AAAA02", "ASM19595v2", "NWVJ01"]);

    let mg1655 = entries.get("AAAA02").unwrap();
    assert_eq!(mg1655.accession.as_deref(), Some("GCA_000005845"));
    assert_eq!(mg1655.alias.as_deref(), Some("ASM584v2"));
    assert_eq!(mg1655.center_name.as_deref(), Some("University of Wisconsin"));
    assert_eq!(mg1655.taxon, "Escherichia coli str. K-12 substr. MG1655");
    assert_eq!(mg1655.strain.as_deref(), Some("K-12"));
    assert_eq!(
        mg1655.fasta_url.as_deref(),
        Some("ftp://ftp.ebi.ac.uk/pub/databases/ena/wgs/public/aaa/AAAA02.fasta.gz")
    );
    assert_eq!(mg1655.length.as_deref(), Some("4641652"));
    assert_eq!(mg1655.contigs.as_deref(), Some("1"));
}

#[test]
fn entry_without_wgs_set_falls_back_to_alias() {
    let entries = ReportParser::default().parse_file(fixture()).unwrap();
    let h37rv = entries.get("ASM19595v2").unwrap();
    assert_eq!(h37rv.strain, None);
    assert_eq!(h37rv.fasta_url, None);
    assert_eq!(h37rv.length.as_deref(), Some("4411532"));
}

#[test]
fn prefix_without_version_falls_back_to_alias() {
    let xml = assembly(
        r#"alias="my-alias""#,
        &format!("{TAXON}<WGS_SET><PREFIX>ABCD</PREFIX></WGS_SET>"),
    );
    let entries = parse(&xml).unwrap();
    assert!(entries.get("my-alias").is_some());
}

#[test]
fn missing_alias_falls_back_to_accession() {
    let xml = assembly(r#"accession="GCA_1""#, TAXON);
    let entries = parse(&xml).unwrap();
    assert!(entries.get("GCA_1").is_some());
}

#[test]
fn entry_without_any_identifier_is_fatal() {
    let xml = assembly("", TAXON);
    assert_matches!(parse(&xml), Err(EnaError::MissingIdentifier(1)));
}

#[test]
fn missing_taxon_is_fatal() {
    let xml = assembly(r#"alias="x""#, "<TAXON><STRAIN>K-12</STRAIN></TAXON>");
    assert_matches!(parse(&xml), Err(EnaError::MissingTaxon(id)) if id == "x");
}

#[test]
fn last_matching_fasta_link_wins() {
    let links = r#"<ASSEMBLY_LINKS>
        <ASSEMBLY_LINK><URL_LINK><LABEL>WGS_SET_FASTA</LABEL><URL>http://a/first.gz</URL></URL_LINK></ASSEMBLY_LINK>
        <ASSEMBLY_LINK><URL_LINK><LABEL>OTHER</LABEL><URL>http://a/other.gz</URL></URL_LINK></ASSEMBLY_LINK>
        <ASSEMBLY_LINK><URL_LINK><LABEL>WGS_SET_FASTA</LABEL><URL>http://a/second.gz</URL></URL_LINK></ASSEMBLY_LINK>
    </ASSEMBLY_LINKS>"#;
    let xml = assembly(r#"alias="x""#, &format!("{TAXON}{links}"));
    let entries = parse(&xml).unwrap();
    assert_eq!(
        entries.get("x").unwrap().fasta_url.as_deref(),
        Some("http://a/second.gz")
    );
}

#[test]
fn matching_link_without_url_keeps_earlier_url() {
    let links = r#"<ASSEMBLY_LINKS>
        <ASSEMBLY_LINK><URL_LINK><LABEL>WGS_SET_FASTA</LABEL><URL>http://a/first.gz</URL></URL_LINK></ASSEMBLY_LINK>
        <ASSEMBLY_LINK><URL_LINK><LABEL>WGS_SET_FASTA</LABEL><URL> </URL></URL_LINK></ASSEMBLY_LINK>
        <ASSEMBLY_LINK><URL_LINK><LABEL>WGS_SET_FASTA</LABEL></URL_LINK></ASSEMBLY_LINK>
    </ASSEMBLY_LINKS>"#;
    let xml = assembly(r#"alias="x""#, &format!("{TAXON}{links}"));
    let entries = parse(&xml).unwrap();
    assert_eq!(
        entries.get("x").unwrap().fasta_url.as_deref(),
        Some("http://a/first.gz")
    );
}

#[test]
fn custom_fasta_label() {
    let links = r#"<ASSEMBLY_LINKS><ASSEMBLY_LINK><URL_LINK><LABEL>WGS_SET_FLATFILE</LABEL><URL>http://a/x.dat.gz</URL></URL_LINK></ASSEMBLY_LINK></ASSEMBLY_LINKS>"#;
    let xml = assembly(r#"alias="x""#, &format!("{TAXON}{links}"));
    let entries = ReportParser::new("WGS_SET_FLATFILE")
        .parse_reader(xml.as_bytes())
        .unwrap();
    assert_eq!(
        entries.get("x").unwrap().fasta_url.as_deref(),
        Some("http://a/x.dat.gz")
    );
}

#[test]
fn duplicate_ids_keep_the_later_record() {
    let xml = format!(
        "<ASSEMBLY_SET>\
         <ASSEMBLY alias=\"dup\" center_name=\"first\">{TAXON}</ASSEMBLY>\
         <ASSEMBLY alias=\"other\">{TAXON}</ASSEMBLY>\
         <ASSEMBLY alias=\"dup\" center_name=\"second\">{TAXON}</ASSEMBLY>\
         </ASSEMBLY_SET>"
    );
    let entries = parse(&xml).unwrap();
    assert_eq!(entries.len(), 2);
    let first = entries.iter().next().unwrap();
    assert_eq!(first.unique_id, "dup");
    assert_eq!(first.center_name.as_deref(), Some("second"));
}

#[test]
fn malformed_xml_is_fatal() {
    let xml = "<ASSEMBLY_SET><ASSEMBLY alias=\"x\"></TAXON></ASSEMBLY_SET>";
    assert_matches!(parse(xml), Err(EnaError::Xml(_)));
}

#[test]
fn missing_report_file() {
    let err = ReportParser::default()
        .parse_file(Path::new("/nonexistent/report.xml"))
        .unwrap_err();
    assert_matches!(err, EnaError::ReportRead(_));
}
