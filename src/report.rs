//! Reader for ENA XML search reports.
//!
//! The report is loaded into a small element tree so that fields can be
//! looked up with descendant paths (`WGS_SET/PREFIX` matches any `WGS_SET`
//! below the entry with a direct `PREFIX` child). Every top-level child of the
//! document root is one assembly entry.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::{debug, warn};

use crate::domain::{
    CONTIG_COUNT_TAG, ReportEntries, ReportEntry, TOTAL_LENGTH_TAG, WGS_FASTA_LABEL,
};
use crate::error::EnaError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart) -> Result<Self, EnaError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|err| EnaError::Xml(err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| EnaError::Xml(err.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed text content; `None` when the element has no text.
    pub fn text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    pub fn find_text(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(Element::text)
    }

    /// All matches of `path` in document order. The first step matches at any
    /// depth below `self`; later steps match direct children.
    pub fn find_all<'a>(&'a self, path: &str) -> Vec<&'a Element> {
        let steps: Vec<&str> = path.split('/').collect();
        let Some((first, rest)) = steps.split_first() else {
            return Vec::new();
        };

        let mut found = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.name == *first {
                collect_path(node, rest, &mut found);
            }
            stack.extend(node.children.iter().rev());
        }
        found
    }
}

fn collect_path<'a>(node: &'a Element, steps: &[&str], found: &mut Vec<&'a Element>) {
    match steps.split_first() {
        None => found.push(node),
        Some((step, rest)) => {
            for child in node.children.iter().filter(|child| child.name == *step) {
                collect_path(child, rest, found);
            }
        }
    }
}

/// Reads a whole XML document into an element tree and returns its root.
pub fn parse_document<R: BufRead>(source: R) -> Result<Element, EnaError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut buffer = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let event = reader
            .read_event_into(&mut buffer)
            .map_err(|err| EnaError::Xml(format!("at byte {}: {err}", reader.buffer_position())))?;
        match event {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| EnaError::Xml("unbalanced closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|err| EnaError::Xml(err.to_string()))?;
                    open.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buffer.clear();
    }

    if let Some(open) = stack.last() {
        return Err(EnaError::Xml(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    root.ok_or(EnaError::EmptyReport)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), EnaError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.replace(element).is_some() {
                return Err(EnaError::Xml("multiple root elements".to_string()));
            }
        }
    }
    Ok(())
}

/// Turns report entries into [`ReportEntry`] values.
#[derive(Debug, Clone)]
pub struct ReportParser {
    fasta_label: String,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(WGS_FASTA_LABEL)
    }
}

impl ReportParser {
    pub fn new(fasta_label: impl Into<String>) -> Self {
        Self {
            fasta_label: fasta_label.into(),
        }
    }

    pub fn parse_file(&self, path: &Path) -> Result<ReportEntries, EnaError> {
        let file = File::open(path).map_err(|_| EnaError::ReportRead(path.to_path_buf()))?;
        self.parse_reader(BufReader::new(file))
    }

    pub fn parse_reader<R: BufRead>(&self, source: R) -> Result<ReportEntries, EnaError> {
        let root = parse_document(source)?;
        let mut entries = ReportEntries::new();
        for (position, node) in root.children().iter().enumerate() {
            let entry = self.extract_entry(position + 1, node)?;
            if let Some(replaced) = entries.insert(entry) {
                warn!(
                    unique_id = %replaced.unique_id,
                    "duplicate entry in report; keeping the later record"
                );
            }
        }
        debug!(root = root.name(), entries = entries.len(), "parsed report");
        Ok(entries)
    }

    /// Extracts one entry; `position` is 1-based and only used in errors.
    pub fn extract_entry(&self, position: usize, node: &Element) -> Result<ReportEntry, EnaError> {
        let accession = node.attribute("accession").map(str::to_string);
        let alias = node.attribute("alias").map(str::to_string);
        let center_name = node.attribute("center_name").map(str::to_string);

        let unique_id = match (
            node.find_text("WGS_SET/PREFIX"),
            node.find_text("WGS_SET/VERSION"),
        ) {
            (Some(prefix), Some(version)) => format!("{prefix}0{version}"),
            _ => alias
                .clone()
                .or_else(|| accession.clone())
                .ok_or(EnaError::MissingIdentifier(position))?,
        };

        let taxon = node
            .find_text("TAXON/SCIENTIFIC_NAME")
            .ok_or_else(|| EnaError::MissingTaxon(unique_id.clone()))?
            .to_string();
        let strain = node.find_text("TAXON/STRAIN").map(str::to_string);

        let mut fasta_url = None;
        for link in node.find_all("ASSEMBLY_LINKS/ASSEMBLY_LINK/URL_LINK") {
            if link.find_text("LABEL") != Some(self.fasta_label.as_str()) {
                continue;
            }
            if let Some(url) = link.find_text("URL") {
                fasta_url = Some(url.to_string());
            }
        }

        let mut length = None;
        let mut contigs = None;
        for attribute in node.find_all("ASSEMBLY_ATTRIBUTES/ASSEMBLY_ATTRIBUTE") {
            let value = attribute.find_text("VALUE").map(str::to_string);
            match attribute.find_text("TAG") {
                Some(TOTAL_LENGTH_TAG) => length = value,
                Some(CONTIG_COUNT_TAG) => contigs = value,
                _ => {}
            }
        }

        Ok(ReportEntry {
            unique_id,
            accession,
            alias,
            center_name,
            taxon,
            strain,
            fasta_url,
            length,
            contigs,
        })
    }
}
