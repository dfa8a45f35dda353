use anyhow::{Context, Result};
use chrono::NaiveDate;
use roxmltree::{Document, Node};

use super::content::{combine_items, extract_items_excluding};
use super::sanitize::sanitize_markup;
use super::types::{Assembled, DocumentRecord, Section, SkipReason};
use crate::dart::industry::IndustryLookup;

/// Filings with this first title ("finalised securities issuance terms")
/// only restate another filing and are never indexed.
pub const EXCLUDED_SUBTYPE: &str = "증권발행조건확정";

const TITLE: &str = "TITLE";
const SECTION_1: &str = "SECTION-1";
const SECTION_2: &str = "SECTION-2";

/// Sanitises, parses and assembles one raw filing. `Err` means the markup
/// could not be parsed even after sanitising.
pub fn assemble_document(
    raw: &str,
    file_name: &str,
    industry: &dyn IndustryLookup,
) -> Result<Assembled> {
    let sanitized = sanitize_markup(raw);
    let tree = Document::parse(&sanitized)
        .with_context(|| format!("Failed to parse XML for {}", file_name))?;
    assemble_tree(&tree, file_name, industry)
}

pub fn assemble_tree(
    tree: &Document,
    file_name: &str,
    industry: &dyn IndustryLookup,
) -> Result<Assembled> {
    let root = tree.root_element();

    if let Some(title) = root
        .descendants()
        .find(|n| n.has_tag_name(TITLE))
        .and_then(leading_text)
    {
        if title == EXCLUDED_SUBTYPE {
            return Ok(Assembled::Skipped(SkipReason::ExcludedSubtype(title)));
        }
    }

    let doc_id = file_name.split('.').next().unwrap_or_default().to_string();
    let pub_date: String = file_name.chars().take(8).collect();
    if NaiveDate::parse_from_str(&pub_date, "%Y%m%d").is_err() {
        log::warn!("File name {} does not start with a yyyyMMdd date", file_name);
    }

    let doc_name_node = child_named(root, "DOCUMENT-NAME");
    let company_node = child_named(root, "COMPANY-NAME");
    let corp_code = attribute_or_empty(company_node, "AREGCIK");

    let mut record = DocumentRecord {
        doc_id,
        doc_name: text_or_empty(doc_name_node),
        doc_code: attribute_or_empty(doc_name_node, "ACODE"),
        pub_date,
        induty_code: industry.lookup(&corp_code),
        corp_code,
        corp_name: text_or_empty(company_node),
        sections: Vec::new(),
    };

    let mut sec_counter = 0u32;
    for section1 in root.descendants().filter(|n| n.has_tag_name(SECTION_1)) {
        if let Some(title) = section_title(section1) {
            let items = extract_items_excluding(section1, |n| {
                n.has_tag_name(TITLE) || n.has_tag_name(SECTION_2)
            })?;
            record
                .sections
                .push(numbered_section(&mut sec_counter, title, combine_items(&items)));
        }

        for section2 in section1.children().filter(|n| n.has_tag_name(SECTION_2)) {
            if let Some(title) = section_title(section2) {
                let items = extract_items_excluding(section2, |n| n.has_tag_name(TITLE))?;
                record
                    .sections
                    .push(numbered_section(&mut sec_counter, title, combine_items(&items)));
            }
        }
    }

    log::debug!(
        "Assembled {} ({}) with {} sections",
        record.doc_id,
        record.doc_name,
        record.sections.len()
    );
    Ok(Assembled::Record(record))
}

fn numbered_section(counter: &mut u32, title: String, content: String) -> Section {
    *counter += 1;
    Section {
        sec_id: counter.to_string(),
        sec_title: title,
        sec_content: content,
    }
}

fn section_title(section: Node) -> Option<String> {
    child_named(section, TITLE).and_then(leading_text)
}

fn child_named<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

/// Text that precedes the first child element, trimmed; `None` if empty.
fn leading_text(node: Node) -> Option<String> {
    let text: String = node
        .children()
        .take_while(|n| !n.is_element())
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn text_or_empty(node: Option<Node>) -> String {
    node.and_then(leading_text).unwrap_or_default()
}

fn attribute_or_empty(node: Option<Node>, name: &str) -> String {
    node.and_then(|n| n.attribute(name))
        .unwrap_or_default()
        .to_string()
}
