use anyhow::Result;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::Node;

use super::table::{canonicalize_table, serialize_element};
use super::types::ContentItem;

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static INLINE_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+").expect("valid inline space regex"));
static BREAK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\n\s*").expect("valid break run regex"));

/// A `TABLE` explicitly marked `BORDER="1"` is a data table and is kept as
/// one HTML block; borderless tables are layout and are flattened to text.
pub fn is_bordered_table(node: Node) -> bool {
    node.has_tag_name("TABLE") && node.attribute("BORDER") == Some("1")
}

/// Walks `node` depth-first and returns its content in document order.
pub fn extract_items(node: Node) -> Result<Vec<ContentItem>> {
    let mut items = Vec::new();
    collect_items(node, &mut items, &descend_all)?;
    Ok(items)
}

/// Like [`extract_items`], but direct children of `node` for which `exclude`
/// returns true are not descended into. Used to leave nested sub-sections
/// and titles to their own extraction.
pub fn extract_items_excluding<F>(node: Node, exclude: F) -> Result<Vec<ContentItem>>
where
    F: Fn(Node) -> bool,
{
    let mut items = Vec::new();
    collect_items(node, &mut items, &exclude)?;
    Ok(items)
}

fn descend_all(_: Node) -> bool {
    false
}

fn collect_items(
    node: Node,
    items: &mut Vec<ContentItem>,
    exclude: &dyn Fn(Node) -> bool,
) -> Result<()> {
    if is_bordered_table(node) {
        let html = canonicalize_table(&serialize_element(node))?;
        items.push(ContentItem::table(html));
        return Ok(());
    }

    // Adjacent text nodes (split by comments or PIs) form one run, which
    // gives the element's leading text and each child's tail.
    let mut run = String::new();
    for child in node.children() {
        if child.is_text() {
            run.push_str(child.text().unwrap_or(""));
        } else if child.is_element() {
            push_text(&mut run, items);
            if !exclude(child) {
                collect_items(child, items, &descend_all)?;
            }
        }
    }
    push_text(&mut run, items);
    Ok(())
}

fn push_text(run: &mut String, items: &mut Vec<ContentItem>) {
    let normalized = WHITESPACE_RE.replace_all(run.trim(), " ");
    if !normalized.is_empty() {
        items.push(ContentItem::text(normalized));
    }
    run.clear();
}

/// Flattens extracted items into section content.
///
/// Every item after the first starts on its own line, so a table is always
/// separated from surrounding text and from a neighbouring table. Other
/// whitespace runs collapse to one space, break runs collapse to one break,
/// and the result is trimmed.
pub fn combine_items(items: &[ContentItem]) -> String {
    let combined = items.iter().map(|item| item.content.as_str()).join("\n");
    let combined = INLINE_SPACE_RE.replace_all(combined.trim(), " ");
    let combined = BREAK_RUN_RE.replace_all(&combined, "\n");
    combined.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dart::parsing::types::ContentKind;

    fn items_of(xml: &str) -> Vec<ContentItem> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        extract_items(doc.root_element()).unwrap()
    }

    #[test]
    fn test_text_and_tails_in_document_order() {
        let items = items_of("<P>가   나<PGBRK/>다\n  라<P>마</P> 바</P>");
        let texts: Vec<_> = items.iter().map(|i| i.content.as_str()).collect();
        assert_eq!(texts, vec!["가 나", "다 라", "마", "바"]);
        assert!(items.iter().all(|i| i.kind == ContentKind::Text));
    }

    #[test]
    fn test_bordered_table_is_atomic() {
        let items = items_of(
            "<BODY><P>앞</P><TABLE BORDER=\"1\"><TR><TD>셀1</TD><TE>셀2</TE></TR></TABLE>뒤<TABLE><TR><TD>레이아웃</TD></TR></TABLE></BODY>",
        );
        assert_eq!(items.len(), 4);
        assert_eq!(items[0], ContentItem::text("앞"));
        assert_eq!(
            items[1],
            ContentItem::table("<table><tr><td>셀1</td><td>셀2</td></tr></table>")
        );
        assert_eq!(items[2], ContentItem::text("뒤"));
        assert_eq!(items[3], ContentItem::text("레이아웃"));
        assert!(!items.iter().any(|i| i.kind == ContentKind::Text && i.content.contains("셀1")));
    }

    #[test]
    fn test_excluded_children_are_skipped_but_tails_kept() {
        let doc = roxmltree::Document::parse(
            "<SECTION-1><TITLE>제목</TITLE><P>본문</P><SECTION-2><TITLE>하위</TITLE><P>하위 본문</P></SECTION-2>꼬리</SECTION-1>",
        )
        .unwrap();
        let items = extract_items_excluding(doc.root_element(), |n| {
            n.has_tag_name("TITLE") || n.has_tag_name("SECTION-2")
        })
        .unwrap();
        assert_eq!(items, vec![ContentItem::text("본문"), ContentItem::text("꼬리")]);
    }

    #[test]
    fn test_combine_items_breaks_between_items() {
        let items = vec![
            ContentItem::text("첫째"),
            ContentItem::text("둘째"),
            ContentItem::table("<table><tr><td>1</td></tr></table>"),
            ContentItem::table("<table><tr><td>2</td></tr></table>"),
            ContentItem::text("셋째   넷째"),
        ];
        assert_eq!(
            combine_items(&items),
            "첫째\n둘째\n<table><tr><td>1</td></tr></table>\n<table><tr><td>2</td></tr></table>\n셋째 넷째"
        );
    }

    #[test]
    fn test_combine_items_never_doubles_breaks() {
        let items = vec![
            ContentItem::table("<table></table>"),
            ContentItem::text("  "),
            ContentItem::text("\n"),
            ContentItem::text("끝"),
        ];
        let combined = combine_items(&items);
        assert_eq!(combined, "<table></table>\n끝");
        assert!(!combined.contains("\n\n"));
    }

    #[test]
    fn test_combine_items_empty() {
        assert_eq!(combine_items(&[]), "");
    }
}
