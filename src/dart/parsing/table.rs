use anyhow::Result;
use html_escape::{encode_double_quoted_attribute, encode_text};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use roxmltree::Node;

/// Layout and DART bookkeeping attributes that carry no table structure.
/// Compared lower-cased.
const PRESENTATION_ATTRS: &[&str] = &[
    "width",
    "height",
    "align",
    "valign",
    "aclass",
    "afixtable",
    "acopy",
    "adelete",
    "aupdatecont",
    "acopycol",
    "amovecol",
    "adeletecol",
    "usermark",
    "acode",
    "aunit",
    "aunitvalue",
    "refno",
    "aassocnote",
    "atoc",
    "atocid",
    "adelim",
    "border",
    "frame",
    "rules",
    "style",
    "class",
    "id",
];

/// DART cell variants that are plain cells for any HTML consumer.
const CELL_ALIASES: &[&str] = &["te", "tu"];

fn canonical_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw).to_lowercase();
    if CELL_ALIASES.contains(&name.as_str()) {
        "td".to_string()
    } else {
        name
    }
}

fn canonical_start(start: &BytesStart) -> Result<BytesStart<'static>> {
    let mut clean = BytesStart::new(canonical_name(start.name().as_ref()));
    for attr in start.html_attributes().with_checks(false) {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_lowercase();
        if PRESENTATION_ATTRS.contains(&key.as_str()) {
            continue;
        }
        clean.push_attribute((key.as_bytes(), attr.value.as_ref()));
    }
    Ok(clean)
}

/// Cleans one table's markup for downstream consumers: tag and attribute
/// names are lower-cased, `TE`/`TU` become `td`, presentation attributes are
/// dropped while `rowspan`/`colspan` survive, and line breaks and
/// backslashes are removed. Running it on its own output is a no-op.
pub fn canonicalize_table(markup: &str) -> Result<String> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().check_end_names = false;
    let mut writer = Writer::new(Vec::with_capacity(markup.len()));

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Start(e) => writer.write_event(Event::Start(canonical_start(&e)?))?,
            Event::Empty(e) => writer.write_event(Event::Empty(canonical_start(&e)?))?,
            Event::End(e) => {
                let name = canonical_name(e.name().as_ref());
                writer.write_event(Event::End(BytesEnd::new(name)))?
            }
            Event::Comment(_) => {}
            other => writer.write_event(other)?,
        }
    }

    let html = String::from_utf8(writer.into_inner())?;
    let html: String = html
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\\'))
        .collect();
    Ok(html.trim().to_string())
}

/// Serialises an element subtree back to markup. Text and attribute values
/// are re-escaped, comments and processing instructions are dropped, and
/// the element's tail text is not included.
pub fn serialize_element(node: Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: Node, out: &mut String) {
    if node.is_text() {
        out.push_str(&encode_text(node.text().unwrap_or("")));
        return;
    }
    if !node.is_element() {
        return;
    }

    let name = node.tag_name().name();
    out.push('<');
    out.push_str(name);
    for attr in node.attributes() {
        out.push(' ');
        out.push_str(attr.name());
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(attr.value()));
        out.push('"');
    }
    out.push('>');
    for child in node.children() {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_table() {
        let raw = "<TABLE BORDER=\"1\" WIDTH=\"600\" ACLASS=\"NORMAL\">\n<TBODY>\n<TR><TH ALIGN=\"CENTER\" ROWSPAN=\"2\">구분</TH><TE COLSPAN=\"2\" AUNIT=\"KRW\">1,000</TE><TU>a\\b</TU></TR>\n</TBODY>\n</TABLE>";
        let clean = canonicalize_table(raw).unwrap();
        assert_eq!(
            clean,
            "<table><tbody><tr><th rowspan=\"2\">구분</th><td colspan=\"2\">1,000</td><td>ab</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let raw = "<TABLE BORDER=\"1\"><TR><TE STYLE=\"x\" ROWSPAN=\"3\">A &amp; B</TE></TR><COL WIDTH=\"10\"/></TABLE>";
        let once = canonicalize_table(raw).unwrap();
        let twice = canonicalize_table(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(
            once,
            "<table><tr><td rowspan=\"3\">A &amp; B</td></tr><col/></table>"
        );
    }

    #[test]
    fn test_unquoted_attributes_are_accepted() {
        let clean = canonicalize_table("<TABLE BORDER=1><TR><TD COLSPAN=2>x</TD></TR></TABLE>").unwrap();
        assert_eq!(clean, "<table><tr><td colspan=\"2\">x</td></tr></table>");
    }

    #[test]
    fn test_serialize_element_escapes_text() {
        let doc = roxmltree::Document::parse(
            "<ROOT><TABLE BORDER=\"1\"><TR><TD>a &amp; &lt;b&gt;</TD></TR></TABLE>tail</ROOT>",
        )
        .unwrap();
        let table = doc.root_element().first_element_child().unwrap();
        assert_eq!(
            serialize_element(table),
            "<TABLE BORDER=\"1\"><TR><TD>a &amp; &lt;b&gt;</TD></TR></TABLE>"
        );
    }
}
