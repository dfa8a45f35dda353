use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Structural tags of the DART filing markup that survive sanitising.
/// Names are compared case-sensitively, so `<p>` stays literal text while
/// `<P>` is restored.
pub const ALLOWED_TAGS: &[&str] = &[
    "DOCUMENT",
    "DOCUMENT-NAME",
    "FORMULA-VERSION",
    "COMPANY-NAME",
    "SUMMARY",
    "LIBRARY",
    "BODY",
    "EXTRACTION",
    "COVER",
    "COVER-TITLE",
    "IMAGE",
    "IMG",
    "IMG-CAPTION",
    "P",
    "A",
    "SPAN",
    "TR",
    "TD",
    "TH",
    "TE",
    "TU",
    "SECTION-1",
    "SECTION-2",
    "SECTION-3",
    "TITLE",
    "TABLE",
    "TABLE-GROUP",
    "COLGROUP",
    "COL",
    "THEAD",
    "TBODY",
    "PGBRK",
    "PART",
    "CORRECTION",
];

static DECLARATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<\?xml[^>]*\?>\s*").expect("valid declaration regex"));

// Operates on the fully escaped body: &lt;/TD&gt; -> ("/", "TD", "")
static ESCAPED_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&lt;(/?)(\w+(?:-\w+)*)([^&]*)&gt;").expect("valid escaped tag regex")
});

// SPAN carries styling and A carries links; neither matters structurally.
static NOISE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?(?:SPAN|A)\b[^>]*?>").expect("valid noise tag regex"));

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:amp|lt|gt|quot|apos|#[0-9]+|#x[0-9A-Fa-f]+);").expect("valid entity regex")
});

pub fn is_allowed_tag(name: &str) -> bool {
    ALLOWED_TAGS.contains(&name)
}

/// Repairs a raw DART filing so that a strict XML parser accepts it.
///
/// Every bracket in the body is escaped first, then only allow-listed tags
/// are restored with their attributes untouched. Anything else that looked
/// like markup ends up as literal text in the parsed tree.
pub fn sanitize_markup(raw: &str) -> String {
    let (declaration, body) = match DECLARATION_RE.find(raw) {
        Some(m) => (Some(m.as_str().trim_end()), &raw[m.end()..]),
        None => (None, raw),
    };

    let escaped = body.replace('<', "&lt;").replace('>', "&gt;");
    let restored = ESCAPED_TAG_RE.replace_all(&escaped, |caps: &Captures| {
        if is_allowed_tag(&caps[2]) {
            format!("<{}{}{}>", &caps[1], &caps[2], &caps[3])
        } else {
            caps[0].to_string()
        }
    });
    let without_noise = NOISE_TAG_RE.replace_all(&restored, "");

    let cleaned: String = without_noise
        .trim()
        .chars()
        .filter(|c| !is_disallowed_control(*c))
        .collect();
    let cleaned = escape_bare_ampersands(&cleaned);

    match declaration {
        Some(declaration) => format!("{}\n{}", declaration, cleaned.trim_start()),
        None => cleaned,
    }
}

/// Control characters that XML 1.0 rejects outright.
fn is_disallowed_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Rewrites every `&` that does not start a predefined XML entity or a
/// numeric character reference as `&amp;`. HTML-only entities such as
/// `&nbsp;` are undefined in XML and therefore escaped too.
pub fn escape_bare_ampersands(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        if ENTITY_RE.is_match(after) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = after;
    }
    out.push_str(rest);
    out
}
