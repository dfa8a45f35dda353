use anyhow::{Context, Result};
use encoding_rs::{Encoding, EUC_KR};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

static DECLARED_ENCODING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?encoding\s*=\s*["']([A-Za-z0-9._-]+)["']"#)
        .expect("valid declaration regex")
});

/// The encoding named by an XML declaration, if encoding_rs knows it.
fn declared_encoding(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(200)];
    let caps = DECLARED_ENCODING_RE.captures(head)?;
    Encoding::for_label(caps.get(1)?.as_bytes())
}

/// Decodes filing bytes: UTF-8 (with or without BOM) first, then the
/// encoding the XML declaration names, then chardet's guess. EUC-KR when
/// nothing else applies.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let encoding = declared_encoding(bytes).unwrap_or_else(|| {
        let (charset, confidence, _) = chardet::detect(bytes);
        log::debug!("Detected {} at {:.2}", charset, confidence);
        Encoding::for_label(chardet::charset2encoding(&charset).as_bytes()).unwrap_or(EUC_KR)
    });
    log::debug!("Decoding as {}", encoding.name());

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::warn!("Replaced malformed {} sequences while decoding", encoding.name());
    }
    text.into_owned()
}

pub fn read_text_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(decode_bytes(&bytes))
}
