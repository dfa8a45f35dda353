use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;

use super::types::{GuideEntry, SECTION_LEVEL_ARTICLE};

// "7-1-1. 본문"
static ARTICLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)-(\d+)-(\d+)\.\s*").expect("valid article regex"));
// "7-1 (주가 희석화) 본문"
static SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)-(\d+)\s*\(([^)]*)\)\s*").expect("valid section regex"));
// "7 기타 투자위험요소": the name runs to the next article/section marker.
static CHAPTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)[^\S\n]+([^\d\s-])").expect("valid chapter regex"));

static PAGE_FOOTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-\s*\d+\s*-\s*$").expect("valid footer regex"));
static BANNER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*투자위험요소\s*기재요령\s*안내서").expect("valid banner regex")
});
static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid numeric regex"));

/// Kinds of structural marker, declared from highest to lowest priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MarkerKind {
    Article,
    Section,
    Chapter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub start: usize,
    pub end: usize,
    pub chapter_id: String,
    pub section_id: Option<String>,
    pub article_id: Option<String>,
    pub name: Option<String>,
}

impl Marker {
    /// Earlier start wins; on the same start, article > section > chapter.
    fn precedence(&self, other: &Marker) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

/// NFKC-normalises a line and folds every dash variant to `-`.
pub fn normalize_line(raw: &str) -> String {
    raw.nfkc()
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' | '\u{2E3A}' | '\u{2E3B}' | '\u{FE58}'
            | '\u{FE63}' | '\u{FF0D}' => '-',
            other => other,
        })
        .collect()
}

/// Page footers ("- 12 -"), the repeated guide banner and bare page numbers.
pub fn is_noise_line(line: &str) -> bool {
    PAGE_FOOTER_RE.is_match(line) || BANNER_RE.is_match(line) || NUMERIC_RE.is_match(line)
}

fn at_token_start(line: &str, start: usize) -> bool {
    line[..start]
        .chars()
        .next_back()
        .map_or(true, char::is_whitespace)
}

/// First match of `re` at or after `from` that starts a token.
fn find_at_token<'h>(re: &Regex, line: &'h str, from: usize) -> Option<Captures<'h>> {
    let mut pos = from;
    while pos <= line.len() {
        let caps = re.captures_at(line, pos)?;
        let start = caps.get(0)?.start();
        if at_token_start(line, start) {
            return Some(caps);
        }
        pos = start + line[start..].chars().next().map_or(1, char::len_utf8);
    }
    None
}

fn find_article(line: &str, from: usize) -> Option<Marker> {
    let caps = find_at_token(&ARTICLE_RE, line, from)?;
    let whole = caps.get(0)?;
    Some(Marker {
        kind: MarkerKind::Article,
        start: whole.start(),
        end: whole.end(),
        chapter_id: caps[1].to_string(),
        section_id: Some(caps[2].to_string()),
        article_id: Some(caps[3].to_string()),
        name: None,
    })
}

fn find_section(line: &str, from: usize) -> Option<Marker> {
    let caps = find_at_token(&SECTION_RE, line, from)?;
    let whole = caps.get(0)?;
    Some(Marker {
        kind: MarkerKind::Section,
        start: whole.start(),
        end: whole.end(),
        chapter_id: caps[1].to_string(),
        section_id: Some(caps[2].to_string()),
        article_id: None,
        name: Some(caps[3].trim().to_string()),
    })
}

/// A chapter heading either opens the line or is immediately followed by
/// a section of the same chapter ("2 회사위험 2-1 (재무) ..."). Anything
/// else, such as "최근 3 년간", is body text.
fn find_chapter(line: &str, from: usize) -> Option<Marker> {
    let mut pos = from;
    while let Some(caps) = find_at_token(&CHAPTER_RE, line, pos) {
        let start = caps.get(0)?.start();
        let name_start = caps.get(2)?.start();
        let article = find_article(line, name_start);
        let section = find_section(line, name_start);
        let name_end = [article.as_ref(), section.as_ref()]
            .into_iter()
            .flatten()
            .map(|m| m.start)
            .min()
            .unwrap_or(line.len());
        let heads_section = section
            .as_ref()
            .map_or(false, |s| s.start == name_end && s.chapter_id == caps[1]);

        if start == 0 || heads_section {
            return Some(Marker {
                kind: MarkerKind::Chapter,
                start,
                end: name_end,
                chapter_id: caps[1].to_string(),
                section_id: None,
                article_id: None,
                name: Some(line[name_start..name_end].trim().to_string()),
            });
        }
        pos = name_start;
    }
    None
}

/// The marker that the scanner acts on next, if any.
pub fn next_marker(line: &str, from: usize) -> Option<Marker> {
    [
        find_article(line, from),
        find_section(line, from),
        find_chapter(line, from),
    ]
    .into_iter()
    .flatten()
    .min_by(|a, b| a.precedence(b))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ScanContext {
    chapter_id: Option<String>,
    chapter_name: Option<String>,
    section_id: Option<String>,
    section_name: Option<String>,
}

impl ScanContext {
    /// Moves to the ids named by a marker. Names are left alone: only a
    /// chapter heading renames the chapter and only a section heading
    /// renames the section.
    fn enter(&mut self, chapter_id: &str, section_id: &str) {
        self.chapter_id = Some(chapter_id.to_string());
        self.section_id = Some(section_id.to_string());
    }
}

/// Splits the flat text of the reference guide into chapter / section /
/// article entries.
///
/// Lines are fed one at a time. Each line is scanned left to right for the
/// next marker; the text before it belongs to the open entry, the marker
/// moves the running context, and scanning resumes after it. Chapters only
/// update the context, they are never emitted themselves.
#[derive(Debug, Default)]
pub struct GuideScanner {
    context: ScanContext,
    open: Option<GuideEntry>,
    entries: Vec<GuideEntry>,
}

impl GuideScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, raw: &str) {
        let normalized = normalize_line(raw);
        let line = normalized.trim();
        if line.is_empty() || is_noise_line(line) {
            return;
        }

        let mut pos = 0;
        while let Some(marker) = next_marker(line, pos) {
            self.append(&line[pos..marker.start]);
            pos = marker.end;
            self.apply(marker);
        }
        self.append(&line[pos..]);
    }

    /// Emits the entry still open at end of input and returns all entries.
    pub fn finish(mut self) -> Vec<GuideEntry> {
        self.close();
        self.entries
    }

    fn apply(&mut self, marker: Marker) {
        self.close();
        match marker.kind {
            MarkerKind::Article => {
                let section_id = marker.section_id.unwrap_or_default();
                self.context.enter(&marker.chapter_id, &section_id);
                self.open_entry(marker.article_id.unwrap_or_default());
            }
            MarkerKind::Section => {
                let section_id = marker.section_id.unwrap_or_default();
                self.context.enter(&marker.chapter_id, &section_id);
                self.context.section_name = marker.name;
                self.open_entry(SECTION_LEVEL_ARTICLE.to_string());
            }
            MarkerKind::Chapter => {
                self.context = ScanContext {
                    chapter_id: Some(marker.chapter_id),
                    chapter_name: marker.name,
                    section_id: None,
                    section_name: None,
                };
            }
        }
    }

    fn open_entry(&mut self, art_id: String) {
        let (Some(chap_id), Some(sec_id)) =
            (self.context.chapter_id.clone(), self.context.section_id.clone())
        else {
            return;
        };
        self.open = Some(GuideEntry {
            chap_id,
            chap_name: self.context.chapter_name.clone(),
            sec_id,
            sec_name: self.context.section_name.clone(),
            art_id,
            content: String::new(),
        });
    }

    fn append(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        match self.open.as_mut() {
            Some(entry) => {
                if !entry.content.is_empty() {
                    entry.content.push(' ');
                }
                entry.content.push_str(text);
            }
            None => log::debug!("Dropping text outside any section: {}", text),
        }
    }

    fn close(&mut self) {
        if let Some(mut entry) = self.open.take() {
            entry.content = entry.content.trim().to_string();
            self.entries.push(entry);
        }
    }
}

pub fn scan_lines<I, S>(lines: I) -> Vec<GuideEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanner = GuideScanner::new();
    for line in lines {
        scanner.push_line(line.as_ref());
    }
    scanner.finish()
}
