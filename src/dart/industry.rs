use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Read-only lookup from a DART corporation code to its industry code.
pub trait IndustryLookup: Send + Sync {
    fn lookup(&self, corp_code: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct CodeRow {
    corp_code: String,
    induty_code: Option<String>,
}

/// Industry codes keyed by corporation code, loaded from the company
/// overview table (`corp_code`, `induty_code` columns; others ignored).
#[derive(Debug, Clone, Default)]
pub struct IndustryCodes {
    by_corp: HashMap<String, String>,
}

impl IndustryCodes {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open industry code table {:?}", path))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut by_corp = HashMap::new();
        for row in csv_reader.deserialize::<CodeRow>() {
            let row = row?;
            if let Some(code) = row.induty_code.filter(|c| !c.is_empty()) {
                // First row wins, as with a first-match table lookup.
                by_corp.entry(row.corp_code).or_insert(code);
            }
        }
        log::debug!("Loaded {} industry codes", by_corp.len());
        Ok(Self { by_corp })
    }

    pub fn len(&self) -> usize {
        self.by_corp.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_corp.is_empty()
    }
}

impl IndustryLookup for IndustryCodes {
    fn lookup(&self, corp_code: &str) -> Option<String> {
        self.by_corp.get(corp_code).cloned()
    }
}

impl IndustryLookup for HashMap<String, String> {
    fn lookup(&self, corp_code: &str) -> Option<String> {
        self.get(corp_code).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_keeps_leading_zeros() {
        let csv = "corp_code,corp_name,induty_code\n00126380,삼성전자,264\n00164779,SK하이닉스,26110\n00999999,없음,\n";
        let codes = IndustryCodes::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes.lookup("00126380"), Some("264".to_string()));
        assert_eq!(codes.lookup("126380"), None);
        assert_eq!(codes.lookup("00999999"), None);
    }

    #[test]
    fn test_first_row_wins() {
        let csv = "corp_code,induty_code\n001,A\n001,B\n";
        let codes = IndustryCodes::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(codes.lookup("001"), Some("A".to_string()));
    }
}
