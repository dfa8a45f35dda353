use once_cell::sync::Lazy;
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

/// Report families, each stored in its own index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ReportKind {
    Quarterly,
    HalfYear,
    Business,
    EquityRegistration,
    Other,
}

impl ReportKind {
    /// Maps the `ACODE` of `DOCUMENT-NAME`; unknown or missing codes fall
    /// back to [`ReportKind::Other`].
    pub fn from_doc_code(code: &str) -> Self {
        match code.trim() {
            "11013" => ReportKind::Quarterly,
            "11012" => ReportKind::HalfYear,
            "11011" => ReportKind::Business,
            "10001" => ReportKind::EquityRegistration,
            _ => ReportKind::Other,
        }
    }

    pub fn doc_code(&self) -> &'static str {
        match self {
            ReportKind::Quarterly => "11013",
            ReportKind::HalfYear => "11012",
            ReportKind::Business => "11011",
            ReportKind::EquityRegistration => "10001",
            ReportKind::Other => "99999",
        }
    }

    pub fn index_name(&self) -> &'static str {
        match self {
            ReportKind::Quarterly => "rpt_qt",
            ReportKind::HalfYear => "rpt_half",
            ReportKind::Business => "rpt_biz",
            ReportKind::EquityRegistration => "rpt_sec_eq",
            ReportKind::Other => "rpt_other",
        }
    }

    pub fn all_indices() -> &'static [&'static str] {
        &REPORT_INDICES
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index_name())
    }
}

static REPORT_INDICES: Lazy<Vec<&'static str>> =
    Lazy::new(|| ReportKind::iter().map(|k| k.index_name()).collect());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_code_routing() {
        assert_eq!(ReportKind::from_doc_code("11013").index_name(), "rpt_qt");
        assert_eq!(ReportKind::from_doc_code("11012").index_name(), "rpt_half");
        assert_eq!(ReportKind::from_doc_code("11011").index_name(), "rpt_biz");
        assert_eq!(ReportKind::from_doc_code("10001").index_name(), "rpt_sec_eq");
        assert_eq!(ReportKind::from_doc_code("").index_name(), "rpt_other");
        assert_eq!(ReportKind::from_doc_code("12345"), ReportKind::Other);
    }

    #[test]
    fn test_doc_codes_round_trip_for_known_kinds() {
        for kind in ReportKind::iter() {
            assert_eq!(ReportKind::from_doc_code(kind.doc_code()), kind);
        }
        assert_eq!(ReportKind::all_indices().len(), 5);
    }
}
