use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{EnumIter, IntoEnumIterator};

/// One account line of a single-company full financial statement.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AccountLine {
    #[serde(rename = "account_nm", default)]
    pub account_name: String,
    /// Statement division: `BS`, `IS`, `CIS`, `CF`, `SCE`.
    #[serde(rename = "sj_div", default)]
    pub statement_division: String,
    #[serde(rename = "thstrm_amount", default)]
    pub current_amount: Option<String>,
    #[serde(rename = "frmtrm_amount", default)]
    pub prior_amount: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Metric {
    Revenue,
    OperatingIncome,
    NetIncome,
    TotalAssets,
    Equity,
    CashFlowOperating,
    CashFlowInvesting,
    CashFlowFinancing,
}

impl Metric {
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Metric::Revenue => &["수익(매출액)", "매출액", "매출", "영업수익"],
            Metric::OperatingIncome => &["영업이익", "영업손실", "영업이익(손실)"],
            Metric::NetIncome => &[
                "당기순이익",
                "당기순이익(손실)",
                "지배기업의 소유주에게 귀속되는 당기순이익(손실)",
            ],
            Metric::TotalAssets => &["자산총계"],
            Metric::Equity => &["자본총계"],
            Metric::CashFlowOperating => &["영업활동현금흐름", "영업활동순현금흐름"],
            Metric::CashFlowInvesting => &["투자활동현금흐름", "투자활동순현금흐름"],
            Metric::CashFlowFinancing => &["재무활동현금흐름", "재무활동순현금흐름"],
        }
    }

    pub fn statements(&self) -> &'static [&'static str] {
        match self {
            Metric::Revenue | Metric::OperatingIncome | Metric::NetIncome => &["CIS"],
            Metric::TotalAssets | Metric::Equity => &["BS"],
            Metric::CashFlowOperating | Metric::CashFlowInvesting | Metric::CashFlowFinancing => {
                &["CF"]
            }
        }
    }

    fn tracks_prior(&self) -> bool {
        matches!(self, Metric::Revenue | Metric::OperatingIncome)
    }

    fn matches(&self, account_name: &str, division: &str) -> bool {
        self.aliases().contains(&account_name) && self.statements().contains(&division)
    }
}

/// Absolute metrics plus ratios derived from them, stored under
/// `financials` on every report of the company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub revenue: f64,
    pub operating_income: f64,
    pub net_income: f64,
    pub total_assets: f64,
    pub equity: f64,
    pub cash_flow_operating: f64,
    pub cash_flow_investing: f64,
    pub cash_flow_financing: f64,

    pub operating_margin: f64,
    pub net_margin: f64,
    pub debt_to_equity: f64,
    pub equity_ratio: f64,
    pub operating_cf_to_investing_cf: f64,
    pub operating_cf_to_revenue: f64,
    pub revenue_growth: Option<f64>,
    pub operating_income_growth: Option<f64>,
}

impl Financials {
    fn value_mut(&mut self, metric: Metric) -> &mut f64 {
        match metric {
            Metric::Revenue => &mut self.revenue,
            Metric::OperatingIncome => &mut self.operating_income,
            Metric::NetIncome => &mut self.net_income,
            Metric::TotalAssets => &mut self.total_assets,
            Metric::Equity => &mut self.equity,
            Metric::CashFlowOperating => &mut self.cash_flow_operating,
            Metric::CashFlowInvesting => &mut self.cash_flow_investing,
            Metric::CashFlowFinancing => &mut self.cash_flow_financing,
        }
    }
}

/// Parses an amount such as `"1,234,567"`. Blank or malformed amounts are
/// zero; accounts named as a loss (`손실`) are always negative.
pub fn parse_amount(value: Option<&str>, account_name: &str) -> f64 {
    let cleaned = value.unwrap_or("").replace(',', "");
    let cleaned = cleaned.trim();
    let amount = if cleaned.is_empty() {
        0.0
    } else {
        cleaned.parse::<f64>().unwrap_or_else(|_| {
            log::debug!("Unparseable amount '{}' for {}", cleaned, account_name);
            0.0
        })
    };
    if account_name.contains("손실") {
        -amount.abs()
    } else {
        amount
    }
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Relative change from `previous`; `None` when there is no usable base.
pub fn growth(current: f64, previous: Option<f64>) -> Option<f64> {
    match previous {
        Some(prev) if prev != 0.0 => Some((current - prev) / prev),
        _ => None,
    }
}

pub fn compute_financials(lines: &[AccountLine]) -> Financials {
    let mut fin = Financials::default();
    let mut prior: HashMap<Metric, f64> = HashMap::new();

    for line in lines {
        let name = line.account_name.trim();
        let division = line.statement_division.trim();
        let current = parse_amount(line.current_amount.as_deref(), name);
        let previous = parse_amount(line.prior_amount.as_deref(), name);

        for metric in Metric::iter().filter(|m| m.matches(name, division)) {
            let slot = fin.value_mut(metric);
            // A later zero never overwrites a figure already found.
            if *slot != 0.0 && current == 0.0 {
                continue;
            }
            *slot = current;
            if metric.tracks_prior() {
                prior.insert(metric, previous);
            }
        }
    }

    fin.operating_margin = ratio(fin.operating_income, fin.revenue);
    fin.net_margin = ratio(fin.net_income, fin.revenue);
    fin.debt_to_equity = ratio(fin.total_assets - fin.equity, fin.equity);
    fin.equity_ratio = ratio(fin.equity, fin.total_assets);
    fin.operating_cf_to_investing_cf = ratio(fin.cash_flow_operating, fin.cash_flow_investing);
    fin.operating_cf_to_revenue = ratio(fin.cash_flow_operating, fin.revenue);
    fin.revenue_growth = growth(fin.revenue, prior.get(&Metric::Revenue).copied());
    fin.operating_income_growth = growth(
        fin.operating_income,
        prior.get(&Metric::OperatingIncome).copied(),
    );
    fin
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, div: &str, current: &str, prior: &str) -> AccountLine {
        AccountLine {
            account_name: name.to_string(),
            statement_division: div.to_string(),
            current_amount: Some(current.to_string()),
            prior_amount: Some(prior.to_string()),
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(Some("1,234,567"), "매출액"), 1_234_567.0);
        assert_eq!(parse_amount(Some(" "), "매출액"), 0.0);
        assert_eq!(parse_amount(None, "매출액"), 0.0);
        assert_eq!(parse_amount(Some("-"), "매출액"), 0.0);
        assert_eq!(parse_amount(Some("500"), "영업손실"), -500.0);
        assert_eq!(parse_amount(Some("-500"), "영업이익(손실)"), -500.0);
    }

    #[test]
    fn test_compute_financials() {
        let lines = vec![
            line("자산총계", "BS", "1,000", "900"),
            line("자본총계", "BS", "400", "350"),
            line("매출액", "CIS", "2,000", "1,600"),
            line("매출액", "IS", "9,999", "1"),
            line("영업이익", "CIS", "300", "0"),
            line("당기순이익(손실)", "CIS", "100", "80"),
            line("영업활동현금흐름", "CF", "250", "200"),
            line("투자활동현금흐름", "CF", "-125", "-100"),
            line("재무활동현금흐름", "CF", "50", "10"),
        ];
        let fin = compute_financials(&lines);

        assert_eq!(fin.revenue, 2000.0);
        assert_eq!(fin.net_income, -100.0);
        assert_eq!(fin.operating_margin, 0.15);
        assert_eq!(fin.debt_to_equity, 1.5);
        assert_eq!(fin.equity_ratio, 0.4);
        assert_eq!(fin.operating_cf_to_investing_cf, -2.0);
        assert_eq!(fin.operating_cf_to_revenue, 0.125);
        assert_eq!(fin.revenue_growth, Some(0.25));
        assert_eq!(fin.operating_income_growth, None);
    }

    #[test]
    fn test_zero_does_not_overwrite() {
        let lines = vec![
            line("매출액", "CIS", "1,000", "500"),
            line("영업수익", "CIS", "0", "0"),
        ];
        let fin = compute_financials(&lines);
        assert_eq!(fin.revenue, 1000.0);
        assert_eq!(fin.revenue_growth, Some(1.0));
    }

    #[test]
    fn test_zero_denominators_fall_back() {
        let fin = compute_financials(&[line("자산총계", "BS", "1,000", "0")]);
        assert_eq!(fin.equity, 0.0);
        assert_eq!(fin.debt_to_equity, 0.0);
        assert_eq!(fin.operating_margin, 0.0);
        assert_eq!(fin.revenue_growth, None);
        assert_eq!(growth(10.0, Some(0.0)), None);
        assert_eq!(growth(10.0, None), None);
    }
}
