use serde_json::{json, Value};

/// Settings and mappings shared by all report indices.
pub fn report_index_body() -> Value {
    json!({
        "settings": {
            "number_of_shards": 5,
            "number_of_replicas": 0,
            "analysis": {
                "analyzer": {
                    "html_strip_analyzer": {
                        "type": "custom",
                        "tokenizer": "standard",
                        "char_filter": ["html_strip"],
                        "filter": ["lowercase"]
                    }
                }
            }
        },
        "mappings": {
            "properties": {
                "doc_id": { "type": "keyword" },
                "doc_name": { "type": "keyword" },
                "doc_code": { "type": "keyword" },
                "pub_date": { "type": "date", "format": "yyyyMMdd" },
                "corp_code": { "type": "keyword" },
                "corp_name": { "type": "keyword" },
                "induty_code": { "type": "keyword" },
                "sections": {
                    "type": "nested",
                    "properties": {
                        "sec_id": { "type": "keyword" },
                        "sec_title": { "type": "text" },
                        "sec_content": {
                            "type": "text",
                            "analyzer": "html_strip_analyzer"
                        }
                    }
                }
            }
        }
    })
}

/// Reference guide index with Korean morphological analysis.
pub fn guide_index_body() -> Value {
    let nori = json!({
        "type": "custom",
        "tokenizer": "nori_tokenizer",
        "filter": ["lowercase", "nori_part_of_speech"]
    });
    let korean_text = json!({
        "type": "text",
        "analyzer": "ko_nori",
        "search_analyzer": "ko_nori"
    });
    json!({
        "settings": {
            "number_of_shards": 5,
            "number_of_replicas": 0,
            "analysis": {
                "analyzer": {
                    "ko_nori": nori,
                    "default": nori,
                    "default_search": nori
                }
            }
        },
        "mappings": {
            "properties": {
                "chap_id": { "type": "keyword" },
                "chap_name": korean_text,
                "sec_id": { "type": "keyword" },
                "sec_name": korean_text,
                "art_id": { "type": "keyword" },
                "content": korean_text
            }
        }
    })
}

pub const FINANCIAL_FIELDS: &[&str] = &[
    "revenue",
    "operating_income",
    "net_income",
    "total_assets",
    "equity",
    "cash_flow_operating",
    "cash_flow_investing",
    "cash_flow_financing",
    "operating_margin",
    "net_margin",
    "debt_to_equity",
    "equity_ratio",
    "operating_cf_to_investing_cf",
    "operating_cf_to_revenue",
    "revenue_growth",
    "operating_income_growth",
];

/// Mapping patch adding the `financials` object to a report index.
pub fn financials_mapping() -> Value {
    let properties: serde_json::Map<String, Value> = FINANCIAL_FIELDS
        .iter()
        .map(|field| (field.to_string(), json!({ "type": "double" })))
        .collect();
    json!({
        "properties": {
            "financials": {
                "type": "object",
                "properties": properties
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dart::financials::Financials;

    #[test]
    fn test_financial_fields_match_struct() {
        let value = serde_json::to_value(Financials::default()).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        let mut fields: Vec<_> = FINANCIAL_FIELDS.iter().map(|f| f.to_string()).collect();
        keys.sort();
        fields.sort();
        assert_eq!(keys, fields);
    }

    #[test]
    fn test_report_sections_are_nested() {
        let body = report_index_body();
        assert_eq!(body["mappings"]["properties"]["sections"]["type"], "nested");
        assert_eq!(body["mappings"]["properties"]["pub_date"]["format"], "yyyyMMdd");
        let sections = &body["mappings"]["properties"]["sections"]["properties"];
        assert_eq!(sections["sec_title"]["type"], "text");
        assert_eq!(sections["sec_content"]["analyzer"], "html_strip_analyzer");
    }

    #[test]
    fn test_guide_index_uses_nori() {
        let body = guide_index_body();
        assert_eq!(body["settings"]["number_of_shards"], 5);
        assert_eq!(body["settings"]["number_of_replicas"], 0);
        for analyzer in ["ko_nori", "default", "default_search"] {
            let analyzer = &body["settings"]["analysis"]["analyzer"][analyzer];
            assert_eq!(analyzer["tokenizer"], "nori_tokenizer");
            assert_eq!(analyzer["filter"], json!(["lowercase", "nori_part_of_speech"]));
        }
        for field in ["chap_name", "sec_name", "content"] {
            let mapping = &body["mappings"]["properties"][field];
            assert_eq!(mapping["analyzer"], "ko_nori");
            assert_eq!(mapping["search_analyzer"], "ko_nori");
        }
    }
}
