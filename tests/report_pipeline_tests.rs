use darter::ingest::reports::{ingest_reports, ReportStats};
use darter::search::InMemoryIndex;
use darter::utils::jsonl::JsonlWriter;
use darter::utils::progress::IngestProgress;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const SAMPLE: &str = "src/dart/parsing/tests/data/20240312000736.xml";

fn equity_filing(title: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <DOCUMENT><DOCUMENT-NAME ACODE=\"10001\">증권신고서(지분증권)</DOCUMENT-NAME>\
         <COMPANY-NAME AREGCIK=\"00164779\">에스케이하이닉스</COMPANY-NAME>\
         <BODY><SECTION-1><TITLE>{}</TITLE><P>모집 개요 & 일정</P></SECTION-1></BODY></DOCUMENT>",
        title
    )
}

fn write(path: &Path, contents: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn industry() -> HashMap<String, String> {
    HashMap::from([
        ("00126380".to_string(), "264".to_string()),
        ("00164779".to_string(), "261".to_string()),
    ])
}

#[tokio::test]
async fn test_ingest_report_tree() {
    let root = tempdir().unwrap();
    write(
        &root.path().join("사업/2024/20240312000736.xml"),
        &fs::read(SAMPLE).unwrap(),
    );
    write(
        &root.path().join("증권/20240102000001.xml"),
        equity_filing("제1부 모집 또는 매출에 관한 사항").as_bytes(),
    );
    write(
        &root.path().join("증권/20240103000002.XML"),
        equity_filing("증권발행조건확정").as_bytes(),
    );
    write(&root.path().join("반기/20240814000003.xml"), b"<DOCUMENT><P>open");
    write(&root.path().join("반기/readme.txt"), b"not a filing");

    let store = InMemoryIndex::new();
    let output_path = root.path().join("out/reports.jsonl");
    let mut output = JsonlWriter::create(&output_path).unwrap();

    let stats = ingest_reports(
        root.path(),
        &store,
        &industry(),
        Some(&mut output),
        &IngestProgress::hidden(),
    )
    .await
    .unwrap();
    assert_eq!(output.finish().unwrap(), 2);

    assert_eq!(stats.files, 4);
    assert_eq!(stats.parsed, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.parse_failed, 1);
    assert_eq!(stats.indexed, 2);
    assert_eq!(stats.index_failed, 0);
    assert_eq!(
        stats.per_folder,
        BTreeMap::from([("사업".to_string(), 1), ("증권".to_string(), 1)])
    );

    for index in ["rpt_qt", "rpt_half", "rpt_biz", "rpt_sec_eq", "rpt_other"] {
        assert!(store.settings(index).is_some(), "{} not created", index);
    }

    let business = store.document("rpt_biz", "20240312000736").unwrap();
    assert_eq!(business["corp_name"], "삼성전자");
    assert_eq!(business["induty_code"], "264");
    assert_eq!(business["pub_date"], "20240312");
    assert_eq!(business["sections"].as_array().unwrap().len(), 4);

    let equity = store.document("rpt_sec_eq", "20240102000001").unwrap();
    assert_eq!(equity["sections"][0]["sec_content"], "모집 개요 & 일정");
    assert!(store.document("rpt_sec_eq", "20240103000002").is_none());

    let lines: Vec<serde_json::Value> = fs::read_to_string(&output_path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["doc_id"], "20240312000736");
}

#[tokio::test]
async fn test_failed_writes_are_counted() {
    let root = tempdir().unwrap();
    for i in 0..35 {
        write(
            &root.path().join(format!("증권/202401020000{:02}.xml", i)),
            equity_filing("모집 개요").as_bytes(),
        );
    }
    let store = InMemoryIndex::rejecting(["20240102000007", "20240102000031"]);

    let stats = ingest_reports(root.path(), &store, &industry(), None, &IngestProgress::hidden())
        .await
        .unwrap();

    assert_eq!(stats.files, 35);
    assert_eq!(stats.indexed, 33);
    assert_eq!(stats.index_failed, 2);
    assert_eq!(store.document_count("rpt_sec_eq"), 33);
}

#[tokio::test]
async fn test_legacy_encoded_filing() {
    let root = tempdir().unwrap();
    let xml = equity_filing("제1부 모집 또는 매출에 관한 사항").replace("utf-8", "euc-kr");
    let (bytes, _, _) = encoding_rs::EUC_KR.encode(&xml);
    write(&root.path().join("증권/20240102000001.xml"), &bytes);

    let store = InMemoryIndex::new();
    let stats = ingest_reports(root.path(), &store, &industry(), None, &IngestProgress::hidden())
        .await
        .unwrap();

    assert_eq!(stats.indexed, 1);
    let doc = store.document("rpt_sec_eq", "20240102000001").unwrap();
    assert_eq!(doc["corp_name"], "에스케이하이닉스");
}

#[tokio::test]
async fn test_missing_root_is_an_error() {
    let root = tempdir().unwrap();
    let result = ingest_reports(
        &root.path().join("missing"),
        &InMemoryIndex::new(),
        &industry(),
        None,
        &IngestProgress::hidden(),
    )
    .await;
    assert!(result.is_err());

    let empty = ingest_reports(root.path(), &InMemoryIndex::new(), &industry(), None, &IngestProgress::hidden())
        .await
        .unwrap();
    assert_eq!(empty, ReportStats::default());
}
