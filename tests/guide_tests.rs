use darter::ingest::guide::{ingest_guide, read_guide, GUIDE_INDEX};
use darter::search::InMemoryIndex;
use darter::utils::jsonl::JsonlWriter;
use std::fs;
use tempfile::tempdir;

const GUIDE_TEXT: &str = "투자위험요소 기재요령 안내서
1 사업위험
1-1 (경기변동) 경기 변동에 따른
수요 감소 위험
1-1-1. 주요 제품의 수요가
경기에 민감한 경우
- 3 -
1-1-2. 원재료 가격 변동
4
2 회사위험 2-1 (재무구조) 부채비율 2-1-1. 차입금 만기
";

#[tokio::test]
async fn test_ingest_guide() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("risk_guide.txt");
    fs::write(&path, GUIDE_TEXT).unwrap();
    let output_path = dir.path().join("guide.jsonl");
    let mut output = JsonlWriter::create(&output_path).unwrap();

    let store = InMemoryIndex::new();
    let stats = ingest_guide(&path, &store, Some(&mut output)).await.unwrap();
    output.finish().unwrap();

    assert_eq!(stats.entries, 5);
    assert_eq!(stats.indexed, 5);
    assert_eq!(stats.failed, 0);
    assert!(store.settings(GUIDE_INDEX).is_some());

    let article = store.document(GUIDE_INDEX, "1-1-1").unwrap();
    assert_eq!(article["chap_name"], "사업위험");
    assert_eq!(article["sec_name"], "경기변동");
    assert_eq!(article["content"], "주요 제품의 수요가 경기에 민감한 경우");

    let section = store.document(GUIDE_INDEX, "1-1-0").unwrap();
    assert_eq!(section["content"], "경기 변동에 따른 수요 감소 위험");
    assert_eq!(store.document(GUIDE_INDEX, "1-1-2").unwrap()["content"], "원재료 가격 변동");

    let last = store.document(GUIDE_INDEX, "2-1-1").unwrap();
    assert_eq!(last["chap_name"], "회사위험");
    assert_eq!(last["content"], "차입금 만기");

    assert_eq!(fs::read_to_string(&output_path).unwrap().lines().count(), 5);
}

#[tokio::test]
async fn test_failed_entries_are_counted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("risk_guide.txt");
    fs::write(&path, GUIDE_TEXT).unwrap();

    let store = InMemoryIndex::rejecting(["1-1-2"]);
    let stats = ingest_guide(&path, &store, None).await.unwrap();
    assert_eq!(stats.indexed, 4);
    assert_eq!(stats.failed, 1);
}

#[test]
fn test_missing_guide_is_an_error() {
    let dir = tempdir().unwrap();
    assert!(read_guide(&dir.path().join("missing.txt")).is_err());
}
