//! Integration tests for resilient file loading and the append/rewrite helpers.

use faultline_jsonl::{append_jsonl, read_jsonl_resilient, write_jsonl_atomic_iter, SkipReason};
use rstest::rstest;
use serde::{Deserialize, Serialize};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct EventRow {
    node_name: String,
    cost: f64,
}

fn row(name: &str, cost: f64) -> EventRow {
    EventRow {
        node_name: name.to_string(),
        cost,
    }
}

fn file_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn reads_clean_file_without_warnings() {
    let file = file_with(
        "{\"node_name\":\"Power Grid\",\"cost\":100.0}\n{\"node_name\":\"Factory\",\"cost\":50.0}\n",
    );

    let (rows, warnings) = read_jsonl_resilient::<EventRow, _>(file.path()).await.unwrap();

    assert_eq!(rows, vec![row("Power Grid", 100.0), row("Factory", 50.0)]);
    assert!(warnings.is_empty());
}

#[rstest]
#[case::truncated_record("{\"node_name\":\"Power", 2)]
#[case::wrong_shape("{\"id\":7}", 2)]
#[case::plain_text("garbage", 2)]
#[tokio::test]
async fn bad_line_becomes_warning(#[case] bad_line: &str, #[case] expected_line: usize) {
    let contents = format!(
        "{{\"node_name\":\"A\",\"cost\":1.0}}\n{bad_line}\n{{\"node_name\":\"B\",\"cost\":2.0}}\n"
    );
    let file = file_with(&contents);

    let (rows, warnings) = read_jsonl_resilient::<EventRow, _>(file.path()).await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0].reason, SkipReason::MalformedJson(_)));
    assert_eq!(warnings[0].line_number, expected_line);
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = read_jsonl_resilient::<EventRow, _>(dir.path().join("absent.jsonl")).await;
    assert!(matches!(result, Err(faultline_jsonl::Error::Io(_))));
}

#[tokio::test]
async fn appended_records_follow_rewritten_ones() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("events.jsonl");

    write_jsonl_atomic_iter(&path, [row("A", 1.0)]).await.unwrap();
    append_jsonl(&path, [row("B", 2.0), row("C", 3.0)]).await.unwrap();

    let (rows, warnings) = read_jsonl_resilient::<EventRow, _>(&path).await.unwrap();
    assert!(warnings.is_empty());
    let names: Vec<_> = rows.iter().map(|r| r.node_name.as_str()).collect();
    assert_eq!(names, ["A", "B", "C"]);
}
