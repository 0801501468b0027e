use std::path::PathBuf;

use rankfuse::test_utils::{TestCase, run_table_tests};
use rankfuse::topics::{TopicFormat, read_topics, topic_queries, write_topics};

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

#[test]
fn trec_topics_fixture_fields() {
    let topics = read_topics(&fixture_path("tests/fixtures/topics/trec.txt")).unwrap();
    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0].id, "401");
    assert_eq!(topics[0].title, "foreign minorities, Germany");
    assert!(topics[0].desc.ends_with("integration of foreign minorities in Germany?"));
    assert!(topics[0].narr.starts_with("A relevant document"));
    assert!(topics[1].narr.is_empty());
}

#[test]
fn query_text_by_field_selection() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "title only",
            input: (false, false),
            expected: "behavioral genetics".to_string(),
            should_panic: false,
        },
        TestCase {
            name: "title and desc",
            input: (true, false),
            expected: "behavioral genetics What is happening in the field of behavioral genetics?"
                .to_string(),
            should_panic: false,
        },
        TestCase {
            name: "missing narrative is skipped",
            input: (false, true),
            expected: "behavioral genetics".to_string(),
            should_panic: false,
        },
    ];

    let topics = read_topics(&fixture_path("tests/fixtures/topics/trec.txt")).unwrap();
    run_table_tests(cases, |(use_desc, use_narr)| {
        topic_queries(&topics, use_desc, use_narr)["402"].clone()
    })
}

#[test]
fn converted_topics_are_single_line_queries() {
    let topics = read_topics(&fixture_path("tests/fixtures/topics/trec.txt")).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("topics.tsv");
    write_topics(&topic_queries(&topics, false, false), &path, TopicFormat::Simple).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    insta::assert_snapshot!(written.replace('\t', " | "), @r"
    401 | foreign minorities, Germany
    402 | behavioral genetics
    ");
}
