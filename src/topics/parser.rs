//! Two-stage topic parsing.
//!
//! Stage one looks for tagged `<top>` blocks. Only when that yields nothing
//! does stage two read the content as `id<whitespace>query` lines.

use std::sync::LazyLock;

use regex::Regex;

use super::Topic;

static TOP_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<top>(.*?)</top>").expect("valid regex"));

static NUM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<num>(?:\s*Number:)?\s*([^\s<]+)").expect("valid regex"));

static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title>\s*([^<]*)").expect("valid regex"));

static DESC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<desc>(?:\s*Description:)?\s*([^<]*)").expect("valid regex")
});

static NARR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<narr>(?:\s*Narrative:)?\s*([^<]*)").expect("valid regex")
});

/// Result of the tagged stage.
enum TaggedParse {
    Found(Vec<Topic>),
    NoBlocks,
}

/// Parse topics, trying tagged blocks first and falling back to lines.
pub fn parse_topics(content: &str) -> Vec<Topic> {
    match parse_tagged(content) {
        TaggedParse::Found(topics) => topics,
        TaggedParse::NoBlocks => parse_lines(content),
    }
}

fn parse_tagged(content: &str) -> TaggedParse {
    let topics: Vec<Topic> = TOP_BLOCK_REGEX
        .captures_iter(content)
        .filter_map(|caps| {
            let block = caps.get(1)?.as_str();
            let id = extract(&NUM_REGEX, block);
            if id.is_empty() {
                return None;
            }
            Some(Topic::new(
                id,
                extract(&TITLE_REGEX, block),
                extract(&DESC_REGEX, block),
                extract(&NARR_REGEX, block),
            ))
        })
        .collect();

    if topics.is_empty() {
        TaggedParse::NoBlocks
    } else {
        TaggedParse::Found(topics)
    }
}

fn parse_lines(content: &str) -> Vec<Topic> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let (id, query) = line.split_once(char::is_whitespace)?;
            Some(Topic::new(id, query, "", ""))
        })
        .collect()
}

fn extract(regex: &Regex, text: &str) -> String {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestCase, run_table_tests};

    const TAGGED: &str = "
<top>
<num> Number: 1
<title> cross-lingual information retrieval
<desc> Description:
Find documents about cross-lingual IR systems.
<narr> Narrative:
Relevant documents discuss CLIR methods.
</top>

<TOP>
<NUM> 2
<TITLE> neural reranking models
</TOP>
";

    #[test]
    fn parses_tagged_blocks_case_insensitively() {
        let topics = parse_topics(TAGGED);
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].id, "1");
        assert_eq!(topics[0].title, "cross-lingual information retrieval");
        assert_eq!(topics[0].desc, "Find documents about cross-lingual IR systems.");
        assert_eq!(topics[0].narr, "Relevant documents discuss CLIR methods.");
        assert_eq!(topics[1].id, "2");
        assert_eq!(topics[1].title, "neural reranking models");
        assert!(topics[1].desc.is_empty());
    }

    #[test]
    fn falls_back_to_line_format() -> Result<(), String> {
        let cases = vec![
            TestCase {
                name: "tab separated",
                input: "1\tcross-lingual information retrieval\n2\tneural reranking models\n",
                expected: vec![
                    ("1".to_string(), "cross-lingual information retrieval".to_string()),
                    ("2".to_string(), "neural reranking models".to_string()),
                ],
                should_panic: false,
            },
            TestCase {
                name: "space separated with blank lines",
                input: "\n301   dense retrieval methods  \n\n302 query\n",
                expected: vec![
                    ("301".to_string(), "dense retrieval methods".to_string()),
                    ("302".to_string(), "query".to_string()),
                ],
                should_panic: false,
            },
            TestCase {
                name: "id without text is dropped",
                input: "lonely\n7 kept\n",
                expected: vec![("7".to_string(), "kept".to_string())],
                should_panic: false,
            },
            TestCase {
                name: "empty content",
                input: "",
                expected: vec![],
                should_panic: false,
            },
        ];

        run_table_tests(cases, |input| {
            parse_topics(input)
                .into_iter()
                .map(|topic| (topic.id, topic.title))
                .collect::<Vec<_>>()
        })
    }

    #[test]
    fn block_without_num_is_dropped_and_does_not_trigger_fallback_when_others_exist() {
        let content = "<top><title> orphan </top>\n<top><num> 9 <title> kept </top>";
        let topics = parse_topics(content);
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0].id, "9");
        assert_eq!(topics[0].title, "kept");
    }
}
