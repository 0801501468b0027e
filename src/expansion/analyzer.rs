//! Text analyzers and the process-lifetime analyzer cache.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use unicode_normalization::UnicodeNormalization;

/// Maps raw text to normalized term tokens.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<String>;
}

/// Lucene's default English stop set.
static ENGLISH_STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
        "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
        "these", "they", "this", "to", "was", "will", "with",
    ]
    .into_iter()
    .collect()
});

/// NFKC-normalize, lowercase, split on non-alphanumeric characters.
///
/// CJK ideographs are emitted one character per token since those scripts
/// carry no whitespace word boundaries.
#[derive(Debug, Clone, Default)]
pub struct StandardAnalyzer {
    stop_words: Option<&'static HashSet<&'static str>>,
}

impl StandardAnalyzer {
    pub const fn new() -> Self {
        Self { stop_words: None }
    }

    pub fn english() -> Self {
        Self {
            stop_words: Some(&ENGLISH_STOP_WORDS),
        }
    }

    /// English codes get the English stop list; everything else none.
    pub fn for_language(language: &str) -> Self {
        match language.to_lowercase().as_str() {
            "en" | "eng" | "english" => Self::english(),
            _ => Self::new(),
        }
    }

    fn keep(&self, token: &str) -> bool {
        !token.is_empty() && self.stop_words.is_none_or(|stop| !stop.contains(token))
    }

    fn flush(&self, current: &mut String, tokens: &mut Vec<String>) {
        if self.keep(current) {
            tokens.push(std::mem::take(current));
        } else {
            current.clear();
        }
    }
}

impl Analyzer for StandardAnalyzer {
    fn analyze(&self, text: &str) -> Vec<String> {
        let normalized: String = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        let mut current = String::new();

        for c in normalized.chars() {
            if is_cjk(c) {
                self.flush(&mut current, &mut tokens);
                tokens.push(c.to_string());
            } else if c.is_alphanumeric() {
                current.push(c);
            } else {
                self.flush(&mut current, &mut tokens);
            }
        }
        self.flush(&mut current, &mut tokens);
        tokens
    }
}

fn is_cjk(c: char) -> bool {
    matches!(
        c,
        '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2A6DF}'
    )
}

/// Lowercase and split on whitespace only.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceAnalyzer;

impl Analyzer for WhitespaceAnalyzer {
    fn analyze(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_lowercase).collect()
    }
}

/// Analyzers keyed by language code, created on first use and never evicted.
///
/// Owned by the application context and passed to whoever needs an
/// analyzer, so tests can pre-seed it with fakes.
#[derive(Default)]
pub struct AnalyzerCache {
    analyzers: RwLock<HashMap<String, Arc<dyn Analyzer>>>,
}

impl AnalyzerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer for `language`, building a [`StandardAnalyzer`] on a miss.
    pub fn get(&self, language: &str) -> Arc<dyn Analyzer> {
        let key = language.to_lowercase();
        if let Some(analyzer) = self.analyzers.read().get(&key) {
            return Arc::clone(analyzer);
        }
        let mut analyzers = self.analyzers.write();
        Arc::clone(analyzers.entry(key).or_insert_with_key(|key| {
            tracing::debug!(language = %key, "initialized analyzer");
            let analyzer: Arc<dyn Analyzer> = Arc::new(StandardAnalyzer::for_language(key));
            analyzer
        }))
    }

    pub fn insert(&self, language: &str, analyzer: Arc<dyn Analyzer>) {
        self.analyzers.write().insert(language.to_lowercase(), analyzer);
    }

    pub fn len(&self) -> usize {
        self.analyzers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_lowercases_and_splits() {
        let tokens = StandardAnalyzer::new().analyze("Cross-Lingual IR, 2024 edition!");
        assert_eq!(tokens, vec!["cross", "lingual", "ir", "2024", "edition"]);
    }

    #[test]
    fn english_drops_stop_words() {
        let tokens = StandardAnalyzer::english().analyze("The quick brown fox is in the box");
        assert_eq!(tokens, vec!["quick", "brown", "fox", "box"]);
    }

    #[test]
    fn non_english_keeps_all_words() {
        let tokens = StandardAnalyzer::for_language("fas").analyze("the اطلاعات");
        assert_eq!(tokens, vec!["the", "اطلاعات"]);
    }

    #[test]
    fn nfkc_folds_compatibility_forms() {
        let tokens = StandardAnalyzer::new().analyze("ＡＢＣ ﬁle");
        assert_eq!(tokens, vec!["abc", "file"]);
    }

    #[test]
    fn cjk_is_split_per_character() {
        let tokens = StandardAnalyzer::new().analyze("信息检索 ir");
        assert_eq!(tokens, vec!["信", "息", "检", "索", "ir"]);
    }

    #[test]
    fn whitespace_analyzer() {
        assert_eq!(WhitespaceAnalyzer.analyze("A b-C"), vec!["a", "b-c"]);
    }

    #[test]
    fn cache_reuses_instances_and_accepts_overrides() {
        let cache = AnalyzerCache::new();
        let first = cache.get("EN");
        let second = cache.get("en");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.insert("zho", Arc::new(WhitespaceAnalyzer));
        assert_eq!(cache.get("zho").analyze("A B"), vec!["a", "b"]);
    }
}
