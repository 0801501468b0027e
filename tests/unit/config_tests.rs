use std::path::{Path, PathBuf};

use rankfuse::config::Config;
use rankfuse::expansion::ExpansionMethod;
use rankfuse::fusion::FusionMethod;
use rankfuse::test_utils::{TestCase, run_table_tests};
use rankfuse::topics::TopicFormat;

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn load(relative: &str) -> rankfuse::Result<Config> {
    let no_env = |_: &str| -> Option<String> { None };
    Config::load_with_env(Some(&fixture_path(relative)), Path::new("."), &no_env)
}

#[test]
fn config_sections_from_toml_fixture() {
    let config = load("tests/fixtures/configs/custom.toml").expect("load custom.toml");

    assert_eq!(
        config.fusion_method().unwrap(),
        FusionMethod::Linear {
            weights: Some(vec![0.7, 0.3])
        }
    );
    assert_eq!(config.fusion.top_k, 100);
    assert_eq!(config.fusion.rrf_k, 60.0);
    assert_eq!(config.expansion_method().unwrap(), ExpansionMethod::Prf);
    assert_eq!(config.expansion.fb_docs, 5);
    assert_eq!(config.expansion.fb_terms, 20);
    assert_eq!(config.expansion.language, "fas");
    assert!(config.topics.use_desc);
    assert!(!config.topics.use_narr);
    assert_eq!(config.output.runs_dir, PathBuf::from("/tmp/rankfuse-runs"));
    assert_eq!(config.topic_format().unwrap(), TopicFormat::Xml);
}

#[test]
fn config_fixtures_by_format() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "toml",
            input: "tests/fixtures/configs/custom.toml",
            expected: ("linear".to_string(), 0.5, 0.5, false),
            should_panic: false,
        },
        TestCase {
            name: "yaml",
            input: "tests/fixtures/configs/custom.yaml",
            expected: ("weighted".to_string(), 0.8, 0.6, true),
            should_panic: false,
        },
        TestCase {
            name: "out of range weight",
            input: "tests/fixtures/configs/invalid.toml",
            expected: (String::new(), 0.0, 0.0, false),
            should_panic: true,
        },
        TestCase {
            name: "missing file",
            input: "tests/fixtures/configs/absent.toml",
            expected: (String::new(), 0.0, 0.0, false),
            should_panic: true,
        },
    ];

    run_table_tests(cases, |relative_path| {
        let config = load(relative_path).expect("load config");
        (
            config.fusion.method,
            config.fusion.alpha,
            config.expansion.original_query_weight,
            config.topics.use_narr,
        )
    })
}

#[test]
fn env_overrides_win_over_files() {
    let env = |key: &str| match key {
        "RANKFUSE_FUSION_METHOD" => Some("combmnz".to_string()),
        "RANKFUSE_FB_TERMS" => Some("3".to_string()),
        _ => None,
    };
    let config = Config::load_with_env(
        Some(&fixture_path("tests/fixtures/configs/custom.toml")),
        Path::new("."),
        &env,
    )
    .unwrap();
    assert_eq!(config.fusion_method().unwrap(), FusionMethod::CombMnz);
    assert_eq!(config.expansion.fb_terms, 3);
    assert_eq!(config.expansion.fb_docs, 5);
}
