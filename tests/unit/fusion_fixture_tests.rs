use std::path::PathBuf;

use rankfuse::fusion::{FusionMethod, fuse, fused_run_label};
use rankfuse::run::{Run, load_run, read_run};

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn fixture_runs() -> Vec<Run> {
    ["tests/fixtures/runs/bm25.run", "tests/fixtures/runs/dense.run"]
        .iter()
        .map(|path| read_run(&fixture_path(path)).unwrap())
        .collect()
}

fn ranking(runs: &[Run], method: &FusionMethod) -> Vec<String> {
    fuse(runs, method).unwrap()["q1"]
        .iter()
        .map(|doc| doc.doc_id.clone())
        .collect()
}

#[test]
fn malformed_fixture_line_is_counted() {
    let parsed = load_run(&fixture_path("tests/fixtures/runs/dense.run")).unwrap();
    assert_eq!(parsed.lines_read, 4);
    assert_eq!(parsed.skipped_lines, 1);
    assert_eq!(parsed.value.entry_count(), 3);
}

#[test]
fn documents_in_both_runs_lead_under_rrf() {
    let ranked = ranking(&fixture_runs(), &FusionMethod::Rrf { k: 60.0 });
    assert_eq!(ranked.len(), 4);
    let mut top_two = ranked[..2].to_vec();
    top_two.sort();
    assert_eq!(top_two, vec!["d1", "d3"]);
}

#[test]
fn method_rankings_on_fixture_runs() {
    let runs = fixture_runs();
    // bm25 normalizes to d1=1, d2=0.5, d3=0; dense to d3=1, d1=0.5, d4=0.
    assert_eq!(ranking(&runs, &FusionMethod::CombSum), vec!["d1", "d3", "d2", "d4"]);
    assert_eq!(ranking(&runs, &FusionMethod::CombMnz), vec!["d1", "d3", "d2", "d4"]);
    assert_eq!(
        ranking(&runs, &FusionMethod::Weighted { alpha: 0.9 }),
        vec!["d1", "d2", "d3", "d4"]
    );
    assert_eq!(
        ranking(&runs, &FusionMethod::Weighted { alpha: 0.1 }),
        vec!["d3", "d1", "d2", "d4"]
    );
}

#[test]
fn fused_label_uses_input_stems() {
    let inputs = [
        fixture_path("tests/fixtures/runs/bm25.run"),
        fixture_path("tests/fixtures/runs/dense.run"),
    ];
    assert_eq!(
        fused_run_label(&inputs, &FusionMethod::Weighted { alpha: 0.9 }),
        "bm25_dense_hybrid_w0.90"
    );
}
