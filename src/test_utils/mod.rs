//! Shared test utilities: table-driven cases, on-disk fixtures and log capture.

pub mod fixtures;
pub mod logging;

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe, catch_unwind};
use std::time::Instant;

/// Table-driven test case structure.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
    pub should_panic: bool,
}

/// Run every case, then report all failures together.
///
/// Cases keep running after a failure so one broken row does not hide the
/// rest of the table.
pub fn run_table_tests<I, E, F>(cases: Vec<TestCase<I, E>>, test_fn: F) -> Result<(), String>
where
    I: Debug + Clone + RefUnwindSafe,
    E: Debug + PartialEq,
    F: Fn(I) -> E + UnwindSafe + RefUnwindSafe,
{
    let total = cases.len();
    let mut failures = Vec::new();

    for case in cases {
        let start = Instant::now();
        let result = catch_unwind(|| test_fn(case.input.clone()));
        let elapsed = start.elapsed();

        let failure = match (result, case.should_panic) {
            (Err(_), true) => None,
            (Ok(_), true) => Some("expected a panic".to_string()),
            (Err(_), false) => Some("panicked".to_string()),
            (Ok(actual), false) if actual == case.expected => None,
            (Ok(actual), false) => Some(format!(
                "expected {:?}, got {actual:?}",
                case.expected
            )),
        };

        match failure {
            None => println!("[CASE] ok   {} ({elapsed:?})", case.name),
            Some(reason) => {
                println!("[CASE] FAIL {} ({elapsed:?}): {reason}", case.name);
                failures.push(format!("'{}' with input {:?}: {reason}", case.name, case.input));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "{} of {total} cases failed:\n  {}",
            failures.len(),
            failures.join("\n  ")
        ))
    }
}
