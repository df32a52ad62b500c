//! Fixture tests.
//!
//! Every .json file in the src/tests folder holds a list of cases: a raw strategy, exactly as the
//! analysis service would send it, and the SQL we expect to compile from it. Adding a case for a
//! new behavior is a matter of adding an entry, no rust needed.
use crate::engine::compiler::compile;
use crate::engine::strategy::QueryStrategy;
use serde::Deserialize;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Deserialize)]
struct Case {
    name: String,
    strategy: serde_json::Value,
    expected: String,
}

struct CaseResult {
    file: String,
    name: String,
    outcome: Result<(), CaseError>,
}

#[derive(Debug, Error)]
enum CaseError {
    #[error("Expected:\n  {expected}\nFound:\n  {found}")]
    DifferentOutput { expected: String, found: String },
    #[error("Strategy did not deserialize: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// The only #[test] in here, it runs every case from every file in src/tests.
#[test]
fn run_fixture_tests() {
    let results = run_all_fixtures();

    assert!(!results.is_empty(), "No fixtures found in src/tests");

    let failures: Vec<_> = results
        .iter()
        .filter(|result| result.outcome.is_err())
        .collect();

    for failure in &failures {
        eprintln!("{failure}");
    }

    assert!(failures.is_empty(), "{} fixture(s) failed", failures.len());
}

fn run_all_fixtures() -> Vec<CaseResult> {
    let fixtures_dir = Path::new("src/tests");
    let fixture_files = fs::read_dir(fixtures_dir).expect("Failed to read fixtures directory");

    let mut results = Vec::new();

    for file in fixture_files.flatten() {
        let file_path = file.path();
        if file_path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        let file_name = file_path.display().to_string();
        let contents = fs::read_to_string(&file_path).expect("Failed to read fixture file");
        let cases: Vec<Case> = serde_json::from_str(&contents)
            .unwrap_or_else(|error| panic!("{file_name} is not a valid fixture file: {error}"));

        for case in cases {
            results.push(CaseResult {
                file: file_name.clone(),
                outcome: run_case(&case),
                name: case.name,
            });
        }
    }

    results
}

fn run_case(case: &Case) -> Result<(), CaseError> {
    let strategy: QueryStrategy = serde_json::from_value(case.strategy.clone())?;
    let found = compile(&strategy);

    if found == case.expected {
        Ok(())
    } else {
        Err(CaseError::DifferentOutput {
            expected: case.expected.clone(),
            found,
        })
    }
}

impl Display for CaseResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            Ok(()) => write!(f, "ok: {} ({})", self.name, self.file),
            Err(error) => write!(f, "FAILED: {} ({})\n{error}", self.name, self.file),
        }
    }
}
