//! Runs `scenarios/*.json` against the library: each scenario compiles a
//! model, generates one root with a fixed seed and checks JSON-pointer
//! expectations (or an expected error).
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use fixgen::{ModelSpec, Random};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    #[serde(default)]
    description: String,
    model: ModelSpec,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    expect: Vec<Expectation>,
    /// Substring of the expected error message.
    expect_error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Expectation {
    pointer: String,
    equals: Option<JsonValue>,
    matches: Option<String>,
    #[serde(default)]
    is_null: bool,
    len: Option<usize>,
}

static SCENARIO_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.json$").expect("scenario file regex"));

fn main() {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios"));
    let scenarios = match scenario_paths(&dir) {
        Ok(xs) => xs,
        Err(error) => {
            eprintln!("❌ failed to list {}: {error}", dir.display());
            std::process::exit(2);
        }
    };

    let mut failed = 0;
    for path in &scenarios {
        let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        match run_scenario(path) {
            Ok(()) => eprintln!("✅ {name}"),
            Err(problems) => {
                failed += 1;
                eprintln!("❌ {name}");
                for problem in problems {
                    eprintln!("    {problem}");
                }
            }
        }
    }
    eprintln!("—— {} scenarios, {failed} failed ——", scenarios.len());
    if failed > 0 {
        std::process::exit(1);
    }
}

fn scenario_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| SCENARIO_FILE.is_match(&p.to_string_lossy()))
        .collect::<Vec<_>>();
    paths.sort();
    Ok(paths)
}

fn run_scenario(path: &Path) -> Result<(), Vec<String>> {
    let bytes = std::fs::read(path).map_err(|e| vec![format!("read: {e}")])?;
    let scenario: Scenario = fixgen::path_de::from_slice_with_path(&bytes).map_err(|e| vec![e.to_string()])?;
    if !scenario.description.is_empty() {
        eprintln!("   {}", scenario.description);
    }

    let generated = scenario
        .model
        .compile()
        .and_then(|fixture| fixture.generate(Random::new(scenario.seed)));

    match (generated, &scenario.expect_error) {
        (Ok(value), None) => check(&value.to_json(), &scenario.expect),
        (Ok(value), Some(expected)) => Err(vec![format!("expected error containing {expected:?}, got {}", value.to_json())]),
        (Err(error), Some(expected)) if error.to_string().contains(expected.as_str()) => Ok(()),
        (Err(error), _) => Err(vec![format!("unexpected error: {error}")]),
    }
}

fn check(root: &JsonValue, expectations: &[Expectation]) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();
    for e in expectations {
        let Some(actual) = root.pointer(&e.pointer) else {
            problems.push(format!("{}: missing", e.pointer));
            continue;
        };
        if let Some(expected) = &e.equals {
            if actual != expected {
                problems.push(format!("{}: expected {expected}, got {actual}", e.pointer));
            }
        }
        if let Some(pattern) = &e.matches {
            match (Regex::new(pattern), actual.as_str()) {
                (Ok(re), Some(s)) if re.is_match(s) => {}
                (Ok(_), _) => problems.push(format!("{}: {actual} does not match /{pattern}/", e.pointer)),
                (Err(error), _) => problems.push(format!("{}: bad pattern: {error}", e.pointer)),
            }
        }
        if e.is_null && !actual.is_null() {
            problems.push(format!("{}: expected null, got {actual}", e.pointer));
        }
        if let Some(len) = e.len {
            let actual_len = match actual {
                JsonValue::Array(xs) => Some(xs.len()),
                JsonValue::Object(m) => Some(m.len()),
                JsonValue::String(s) => Some(s.chars().count()),
                _ => None,
            };
            if actual_len != Some(len) {
                problems.push(format!("{}: expected length {len}, got {actual}", e.pointer));
            }
        }
    }
    if problems.is_empty() { Ok(()) } else { Err(problems) }
}
