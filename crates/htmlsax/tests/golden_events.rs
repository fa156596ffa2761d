use htmlsax::ParserOptions;
use htmlsax_test_support::fixtures::load_fixture_dir;
use htmlsax_test_support::golden::{check_case, dump_events_json, run_whole};
use std::env;
use std::path::{Path, PathBuf};

struct FixtureFilter {
    raw: Option<String>,
}

impl FixtureFilter {
    fn matches(&self, name: &str) -> bool {
        let Some(filter) = &self.raw else {
            return true;
        };
        name.contains(filter)
    }
}

fn fixture_filter() -> FixtureFilter {
    FixtureFilter {
        raw: env::var("HTMLSAX_GOLDEN_FIXTURE").ok(),
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

#[test]
fn golden_events_whole_and_chunked() {
    let filter = fixture_filter();
    let mut fuzz_runs = env_u64("HTMLSAX_GOLDEN_FUZZ_RUNS", 4) as usize;
    if env::var("CI").is_ok() && fuzz_runs == 0 {
        fuzz_runs = 1;
    }
    let fuzz_seed = env_u64("HTMLSAX_GOLDEN_FUZZ_SEED", 0xC0FFEE);
    let dump = env::var("HTMLSAX_GOLDEN_DUMP").is_ok();

    let mut ran = 0usize;
    let mut failures = Vec::new();
    for (path, file) in load_fixture_dir(&fixture_root()) {
        for case in &file.cases {
            if !filter.matches(&case.name) {
                continue;
            }
            ran += 1;
            if let Err(report) = check_case(case, fuzz_runs, fuzz_seed) {
                let mut report = format!("{}: {report}", path.display());
                if dump {
                    let options = ParserOptions::from(&case.options);
                    report.push_str("\nevents:\n");
                    report.push_str(&dump_events_json(&case.input, &options));
                }
                failures.push(report);
            }
        }
    }
    assert!(ran > 0, "no fixtures matched filter");
    assert!(
        failures.is_empty(),
        "{} golden case(s) failed:\n\n{}",
        failures.len(),
        failures.join("\n\n")
    );
}

#[test]
fn fixture_names_are_unique() {
    let mut seen = std::collections::BTreeSet::new();
    for (path, file) in load_fixture_dir(&fixture_root()) {
        for case in &file.cases {
            assert!(
                seen.insert(case.name.clone()),
                "duplicate fixture name '{}' in {}",
                case.name,
                path.display()
            );
        }
    }
}

#[test]
fn every_case_ends_with_end_event() {
    for (_, file) in load_fixture_dir(&fixture_root()) {
        for case in &file.cases {
            let options = ParserOptions::from(&case.options);
            let lines = run_whole(&case.input, &options);
            let end = format!("end @{len}..={len}", len = case.input.len());
            assert_eq!(lines.last(), Some(&end), "case '{}'", case.name);
        }
    }
}
