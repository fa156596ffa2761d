//! Golden event fixtures stored as TOML.
//!
//! A fixture file holds any number of `[[case]]` tables:
//!
//! ```toml
//! [[case]]
//! name = "implied paragraph close"
//! input = "<p>a<div>"
//! options = { xml_mode = false }
//! expected = ['open_tag_name "p" @0..=2', "..."]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FixtureOptions {
    #[serde(default)]
    pub xml_mode: bool,
    pub decode_entities: Option<bool>,
    pub lower_case_tags: Option<bool>,
    pub lower_case_attribute_names: Option<bool>,
    pub recognize_cdata: Option<bool>,
    pub recognize_self_closing: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoldenCase {
    pub name: String,
    pub input: String,
    #[serde(default)]
    pub options: FixtureOptions,
    /// One formatted event per line, positions included.
    pub expected: Vec<String>,
    /// Also replay the input under chunk plans.
    #[serde(default = "default_true")]
    pub chunked: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoldenFile {
    #[serde(rename = "case")]
    pub cases: Vec<GoldenCase>,
}

fn default_true() -> bool {
    true
}

pub fn parse_fixture(content: &str, path: &Path) -> GoldenFile {
    let file: GoldenFile = toml::from_str(content)
        .unwrap_or_else(|err| panic!("invalid fixture file {path:?}: {err}"));
    assert!(!file.cases.is_empty(), "fixture file {path:?} has no cases");
    for case in &file.cases {
        assert!(
            !case.expected.is_empty(),
            "fixture case '{}' in {path:?} has no expected events",
            case.name
        );
    }
    file
}

/// Load every `*.toml` fixture under `dir`, sorted by path.
pub fn load_fixture_dir(dir: &Path) -> Vec<(PathBuf, GoldenFile)> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read fixture dir {dir:?}: {err}"));
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures found in {dir:?}");
    paths
        .into_iter()
        .map(|path| {
            let content = fs::read_to_string(&path)
                .unwrap_or_else(|err| panic!("failed to read fixture {path:?}: {err}"));
            let file = parse_fixture(&content, &path);
            (path, file)
        })
        .collect()
}
