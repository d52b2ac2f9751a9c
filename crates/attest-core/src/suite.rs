//! Test suite model and filesystem discovery.
//!
//! A suite is an ordered collection of script test cases. Suites come from
//! two places: direct filesystem discovery when the command line names a
//! path, and the configuration file's named suite definitions otherwise.
//! The resolver owns the choice between the two; this module owns the
//! mechanics.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::file_config::SuiteDefinition;

/// Filename suffix identifying a standalone script test.
pub const SCRIPT_SUFFIX: &str = ".t";

/// Default filename suffixes collected by directory discovery.
pub const DEFAULT_SUFFIXES: &[&str] = &["_test.sh", SCRIPT_SUFFIX];

/// A single runnable test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Display name, the path relative to the discovery root.
    pub name: String,
    /// Absolute path of the script.
    pub path: PathBuf,
    /// Groups this case belongs to.
    pub groups: Vec<String>,
}

/// An ordered collection of test cases to execute in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSuite {
    /// Suite name used in reports.
    pub name: String,
    /// Cases in execution order (before ordering policy is applied).
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    /// Number of cases in the suite.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether the suite contains no cases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// All group names occurring in the suite, sorted and deduplicated.
    #[must_use]
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tests
            .iter()
            .flat_map(|t| t.groups.iter().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// One entry of a suite manifest file.
#[derive(Debug, Deserialize)]
struct ManifestCase {
    /// Display name; defaults to the script path.
    name: Option<String>,
    /// Script path, relative to the manifest.
    path: PathBuf,
    /// Groups the case belongs to.
    #[serde(default)]
    groups: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(rename = "case", default)]
    cases: Vec<ManifestCase>,
}

/// Build a suite from a positional test path.
///
/// A directory is scanned recursively for files matching `suffixes`; a file
/// ending in [`SCRIPT_SUFFIX`] becomes a single-case suite; any other file
/// is loaded as a suite manifest.
///
/// # Errors
///
/// Returns [`Error::TestPathNotFound`] when the path does not exist, and
/// [`Error::Parse`] when a manifest cannot be loaded.
pub fn discover_path(path: &Path, suffixes: &[String]) -> Result<TestSuite> {
    if !path.exists() {
        return Err(Error::TestPathNotFound(path.to_path_buf()));
    }
    let absolute = path.canonicalize()?;

    if absolute.is_dir() {
        let tests = collect_directory(&absolute, &absolute, suffixes, &[], None)?;
        return Ok(TestSuite {
            name: display_name(&absolute, absolute.parent().unwrap_or(&absolute)),
            tests,
        });
    }

    let name = display_name(&absolute, absolute.parent().unwrap_or(&absolute));
    if is_script(&absolute) {
        return Ok(TestSuite {
            name: name.clone(),
            tests: vec![TestCase {
                name,
                path: absolute,
                groups: Vec::new(),
            }],
        });
    }

    load_manifest(&absolute)
}

/// Build a suite from the file configuration's named definitions.
///
/// `include` filters definitions by name when non-empty; `exclude` removes
/// names afterwards, so a name present in both lists is excluded. Paths in
/// definitions are interpreted relative to `base_dir`.
///
/// # Errors
///
/// Returns [`Error::TestPathNotFound`] when a definition names a file that
/// does not exist.
pub fn from_definitions(
    definitions: &[SuiteDefinition],
    include: &[String],
    exclude: &[String],
    suffixes: &[String],
    base_dir: &Path,
) -> Result<TestSuite> {
    let selected: Vec<&SuiteDefinition> = definitions
        .iter()
        .filter(|d| include.is_empty() || include.contains(&d.name))
        .filter(|d| !exclude.contains(&d.name))
        .collect();

    let mut tests = Vec::new();
    for definition in &selected {
        tests.extend(collect_definition(definition, suffixes, base_dir)?);
    }

    let name = match selected.as_slice() {
        [single] => single.name.clone(),
        _ => selected
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(","),
    };
    Ok(TestSuite { name, tests })
}

fn collect_definition(
    definition: &SuiteDefinition,
    suffixes: &[String],
    base_dir: &Path,
) -> Result<Vec<TestCase>> {
    let excluded: Vec<PathBuf> = definition
        .exclude
        .iter()
        .map(|p| base_dir.join(p))
        .collect();

    let mut tests = Vec::new();
    for selector in &definition.directories {
        let dir = base_dir.join(&selector.path);
        if !dir.is_dir() {
            continue;
        }
        let selector_suffixes = selector
            .suffix
            .as_ref()
            .map(|s| vec![s.clone()])
            .unwrap_or_else(|| suffixes.to_vec());
        let mut groups = Vec::new();
        if let Some(group) = &definition.group {
            groups.push(group.clone());
        }
        if let Some(group) = &selector.group {
            groups.push(group.clone());
        }
        tests.extend(collect_directory(
            &dir,
            base_dir,
            &selector_suffixes,
            &excluded,
            Some(&groups),
        )?);
    }

    for file in &definition.files {
        let path = base_dir.join(file);
        if !path.is_file() {
            return Err(Error::TestPathNotFound(path));
        }
        if is_excluded(&path, &excluded) {
            continue;
        }
        let mut groups = Vec::new();
        if let Some(group) = &definition.group {
            groups.push(group.clone());
        }
        tests.push(TestCase {
            name: display_name(&path, base_dir),
            path,
            groups,
        });
    }

    Ok(tests)
}

fn collect_directory(
    dir: &Path,
    base_dir: &Path,
    suffixes: &[String],
    excluded: &[PathBuf],
    groups: Option<&Vec<String>>,
) -> Result<Vec<TestCase>> {
    let mut tests = Vec::new();
    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        if !suffixes.iter().any(|s| file_name.ends_with(s.as_str())) {
            continue;
        }
        let path = entry.path().to_path_buf();
        if is_excluded(&path, excluded) {
            continue;
        }
        tests.push(TestCase {
            name: display_name(&path, base_dir),
            path,
            groups: groups.cloned().unwrap_or_default(),
        });
    }
    Ok(tests)
}

fn load_manifest(path: &Path) -> Result<TestSuite> {
    let content =
        fs::read_to_string(path).map_err(|e| Error::Parse(format!("{}: {e}", path.display())))?;
    let manifest: Manifest =
        toml::from_str(&content).map_err(|e| Error::Parse(format!("{}: {e}", path.display())))?;

    let manifest_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tests = Vec::new();
    for case in manifest.cases {
        let script = manifest_dir.join(&case.path);
        if !script.is_file() {
            return Err(Error::TestPathNotFound(script));
        }
        tests.push(TestCase {
            name: case
                .name
                .unwrap_or_else(|| case.path.display().to_string()),
            path: script,
            groups: case.groups,
        });
    }
    Ok(TestSuite {
        name: display_name(path, manifest_dir),
        tests,
    })
}

fn is_script(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(SCRIPT_SUFFIX))
        .unwrap_or(false)
}

fn is_excluded(path: &Path, excluded: &[PathBuf]) -> bool {
    excluded.iter().any(|e| path.starts_with(e))
}

fn display_name(path: &Path, base_dir: &Path) -> String {
    path.strip_prefix(base_dir)
        .unwrap_or(path)
        .display()
        .to_string()
}
