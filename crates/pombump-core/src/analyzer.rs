//! Project analysis: how each dependency's version is expressed, property
//! fan-out, and BOM imports.

use crate::comments::MAX_FILE_SIZE;
use crate::error::Result;
use crate::model::{Dependency, Project};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// How one dependency's version is defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyInfo {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// Property name when the version is a `${name}` reference.
    pub property_name: Option<String>,
    /// Usage count of that property at the time this entry was built.
    pub property_usage_count: usize,
}

impl DependencyInfo {
    pub fn uses_property(&self) -> bool {
        self.property_name.is_some()
    }
}

/// An imported BOM: a dependency-management entry with scope=import, type=pom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomInfo {
    #[serde(rename = "groupId")]
    pub group_id: String,
    #[serde(rename = "artifactId")]
    pub artifact_id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty", rename = "type")]
    pub dep_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
}

/// Analysis of a single POM (optionally enriched with properties from
/// neighboring POM files).
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    /// Keyed by "groupId:artifactId".
    pub dependencies: BTreeMap<String, DependencyInfo>,
    /// Property name -> number of dependencies referencing it.
    pub property_usage_counts: BTreeMap<String, usize>,
    /// Resolved property table.
    pub properties: BTreeMap<String, String>,
    pub boms: Vec<BomInfo>,
}

impl AnalysisResult {
    /// Returns the property name to update when the dependency's version is
    /// property-based, `None` otherwise (or when the dependency is unknown).
    pub fn should_use_property(&self, group_id: &str, artifact_id: &str) -> Option<&str> {
        self.dependencies
            .get(&format!("{group_id}:{artifact_id}"))
            .and_then(|info| info.property_name.as_deref())
    }

    /// Every dependency whose version references `property_name`.
    pub fn get_affected_dependencies(&self, property_name: &str) -> Vec<&DependencyInfo> {
        self.dependencies
            .values()
            .filter(|info| info.property_name.as_deref() == Some(property_name))
            .collect()
    }

    /// Number of dependencies whose version is property-based.
    pub fn count_property_usage(&self) -> usize {
        self.dependencies
            .values()
            .filter(|info| info.uses_property())
            .count()
    }

    /// Human-readable analysis summary.
    pub fn analysis_report(&self) -> String {
        let mut report = String::new();
        report.push_str("POM Analysis Report\n===================\n\n");
        report.push_str(&format!("Total dependencies: {}\n", self.dependencies.len()));
        report.push_str(&format!(
            "Dependencies using properties: {}\n",
            self.count_property_usage()
        ));
        report.push_str(&format!(
            "Total properties defined: {}\n\n",
            self.properties.len()
        ));

        if !self.property_usage_counts.is_empty() || !self.properties.is_empty() {
            report.push_str("Property Usage:\n---------------\n");
            for (prop, count) in &self.property_usage_counts {
                match self.properties.get(prop) {
                    Some(value) if !value.is_empty() => report.push_str(&format!(
                        "  {prop} = {value} (used by {count} dependencies)\n"
                    )),
                    _ => report.push_str(&format!(
                        "  {prop} (used by {count} dependencies) - NOT DEFINED\n"
                    )),
                }
            }
            for (prop, value) in &self.properties {
                if !self.property_usage_counts.contains_key(prop) {
                    report.push_str(&format!("  {prop} = {value} (used by 0 dependencies)\n"));
                }
            }
            report.push('\n');
        }

        let with_props: Vec<_> = self
            .dependencies
            .values()
            .filter(|d| d.uses_property())
            .collect();
        if !with_props.is_empty() {
            report.push_str("Dependencies Using Properties:\n-------------------------------\n");
            for dep in with_props {
                report.push_str(&format!(
                    "  {}:{} -> ${{{}}}\n",
                    dep.group_id,
                    dep.artifact_id,
                    dep.property_name.as_deref().unwrap_or("")
                ));
            }
        }

        report
    }
}

/// Analyzes a parsed project: property table, per-dependency version
/// classification, BOM imports.
pub fn analyze_project(project: &Project) -> AnalysisResult {
    let mut result = AnalysisResult {
        properties: project.properties(),
        ..AnalysisResult::default()
    };

    for dep in project.dependencies() {
        analyze_dependency(&dep, &mut result);
    }

    for dep in project.managed_dependencies() {
        if is_bom_import(&dep) {
            debug!("found BOM import: {}:{}", dep.key(), dep.version);
            result.boms.push(BomInfo {
                group_id: dep.group_id,
                artifact_id: dep.artifact_id,
                version: dep.version,
                dep_type: dep.dep_type,
                scope: dep.scope,
            });
        } else {
            analyze_dependency(&dep, &mut result);
        }
    }

    info!(
        "analysis complete: {} dependencies, {} using properties, {} BOMs",
        result.dependencies.len(),
        result.count_property_usage(),
        result.boms.len()
    );

    result
}

/// Analyzes the POM at `pom_path` and merges properties found in other POM
/// files under the same project root (first found wins; the primary POM's
/// properties are never overwritten).
pub fn analyze_project_path(pom_path: &Path) -> Result<AnalysisResult> {
    let abs_path = std::path::absolute(pom_path)?;
    debug!("analyzing POM with property search: {}", abs_path.display());

    let project = Project::parse(&abs_path)?;
    let mut result = analyze_project(&project);

    let start_dir = abs_path.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let additional = search_for_properties(&start_dir, &abs_path);
    debug!("property search found {} additional properties", additional.len());

    for (name, value) in additional {
        if !result.properties.contains_key(&name) {
            info!("found property {} = {} in nearby POM", name, value);
            result.properties.insert(name, value);
        }
    }

    Ok(result)
}

/// Searches for where `property_name` is defined within the project tree.
/// Returns the defining file and the value, or `None` when the property is
/// not defined anywhere under the project root (it may still live in an
/// external parent POM).
pub fn find_property_location(start_dir: &Path, property_name: &str) -> Option<(PathBuf, String)> {
    let root = find_project_root(start_dir);
    let mut checked = 0usize;

    for entry in pom_candidates(&root) {
        let Some(project) = parse_candidate(entry.path()) else {
            continue;
        };
        checked += 1;
        if let Some(value) = project.properties().get(property_name) {
            info!(
                "found property {} = {} in {}",
                property_name,
                value,
                entry.path().display()
            );
            return Some((entry.path().to_path_buf(), value.clone()));
        }
    }

    warn!(
        "property '{}' not found after searching {} POM files in project",
        property_name, checked
    );
    None
}

fn analyze_dependency(dep: &Dependency, result: &mut AnalysisResult) {
    let mut info = DependencyInfo {
        group_id: dep.group_id.clone(),
        artifact_id: dep.artifact_id.clone(),
        version: dep.version.clone(),
        property_name: None,
        property_usage_count: 0,
    };

    if let Some(name) = property_reference(&dep.version) {
        let count = result
            .property_usage_counts
            .entry(name.to_string())
            .or_insert(0);
        *count += 1;
        info.property_usage_count = *count;
        info.property_name = Some(name.to_string());
        debug!(
            "dependency {} uses property {} (total usage: {})",
            dep.key(),
            name,
            info.property_usage_count
        );
    }

    result.dependencies.insert(dep.key(), info);
}

/// A version string that is a single `${name}` reference spanning the whole
/// string. Literals, partial interpolations and range expressions are not
/// property references.
fn property_reference(version: &str) -> Option<&str> {
    version.strip_prefix("${").and_then(|rest| rest.strip_suffix('}'))
}

fn is_bom_import(dep: &Dependency) -> bool {
    dep.scope == "import" && dep.dep_type == "pom"
}

/// Collects properties from every parseable POM under the project root,
/// first found wins, excluding the file being analyzed.
fn search_for_properties(start_dir: &Path, exclude: &Path) -> BTreeMap<String, String> {
    let root = find_project_root(start_dir);
    debug!("property search from project root: {}", root.display());

    let mut properties = BTreeMap::new();
    let mut checked = 0usize;

    for entry in pom_candidates(&root) {
        if std::path::absolute(entry.path()).is_ok_and(|p| p == exclude) {
            continue;
        }
        let Some(project) = parse_candidate(entry.path()) else {
            continue;
        };
        checked += 1;

        for (name, value) in project.properties() {
            properties.entry(name).or_insert(value);
        }
    }

    info!(
        "property search complete: checked {} POM files, found {} unique properties",
        checked,
        properties.len()
    );
    properties
}

/// Walks `root` yielding `*.xml` files, pruning hidden and build-output
/// directories.
fn pom_candidates(root: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_type().is_dir()
                    && is_skippable_directory(&e.file_name().to_string_lossy()))
        })
        .filter_map(std::result::Result::ok)
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
}

/// Attempts to parse a candidate file as a POM. Oversized files and files
/// that are some other kind of XML are skipped silently.
fn parse_candidate(path: &Path) -> Option<Project> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_FILE_SIZE => {
            debug!("skipping oversized candidate: {}", path.display());
            return None;
        }
        Ok(_) => {}
        Err(_) => return None,
    }
    match Project::parse(path) {
        Ok(project) => Some(project),
        Err(_) => {
            debug!("not a valid POM (skipping): {}", path.display());
            None
        }
    }
}

/// Finds the Maven project root: the topmost ancestor directory that still
/// contains a `pom.xml`.
fn find_project_root(start_dir: &Path) -> PathBuf {
    let mut current = start_dir.to_path_buf();
    let mut root = start_dir.to_path_buf();

    while let Some(parent) = current.parent() {
        if parent == current {
            break;
        }
        if parent.join("pom.xml").is_file() {
            root = parent.to_path_buf();
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    root
}

fn is_skippable_directory(name: &str) -> bool {
    name.starts_with('.')
        || name == "target"
        || name == "node_modules"
        || name == "build"
        || name == "dist"
        || name == "out"
}
