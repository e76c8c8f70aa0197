//! Structured analysis output shared by the text, JSON, and YAML renderers.

use crate::analyzer::{AnalysisResult, BomInfo};
use crate::patch::Patch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Complete result of analyzing a POM against a set of requested patches.
///
/// Serializes with the camelCase field names consumers of the JSON and
/// YAML outputs expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOutput {
    pub pom_file: String,
    pub timestamp: DateTime<Utc>,
    pub dependencies: DependencyAnalysis,
    pub properties: PropertyAnalysis,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boms: Vec<BomInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches: Vec<Patch>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub property_updates: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cannot_fix: Vec<UnfixableIssue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyAnalysis {
    pub total: usize,
    pub direct: usize,
    pub using_properties: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAnalysis {
    pub defined: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub used_by: BTreeMap<String, Vec<String>>,
}

/// A requested change that needs a human to resolve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnfixableIssue {
    pub dependency: String,
    pub reason: String,
    pub action: String,
}

impl AnalysisOutput {
    /// Assembles the output from an analysis plus the patch plan derived
    /// from it.
    pub fn build(
        pom_file: &str,
        result: &AnalysisResult,
        patches: Vec<Patch>,
        property_updates: BTreeMap<String, String>,
        warnings: Vec<String>,
    ) -> Self {
        let mut used_by: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut using_properties = 0;
        let mut direct = 0;
        for (key, dep) in &result.dependencies {
            if let Some(name) = &dep.property_name {
                using_properties += 1;
                used_by.entry(name.clone()).or_default().push(key.clone());
            } else {
                direct += 1;
            }
        }

        AnalysisOutput {
            pom_file: pom_file.to_string(),
            timestamp: Utc::now(),
            dependencies: DependencyAnalysis {
                total: result.dependencies.len(),
                direct,
                using_properties,
            },
            properties: PropertyAnalysis {
                defined: result.properties.clone(),
                used_by,
            },
            boms: result.boms.clone(),
            patches,
            property_updates,
            warnings,
            cannot_fix: Vec::new(),
        }
    }

    /// Human-readable rendering for terminal use.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "\nPOM Analysis: {}", self.pom_file);
        let _ = writeln!(
            out,
            "Timestamp: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "{}", "=".repeat(60));

        let _ = writeln!(out, "\nDependencies Summary:");
        let _ = writeln!(out, "  Total: {}", self.dependencies.total);
        let _ = writeln!(out, "  Direct: {}", self.dependencies.direct);
        let _ = writeln!(
            out,
            "  Using properties: {}",
            self.dependencies.using_properties
        );

        if !self.boms.is_empty() {
            let _ = writeln!(out, "\nImported BOMs:");
            for bom in &self.boms {
                let _ = writeln!(
                    out,
                    "  - {}:{}:{}",
                    bom.group_id, bom.artifact_id, bom.version
                );
            }
        }

        if !self.properties.defined.is_empty() {
            let _ = writeln!(out, "\nDefined Properties:");
            for (name, value) in &self.properties.defined {
                match self.properties.used_by.get(name) {
                    Some(deps) if !deps.is_empty() => {
                        let _ = writeln!(
                            out,
                            "  {name} = {value} (used by {} dependencies)",
                            deps.len()
                        );
                    }
                    _ => {
                        let _ = writeln!(out, "  {name} = {value}");
                    }
                }
            }
        }

        if !self.patches.is_empty() || !self.property_updates.is_empty() {
            let _ = writeln!(out, "\nRecommended Patches:");
            let _ = writeln!(out, "{}", "-".repeat(40));

            if !self.property_updates.is_empty() {
                let _ = writeln!(out, "\nProperty Updates:");
                for (name, value) in &self.property_updates {
                    match self.properties.defined.get(name) {
                        Some(current) if !current.is_empty() => {
                            let _ = writeln!(out, "  {name}: {current} -> {value}");
                        }
                        _ => {
                            let _ = writeln!(out, "  {name}: (new) -> {value}");
                        }
                    }
                    if let Some(deps) = self.properties.used_by.get(name)
                        && !deps.is_empty()
                    {
                        let _ = writeln!(out, "    Affects: {}", deps.join(", "));
                    }
                }
            }

            if !self.patches.is_empty() {
                let _ = writeln!(out, "\nDirect Dependency Updates:");
                for patch in &self.patches {
                    let _ = writeln!(
                        out,
                        "  {}:{} -> {}",
                        patch.group_id, patch.artifact_id, patch.version
                    );
                }
            }
        }

        if !self.warnings.is_empty() {
            let _ = writeln!(out, "\nWarnings:");
            for warning in &self.warnings {
                let _ = writeln!(out, "  ⚠ {warning}");
            }
        }

        if !self.cannot_fix.is_empty() {
            let _ = writeln!(out, "\nCannot Fix (Manual Intervention Required):");
            for issue in &self.cannot_fix {
                let _ = writeln!(out, "  ✗ {}", issue.dependency);
                let _ = writeln!(out, "    Reason: {}", issue.reason);
                let _ = writeln!(out, "    Action: {}", issue.action);
            }
        }

        let fixable = self.patches.len() + self.property_updates.len();
        let _ = writeln!(out, "\nSummary:");
        let _ = writeln!(out, "{}", "-".repeat(40));
        let _ = writeln!(out, "  Fixable issues: {fixable}");
        let _ = writeln!(out, "  Unfixable issues: {}", self.cannot_fix.len());

        if fixable > 0 {
            let mut hint = format!("\n  Run 'pombump {}", self.pom_file);
            if !self.property_updates.is_empty() {
                hint.push_str(" --properties-file <file>");
            }
            if !self.patches.is_empty() {
                hint.push_str(" --patch-file <file>");
            }
            hint.push_str("' to apply patches");
            let _ = writeln!(out, "{hint}");
        }

        out
    }
}
