//! The `analyze` command: inspect a POM, recommend a patch plan, and
//! optionally emit patch files for a later `bump`.

use crate::cli::{AnalyzeArgs, OutputFormat};
use crate::inputs::parse_patches;
use anyhow::{Context, Result};
use pombump_core::{
    AnalysisOutput, AnalysisResult, Patch, PatchList, PatchPlan, Project, PropertyList,
    PropertyPatch, analyze_project, analyze_project_path, patch_strategy,
};
use std::collections::BTreeMap;
use std::path::Path;

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let analysis = if args.search_properties {
        analyze_project_path(&args.pom_file)
            .with_context(|| format!("failed to analyze {}", args.pom_file.display()))?
    } else {
        let project = Project::parse(&args.pom_file)
            .with_context(|| format!("failed to parse {}", args.pom_file.display()))?;
        analyze_project(&project)
    };

    let plan = if args.patches.is_some() || args.patch_file.is_some() {
        let patches = parse_patches(args.patch_file.as_deref(), args.patches.as_deref())
            .context("failed to parse patches")?;
        Some(patch_strategy(&analysis, &patches))
    } else {
        None
    };

    render(&args.pom_file.to_string_lossy(), &analysis, plan.as_ref(), args.output)?;

    if let Some(plan) = &plan {
        if let Some(path) = &args.output_deps
            && !plan.direct_patches.is_empty()
        {
            write_deps_file(path, &plan.direct_patches)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "\nWrote {} patches to {}",
                plan.direct_patches.len(),
                path.display()
            );
        }
        if let Some(path) = &args.output_properties
            && !plan.property_patches.is_empty()
        {
            write_properties_file(path, &plan.property_patches)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Wrote {} properties to {}",
                plan.property_patches.len(),
                path.display()
            );
        }
    }
    Ok(())
}

fn render(
    pom_file: &str,
    analysis: &AnalysisResult,
    plan: Option<&PatchPlan>,
    format: OutputFormat,
) -> Result<()> {
    let output = AnalysisOutput::build(
        pom_file,
        analysis,
        plan.map(|p| p.direct_patches.clone()).unwrap_or_default(),
        plan.map(|p| p.property_patches.clone()).unwrap_or_default(),
        plan.map(|p| p.warnings.clone()).unwrap_or_default(),
    );

    match format {
        OutputFormat::Text => print!("{}", output.render_text()),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml_ng::to_string(&output)?);
        }
    }
    Ok(())
}

/// Merges the recommended patches into an existing patch file, keyed by
/// groupId:artifactId. A malformed existing file is replaced.
fn write_deps_file(path: &Path, patches: &[Patch]) -> Result<()> {
    let mut merged: BTreeMap<String, Patch> = BTreeMap::new();
    if let Ok(data) = std::fs::read_to_string(path)
        && let Ok(existing) = serde_yaml_ng::from_str::<PatchList>(&data)
    {
        for patch in existing.patches {
            merged.insert(patch.key(), patch);
        }
    }
    for patch in patches {
        merged.insert(patch.key(), patch.clone());
    }

    let list = PatchList {
        patches: merged.into_values().collect(),
    };
    std::fs::write(path, serde_yaml_ng::to_string(&list)?)?;
    Ok(())
}

/// Merges the recommended property updates into an existing properties
/// file, keyed by property name.
fn write_properties_file(path: &Path, properties: &BTreeMap<String, String>) -> Result<()> {
    let mut merged: BTreeMap<String, String> = BTreeMap::new();
    if let Ok(data) = std::fs::read_to_string(path)
        && let Ok(existing) = serde_yaml_ng::from_str::<PropertyList>(&data)
    {
        for entry in existing.properties {
            merged.insert(entry.property, entry.value);
        }
    }
    for (name, value) in properties {
        merged.insert(name.clone(), value.clone());
    }

    let list = PropertyList {
        properties: merged
            .into_iter()
            .map(|(property, value)| PropertyPatch { property, value })
            .collect(),
    };
    std::fs::write(path, serde_yaml_ng::to_string(&list)?)?;
    Ok(())
}
