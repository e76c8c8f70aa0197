//! The `bump` command: apply patches to a POM and emit the result with
//! its comments intact.

use crate::cli::BumpArgs;
use crate::inputs::{parse_patches, parse_properties};
use anyhow::{Context, Result, bail};
use pombump_core::{Project, apply_patches, preserve_comments, validate_file_path};
use std::io::Write as _;
use tracing::info;

pub fn run(args: &BumpArgs) -> Result<()> {
    if args.dependencies.is_none()
        && args.properties.is_none()
        && args.patch_file.is_none()
        && args.properties_file.is_none()
    {
        bail!(
            "no dependencies or properties provided, use --dependencies/--patch-file or --properties/--properties-file"
        );
    }

    validate_file_path(&args.pom_file.to_string_lossy())?;

    let patches = parse_patches(args.patch_file.as_deref(), args.dependencies.as_deref())
        .context("failed to parse patches")?;
    let properties = parse_properties(
        args.properties_file.as_deref(),
        args.properties.as_deref(),
    )
    .context("failed to parse properties")?;

    let mut project = Project::parse(&args.pom_file)
        .with_context(|| format!("failed to parse {}", args.pom_file.display()))?;

    apply_patches(&mut project, &patches, &properties);

    let marshaled = project.marshal().context("failed to marshal the POM")?;
    let merged = preserve_comments(&args.pom_file, &marshaled)
        .context("failed to restore comments")?;

    if args.write {
        std::fs::write(&args.pom_file, &merged)
            .with_context(|| format!("failed to write {}", args.pom_file.display()))?;
        info!("wrote patched POM to {}", args.pom_file.display());
    } else {
        std::io::stdout().write_all(&merged)?;
    }
    Ok(())
}
