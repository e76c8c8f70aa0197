//! Command-line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pombump")]
#[command(version)]
#[command(about = "Patch dependency and property versions in Maven POM files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply dependency and property patches to a POM file
    Bump(BumpArgs),
    /// Analyze a POM file to understand dependency structure
    ///
    /// Helps determine whether to use direct dependency patches or
    /// property updates, and whether a BOM update covers several
    /// requested patches at once.
    Analyze(AnalyzeArgs),
}

#[derive(clap::Args, Debug)]
pub struct BumpArgs {
    /// The pom.xml file to patch
    pub pom_file: PathBuf,

    /// Space-separated dependencies to update, each
    /// groupID@artifactID@version[@scope[@type]]
    #[arg(long)]
    pub dependencies: Option<String>,

    /// Space-separated properties to update, each property@value
    #[arg(long)]
    pub properties: Option<String>,

    /// YAML file to read dependency patches from
    #[arg(long, conflicts_with = "dependencies")]
    pub patch_file: Option<PathBuf>,

    /// YAML file to read property updates from
    #[arg(long, conflicts_with = "properties")]
    pub properties_file: Option<PathBuf>,

    /// Write the patched POM back to the file instead of stdout
    #[arg(long)]
    pub write: bool,
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// The pom.xml file to analyze
    pub pom_file: PathBuf,

    /// Space-separated patches to analyze, each
    /// groupID@artifactID@version[@scope[@type]]
    #[arg(long)]
    pub patches: Option<String>,

    /// YAML file containing patches to analyze
    #[arg(long, conflicts_with = "patches")]
    pub patch_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Write recommended dependency patches to this YAML file
    /// (merges with existing entries)
    #[arg(long)]
    pub output_deps: Option<PathBuf>,

    /// Write recommended property updates to this YAML file
    /// (merges with existing entries)
    #[arg(long)]
    pub output_properties: Option<PathBuf>,

    /// Search for property definitions in nearby POM files
    #[arg(long)]
    pub search_properties: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_args_parse() {
        let cli = Cli::parse_from([
            "pombump",
            "bump",
            "pom.xml",
            "--dependencies",
            "junit@junit@4.13.2",
        ]);
        let Command::Bump(args) = cli.command else {
            panic!("expected bump");
        };
        assert_eq!(args.pom_file, PathBuf::from("pom.xml"));
        assert_eq!(args.dependencies.as_deref(), Some("junit@junit@4.13.2"));
        assert!(!args.write);
    }

    #[test]
    fn test_bump_rejects_both_patch_sources() {
        let result = Cli::try_parse_from([
            "pombump",
            "bump",
            "pom.xml",
            "--dependencies",
            "a@b@1",
            "--patch-file",
            "patches.yaml",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::parse_from(["pombump", "analyze", "pom.xml"]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.output, OutputFormat::Text);
        assert!(!args.search_properties);
    }

    #[test]
    fn test_analyze_rejects_unknown_format() {
        let result =
            Cli::try_parse_from(["pombump", "analyze", "pom.xml", "--output", "toml"]);
        assert!(result.is_err());
    }
}
