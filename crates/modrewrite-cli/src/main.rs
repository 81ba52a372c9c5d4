//! modrewrite CLI - rewrite generated module descriptors
//!
//! Subcommands:
//! - rewrite: Apply module-rewrite.conf rules to module.json descriptors
//! - rules: Show the rules loaded for a project
//! - scaffold: Generate a project from bill-of-materials POMs

mod output;
mod process;
mod properties;
mod scaffold;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use modrewrite_rules::{load_files, load_project, LoadedConfig};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use output::{print_rules, unified_diff, DescriptorReport, Mode, OutputFormat, Outcome, Reporter};
use process::{collect_descriptor_paths, process_file, write_file, ProcessResult};
use properties::{parse_key_value, BuildProperties};
use scaffold::ProjectBuilder;

/// Environment variable holding the log filter
const LOG_ENV: &str = "MODREWRITE_LOG";

#[derive(Parser)]
#[command(name = "modrewrite")]
#[command(version)]
#[command(about = "Rewrite generated module descriptors using module-rewrite.conf rules")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Show verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Apply rewrite rules to module descriptors
    Rewrite(RewriteArgs),
    /// List the rules loaded for a project
    Rules(RulesArgs),
    /// Generate a project directory from BOM files
    Scaffold(ScaffoldArgs),
}

/// Where rules and build properties come from
#[derive(Args)]
struct ConfigArgs {
    /// Directory to start looking for module-rewrite.conf (default: current directory)
    #[arg(long, value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Load exactly these configuration files, in order, instead of searching
    #[arg(long = "config", value_name = "FILE")]
    configs: Vec<PathBuf>,

    /// TOML file with build properties for ${property} versions
    #[arg(long, value_name = "FILE")]
    properties: Option<PathBuf>,

    /// Build property override (can be specified multiple times)
    #[arg(long = "property", short = 'D', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    property: Vec<(String, String)>,
}

#[derive(Args)]
struct FormatArgs {
    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    format: String,

    /// Shorthand for --format json
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RewriteArgs {
    /// Descriptor files or directories containing module.json files
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Write rewritten descriptors back (default is to only report changes)
    #[arg(long)]
    fix: bool,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Args)]
struct RulesArgs {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(flatten)]
    format: FormatArgs,
}

#[derive(Args)]
struct ScaffoldArgs {
    /// Template for the generated project descriptor
    #[arg(long, value_name = "FILE")]
    template: PathBuf,

    /// Directory the project is created in
    #[arg(long, value_name = "DIR", default_value = "target")]
    target_dir: PathBuf,

    /// BOM dependency to leave out, as groupId:artifactId (can be repeated)
    #[arg(long, value_name = "GROUP:ARTIFACT")]
    skip: Vec<String>,

    /// Bill-of-materials POM files
    #[arg(required = true)]
    boms: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Rewrite(args) => run_rewrite(args, cli.verbose),
        Command::Rules(args) => run_rules(args),
        Command::Scaffold(args) => run_scaffold(args),
    }
}

fn output_format(args: &FormatArgs) -> Result<OutputFormat> {
    if args.json {
        return Ok(OutputFormat::Json);
    }
    OutputFormat::from_str(&args.format).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid output format '{}'. Valid options: text, json, diff",
            args.format
        )
    })
}

/// Load build properties and every configuration file for the run
fn load_config(args: &ConfigArgs) -> Result<LoadedConfig> {
    let mut properties = match &args.properties {
        Some(path) => BuildProperties::load_path(path)?,
        None => BuildProperties::default(),
    };
    properties.extend(args.property.iter().cloned());

    if !args.configs.is_empty() {
        return load_files(&args.configs, &properties).context("Failed to load module rewrite configuration");
    }

    let project_dir = match &args.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    load_project(&project_dir, &properties)
        .with_context(|| format!("Failed to load module rewrite configuration for {}", project_dir.display()))
}

fn run_rewrite(args: RewriteArgs, verbose: bool) -> Result<ExitCode> {
    let output_format = output_format(&args.format)?;
    let mode = if args.fix { Mode::Fix } else { Mode::Check };
    let loaded = load_config(&args.config)?;

    if verbose && output_format == OutputFormat::Text {
        for source in &loaded.sources {
            println!("{}: {}", "Using config".bold(), source.display());
        }
        println!();
    }

    let rewriter = loaded.into_rewriter();
    let (file_paths, missing_paths) = collect_descriptor_paths(&args.paths);

    for path in &missing_paths {
        eprintln!("{}: Path does not exist: {}", "Warning".yellow(), path.display());
    }

    // Rules are read-only from here on, so descriptors can be rewritten in parallel
    let results: Vec<Result<ProcessResult>> = file_paths
        .par_iter()
        .map(|path| process_file(path, &rewriter))
        .collect();

    let mut reporter = Reporter::new(output_format, mode, verbose);
    for (path, result) in file_paths.iter().zip(results) {
        let diff = match &result {
            Ok(ProcessResult {
                old_source,
                new_source: Some(new_source),
                ..
            }) if output_format == OutputFormat::Diff => Some(unified_diff(path, old_source, new_source)),
            _ => None,
        };
        reporter.record(settle(path, result, mode), diff.as_deref());
    }

    let summary = reporter.summary();
    let exit_code = if summary.failed > 0 {
        ExitCode::from(1)
    } else if mode == Mode::Check && summary.rewritten > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish()?;
    Ok(exit_code)
}

fn run_rules(args: RulesArgs) -> Result<ExitCode> {
    let output_format = output_format(&args.format)?;
    let loaded = load_config(&args.config)?;
    print_rules(&loaded, output_format)?;
    Ok(ExitCode::SUCCESS)
}

fn run_scaffold(args: ScaffoldArgs) -> Result<ExitCode> {
    let builder = ProjectBuilder::new(args.template, args.target_dir, args.skip);
    let project_dir = builder.generate(&args.boms)?;
    println!("{}: {}", "Generated".green(), project_dir.display());
    Ok(ExitCode::SUCCESS)
}

/// Turn a processed descriptor into its report, writing it back in fix mode
fn settle(path: &Path, result: Result<ProcessResult>, mode: Mode) -> DescriptorReport {
    let processed = match result {
        Ok(processed) => processed,
        Err(e) => return DescriptorReport::failed(path, format!("{:#}", e)),
    };
    let Some(new_source) = processed.new_source else {
        return DescriptorReport::new(&processed.module, path, Outcome::Unchanged);
    };

    let written = mode == Mode::Fix;
    if written {
        if let Err(e) = write_file(path, &new_source) {
            return DescriptorReport::failed(path, format!("{:#}", e));
        }
    }
    DescriptorReport::new(
        &processed.module,
        path,
        Outcome::Rewritten {
            changes: processed.changes,
            written,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rewrite_args() {
        let cli = Cli::try_parse_from([
            "modrewrite",
            "rewrite",
            "modules",
            "--fix",
            "-D",
            "version.lib=1.0",
            "--config",
            "a.conf",
        ])
        .unwrap();

        match cli.command {
            Command::Rewrite(args) => {
                assert!(args.fix);
                assert_eq!(args.paths, vec![PathBuf::from("modules")]);
                assert_eq!(
                    args.config.property,
                    vec![("version.lib".to_string(), "1.0".to_string())]
                );
                assert_eq!(args.config.configs, vec![PathBuf::from("a.conf")]);
            }
            _ => panic!("expected rewrite command"),
        }
    }

    #[test]
    fn test_load_config_from_explicit_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let conf = temp.path().join("module-rewrite.conf");
        std::fs::write(&conf, "module:foo\nforce-artifact-version:g:a=${v}\n").unwrap();

        let args = ConfigArgs {
            project_dir: None,
            configs: vec![conf],
            properties: None,
            property: vec![("v".to_string(), "2.0".to_string())],
        };
        let loaded = load_config(&args).unwrap();

        assert_eq!(loaded.store.rule_count(), 1);
    }

    #[test]
    fn test_load_config_missing_property() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("module-rewrite.conf"),
            "module:foo\nforce-artifact-version:g:a=${v}\n",
        )
        .unwrap();

        let args = ConfigArgs {
            project_dir: Some(temp.path().to_path_buf()),
            configs: vec![],
            properties: None,
            property: vec![],
        };
        let err = load_config(&args).unwrap_err();

        assert!(format!("{:#}", err).contains("Missing build property 'v'"));
    }

    fn rewrite_descriptor(temp: &tempfile::TempDir, mode: Mode) -> (PathBuf, DescriptorReport) {
        let path = temp.path().join("module.json");
        std::fs::write(&path, r#"{"name":"foo","dependencies":[{"name":"bar"}]}"#).unwrap();

        let mut loader = modrewrite_rules::ConfigLoader::new(&modrewrite_core::NoProperties);
        loader
            .load_str(Path::new("module-rewrite.conf"), "module:foo\noptional:bar\n")
            .unwrap();
        let rewriter = loader.finish().into_rewriter();

        let report = settle(&path, process_file(&path, &rewriter), mode);
        (path, report)
    }

    #[test]
    fn test_settle_check_mode_leaves_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let (path, report) = rewrite_descriptor(&temp, Mode::Check);

        assert_eq!(report.module.as_deref(), Some("foo:main"));
        assert!(matches!(report.outcome, Outcome::Rewritten { written: false, .. }));
        assert!(!std::fs::read_to_string(&path).unwrap().contains("optional"));
    }

    #[test]
    fn test_settle_fix_mode_writes_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let (path, report) = rewrite_descriptor(&temp, Mode::Fix);

        match report.outcome {
            Outcome::Rewritten { changes, written } => {
                assert!(written);
                assert_eq!(changes[0].rule, "optional");
            }
            other => panic!("expected rewritten descriptor, got {:?}", other),
        }
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"optional\": true"));
    }

    #[test]
    fn test_settle_unreadable_descriptor() {
        let report = settle(
            Path::new("missing/module.json"),
            Err(anyhow::anyhow!("Failed to read file")),
            Mode::Fix,
        );

        assert!(report.module.is_none());
        assert!(matches!(report.outcome, Outcome::Failed { .. }));
    }
}
