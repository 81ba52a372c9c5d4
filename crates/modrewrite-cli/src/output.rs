//! Output formatting for modrewrite
//!
//! Supports text (colored terminal), JSON and unified diff output.

use colored::*;
use modrewrite_rules::{Change, LoadedConfig, ParseWarning};
use serde::Serialize;
use similar::TextDiff;
use std::collections::BTreeMap;
use std::path::Path;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Diff,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "diff" => Some(OutputFormat::Diff),
            _ => None,
        }
    }
}

/// Whether rewritten descriptors are written back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Check,
    Fix,
}

/// What happened to one descriptor
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Unchanged,
    Rewritten { changes: Vec<Change>, written: bool },
    Failed { error: String },
}

/// One descriptor, keyed by the module it declares
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorReport {
    /// `name:slot`, absent when the descriptor could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    pub path: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl DescriptorReport {
    pub fn new(module: impl ToString, path: &Path, outcome: Outcome) -> Self {
        Self {
            module: Some(module.to_string()),
            path: path.display().to_string(),
            outcome,
        }
    }

    pub fn failed(path: &Path, error: String) -> Self {
        Self {
            module: None,
            path: path.display().to_string(),
            outcome: Outcome::Failed { error },
        }
    }

    fn label(&self) -> String {
        match &self.module {
            Some(module) => format!("{} ({})", module, self.path),
            None => self.path.clone(),
        }
    }
}

/// Totals over a run, with changes counted per rule kind
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub descriptors: usize,
    pub rewritten: usize,
    pub failed: usize,
    pub changes_by_rule: BTreeMap<&'static str, usize>,
}

impl Summary {
    fn add(&mut self, outcome: &Outcome) {
        self.descriptors += 1;
        match outcome {
            Outcome::Unchanged => {}
            Outcome::Rewritten { changes, .. } => {
                self.rewritten += 1;
                for change in changes {
                    *self.changes_by_rule.entry(change.rule).or_default() += 1;
                }
            }
            Outcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total_changes(&self) -> usize {
        self.changes_by_rule.values().sum()
    }
}

#[derive(Debug, Serialize)]
struct RewriteOutput<'a> {
    version: &'static str,
    mode: Mode,
    summary: &'a Summary,
    descriptors: &'a [DescriptorReport],
}

/// Collects descriptor reports and prints them in the chosen format
pub struct Reporter {
    format: OutputFormat,
    mode: Mode,
    verbose: bool,
    reports: Vec<DescriptorReport>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, mode: Mode, verbose: bool) -> Self {
        Self {
            format,
            mode,
            verbose,
            reports: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Record a descriptor; `diff` is printed in diff format
    pub fn record(&mut self, report: DescriptorReport, diff: Option<&str>) {
        self.summary.add(&report.outcome);

        match (&report.outcome, self.format) {
            (Outcome::Failed { error }, OutputFormat::Text | OutputFormat::Diff) => {
                eprintln!("{}: {}: {}", "Error".red(), report.path, error);
            }
            (Outcome::Unchanged, OutputFormat::Text) if self.verbose => {
                println!("{} {}", report.label(), "unchanged".dimmed());
            }
            (Outcome::Rewritten { changes, written }, OutputFormat::Text) => {
                let status = if *written { "rewritten" } else { "needs rewriting" };
                println!("{} {}", report.label().bold(), status.yellow());
                for change in changes {
                    println!("  {:<24} {}", change.rule.cyan(), change.message);
                }
            }
            (Outcome::Rewritten { .. }, OutputFormat::Diff) => {
                if let Some(diff) = diff {
                    print!("{}", diff);
                }
            }
            _ => {}
        }

        self.reports.push(report);
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn finish(self) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                let output = RewriteOutput {
                    version: env!("CARGO_PKG_VERSION"),
                    mode: self.mode,
                    summary: &self.summary,
                    descriptors: &self.reports,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => self.print_summary(),
            OutputFormat::Diff => {}
        }
        Ok(())
    }

    fn print_summary(&self) {
        let summary = &self.summary;
        let verb = match self.mode {
            Mode::Check => "need rewriting",
            Mode::Fix => "rewritten",
        };
        println!();
        println!(
            "{} of {} descriptor(s) {}, {} change(s)",
            summary.rewritten,
            summary.descriptors,
            verb,
            summary.total_changes()
        );
        for (rule, count) in &summary.changes_by_rule {
            println!("  {:<24} {}", rule, count);
        }
        if summary.failed > 0 {
            println!("{}", format!("{} descriptor(s) could not be processed", summary.failed).red());
        }
        if self.mode == Mode::Check && summary.rewritten > 0 {
            println!("{}", "Pass --fix to write the rewritten descriptors".yellow());
        }
    }
}

/// `diff -u` style text between two renderings of a descriptor
pub fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let old_name = format!("a/{}", path.display());
    let new_name = format!("b/{}", path.display());
    let diff = TextDiff::from_lines(old, new);
    let text = diff
        .unified_diff()
        .context_radius(3)
        .header(&old_name, &new_name)
        .to_string();
    text
}

/// One module's rules, for `modrewrite rules --format json`
#[derive(Debug, Serialize)]
struct RuleSetOutput {
    module: String,
    rules: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RulesOutput<'a> {
    version: String,
    sources: Vec<String>,
    modules: Vec<RuleSetOutput>,
    warnings: &'a [ParseWarning],
}

/// Print the merged rule store
pub fn print_rules(loaded: &LoadedConfig, format: OutputFormat) -> anyhow::Result<()> {
    let modules: Vec<RuleSetOutput> = loaded
        .store
        .identities()
        .into_iter()
        .filter_map(|id| {
            loaded.store.get(id).map(|set| RuleSetOutput {
                module: id.to_string(),
                rules: set.iter().map(|rule| rule.to_string()).collect(),
            })
        })
        .collect();

    if format == OutputFormat::Json {
        let output = RulesOutput {
            version: env!("CARGO_PKG_VERSION").to_string(),
            sources: loaded.sources.iter().map(|p| p.display().to_string()).collect(),
            modules,
            warnings: &loaded.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if loaded.sources.is_empty() {
        println!("{}", "No module-rewrite.conf found".yellow());
        return Ok(());
    }

    println!("{}", "Configuration files:".bold());
    for source in &loaded.sources {
        println!("  {}", source.display());
    }
    println!();

    for module in &modules {
        println!("{}", module.module.green());
        for rule in &module.rules {
            println!("  {}", rule);
        }
    }

    if !loaded.warnings.is_empty() {
        println!();
        println!(
            "{}",
            format!("{} line(s) skipped", loaded.warnings.len()).yellow()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(rule: &'static str, message: &str) -> Change {
        Change {
            rule,
            message: message.to_string(),
        }
    }

    fn rewritten(changes: Vec<Change>) -> Outcome {
        Outcome::Rewritten { changes, written: false }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("diff"), Some(OutputFormat::Diff));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_summary_counts_changes_per_rule() {
        let mut reporter = Reporter::new(OutputFormat::Json, Mode::Check, false);
        reporter.record(DescriptorReport::new("a:main", Path::new("a/module.json"), Outcome::Unchanged), None);
        reporter.record(
            DescriptorReport::new(
                "b:main",
                Path::new("b/module.json"),
                rewritten(vec![
                    change("optional", "Mark dependency bar:main optional"),
                    change("replace", "Replace dependency baz:main with qux:main"),
                    change("optional", "Mark dependency x:main optional"),
                ]),
            ),
            None,
        );
        reporter.record(DescriptorReport::failed(Path::new("c/module.json"), "bad json".to_string()), None);

        let summary = reporter.summary();
        assert_eq!(summary.descriptors, 3);
        assert_eq!(summary.rewritten, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.changes_by_rule.get("optional"), Some(&2));
        assert_eq!(summary.changes_by_rule.get("replace"), Some(&1));
        assert_eq!(summary.total_changes(), 3);
    }

    #[test]
    fn test_report_json_shape() {
        let report = DescriptorReport::new(
            "foo:main",
            Path::new("module.json"),
            Outcome::Rewritten {
                changes: vec![change("replace", "Replace dependency baz:main with qux:other")],
                written: true,
            },
        );
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["module"], "foo:main");
        assert_eq!(json["status"], "rewritten");
        assert_eq!(json["written"], true);
        assert_eq!(json["changes"][0]["rule"], "replace");

        let failed = serde_json::to_value(DescriptorReport::failed(Path::new("x.json"), "bad".to_string())).unwrap();
        assert!(failed.get("module").is_none());
        assert_eq!(failed["status"], "failed");
        assert_eq!(failed["error"], "bad");
    }

    #[test]
    fn test_unified_diff_headers() {
        let diff = unified_diff(Path::new("foo/module.json"), "a\nb\n", "a\nc\n");

        assert!(diff.contains("--- a/foo/module.json"));
        assert!(diff.contains("+++ b/foo/module.json"));
        assert!(diff.contains("-b"));
        assert!(diff.contains("+c"));
    }
}
