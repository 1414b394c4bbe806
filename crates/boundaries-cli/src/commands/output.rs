//! Rendering of check results.
//!
//! Text output groups violations by importing file and ends with a tally
//! per rule family. Compact output is one grep-friendly line per violation.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;
use boundaries_core::{LintResult, Severity, Violation};

use crate::OutputFormat;

/// Prints check results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(result),
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Compact => render_compact(result),
    };
    println!("{rendered}");
    Ok(())
}

fn paint(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
        Severity::Info => "\x1b[34minfo\x1b[0m",
    }
}

/// `import 'x', rule #2` style trailer; empty when nothing is known.
fn provenance(violation: &Violation) -> String {
    let parts: Vec<String> = [
        violation.dependency.as_ref().map(|d| format!("import '{d}'")),
        violation.rule_index.map(|i| format!("rule #{}", i + 1)),
        violation.doc_ref.as_ref().map(|r| format!("see {r}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn render_text(result: &LintResult) -> String {
    let mut by_file: BTreeMap<&Path, Vec<&Violation>> = BTreeMap::new();
    let mut by_family: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for violation in &result.violations {
        by_file
            .entry(violation.location.file.as_path())
            .or_default()
            .push(violation);
        *by_family
            .entry((violation.code.as_str(), violation.rule.as_str()))
            .or_default() += 1;
    }

    let mut out = String::new();
    for (file, violations) in &by_file {
        let _ = writeln!(out, "{}", file.display());
        for v in violations {
            let _ = writeln!(
                out,
                "  {}:{}  {}  {} {}  {}{}",
                v.location.line,
                v.location.column,
                paint(v.severity),
                v.code,
                v.rule,
                v.message,
                provenance(v)
            );
        }
        out.push('\n');
    }

    for ((code, rule), count) in &by_family {
        let _ = writeln!(out, "{code} {rule:<18} {count}");
    }

    let (errors, warnings, infos) = result.count_by_severity();
    let color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };
    let _ = write!(
        out,
        "{color}{errors} error(s), {warnings} warning(s), {infos} info(s) across {} file(s); \
         {} import(s) checked\x1b[0m",
        by_file.len(),
        result.dependencies_checked
    );
    out
}

fn render_compact(result: &LintResult) -> String {
    result
        .violations
        .iter()
        .map(|v| {
            let rule = v
                .rule_index
                .map_or_else(|| v.code.clone(), |i| format!("{}#{}", v.code, i + 1));
            format!(
                "{}:{}:{}: {} [{}] {}",
                v.location.file.display(),
                v.location.line,
                v.location.column,
                v.severity,
                rule,
                v.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundaries_core::Location;

    fn result() -> LintResult {
        let mut result = LintResult::new();
        result.violations = vec![
            Violation::new(
                "BND001",
                "element-types",
                Severity::Error,
                Location::new("helpers/a/index.js", 3, 1),
                "No rule allows this dependency",
            )
            .with_dependency("../../modules/b")
            .with_rule_index(Some(0)),
            Violation::new(
                "BND007",
                "no-unknown-files",
                Severity::Warning,
                Location::file("scripts/build.js"),
                "File is not of any known element type",
            ),
            Violation::new(
                "BND001",
                "element-types",
                Severity::Error,
                Location::new("helpers/a/index.js", 4, 1),
                "No rule allows this dependency",
            ),
        ];
        result.files_checked = 2;
        result.dependencies_checked = 5;
        result
    }

    #[test]
    fn text_groups_by_file_and_tallies_families() {
        let text = render_text(&result());
        let helpers = text.find("helpers/a/index.js\n").unwrap();
        let scripts = text.find("scripts/build.js\n").unwrap();
        assert!(helpers < scripts);
        assert_eq!(text.matches("helpers/a/index.js").count(), 1);
        assert!(text.contains("(import '../../modules/b', rule #1)"));
        assert!(text.contains("BND001 element-types      2"));
        assert!(text.contains("BND007 no-unknown-files   1"));
        assert!(text.contains("2 error(s), 1 warning(s), 0 info(s) across 2 file(s); 5 import(s)"));
    }

    #[test]
    fn compact_carries_rule_number() {
        let compact = render_compact(&result());
        let lines: Vec<_> = compact.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "helpers/a/index.js:3:1: error [BND001#1] No rule allows this dependency"
        );
        assert!(lines[1].contains("[BND007]"));
    }
}
