//! Terminal output helpers for validation results.

use colored::Colorize;
use twistplan::{IssueLevel, ValidationIssue, ValidationResult};

pub fn section(title: &str) {
    println!();
    println!("{}", title.bold().underline());
}

/// Print the issue list in ledger order, colored by severity.
pub fn print_issues(issues: &[ValidationIssue]) {
    if issues.is_empty() {
        println!("{} no issues", "✓".green());
        return;
    }
    for issue in issues {
        let level = match issue.level {
            IssueLevel::Error => format!("[{}]", issue.level).red().bold(),
            IssueLevel::Warn => format!("[{}]", issue.level).yellow(),
        };
        let location = if issue.path.is_empty() {
            String::new()
        } else {
            format!(" @ {}", issue.path)
        };
        println!(
            "{} {}{}: {}",
            level,
            issue.code.as_str().cyan(),
            location.dimmed(),
            issue.message
        );
    }
}

/// Print the pass/fail banner together with the issue counts. The flag
/// and the issue list always travel together: `ok` does not mean "no
/// warnings".
pub fn print_verdict(result: &ValidationResult) {
    let errors = result.errors().count();
    let warnings = result.warnings().count();
    if result.ok {
        println!(
            "{} plan passed validation ({} warning(s))",
            "✓".green().bold(),
            warnings
        );
    } else {
        println!(
            "{} plan failed validation ({} error(s), {} warning(s))",
            "✗".red().bold(),
            errors,
            warnings
        );
    }
}

pub fn kv(key: &str, value: &str) {
    println!("{}: {}", key.cyan(), value);
}
