//! Terminal rendering for plans, apply results and diagnostics

use colored::Colorize;
use dokkuflow_resource::{ActionType, ApplyResult, Diagnostics, Plan, Severity};
use std::io::Write;

pub fn print_plan(plan: &Plan) {
    if !plan.has_changes {
        println!("{}", "No changes. The host matches the manifest.".green());
        return;
    }

    println!("{}", "Planned changes:".bold());
    for action in plan.changes() {
        let marker = match action.action_type {
            ActionType::Create => "+".green(),
            ActionType::Update => "~".yellow(),
            ActionType::Replace => "-/+".magenta(),
            ActionType::Delete => "-".red(),
            ActionType::NoOp => " ".normal(),
        };
        println!("  {} {}", marker, action.description());
    }
    println!();
    println!("Plan: {}", plan.summary());
}

pub fn print_apply_result(result: &ApplyResult) {
    for action in &result.succeeded {
        println!("  {} {}", "✓".green(), action.message);
    }
    for action in &result.failed {
        let error = action.error.as_deref().unwrap_or("failed");
        println!("  {} {}: {}", "✗".red(), action.key, error);
    }
    for key in &result.skipped {
        println!("  {} {} (skipped)", "-".dimmed(), key);
    }

    println!();
    let summary = format!(
        "{} succeeded, {} failed, {} skipped in {:.1}s",
        result.succeeded.len(),
        result.failed.len(),
        result.skipped.len(),
        result.duration_ms as f64 / 1000.0
    );
    if result.is_success() {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.red().bold());
    }
}

/// Print diagnostics to stderr; returns false if any is an error
pub fn print_diagnostics(diags: &Diagnostics) -> bool {
    for diag in diags.iter() {
        let label = match diag.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        let mut line = String::new();
        if let Some(resource) = &diag.resource {
            line.push_str(&format!("[{}] ", resource.cyan()));
        }
        if let Some(path) = &diag.path {
            line.push_str(&format!("{}: ", path));
        }
        line.push_str(&diag.summary);
        eprintln!("{}: {}", label, line);
        if !diag.detail.is_empty() {
            eprintln!("  {}", diag.detail.dimmed());
        }
    }
    !diags.has_errors()
}

/// Ask a yes/no question on stdin
pub fn confirm(question: &str) -> std::io::Result<bool> {
    print!("{} [y/N]: ", question);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y") || input.trim().eq_ignore_ascii_case("yes"))
}
