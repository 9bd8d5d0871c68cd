use crate::output::print_json;
use curator_core::validate;
use std::path::Path;

/// `curator validate` — run the full check battery and gate on the result.
/// Pure reads; safe to run against a tree someone has been editing by hand.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let report = validate::run_checks(root)?;

    if json {
        print_json(&report)?;
    } else {
        for check in &report.checks {
            let status = if check.passed { "ok" } else { "FAIL" };
            println!("[{status}] {:<28} {}", check.name, check.detail);
        }
        println!(
            "\n{} checks, {} failed",
            report.checks.len(),
            report.failed()
        );
    }

    if !report.ok() {
        anyhow::bail!("validation failed: {} check(s)", report.failed());
    }
    Ok(())
}
