use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Library crates under test; xtask itself has none worth running.
const PACKAGES: [&str; 2] = ["platform", "i2s-engine"];

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running tests...".cyan().bold());
    println!();

    let total_start = Instant::now();

    if !integration_only {
        // Once without a log backend, once with tracing so both macro arms compile.
        cargo_test("unit tests", &["--lib"], true)?;
        cargo_test(
            "unit tests (tracing)",
            &["--lib", "--features", "i2s-engine/tracing"],
            true,
        )?;
    }

    if !unit_only {
        // Scenarios, ordering, proptests and session tests live in tests/.
        cargo_test(
            "integration tests",
            &["--test", "*", "--features", "i2s-engine/std"],
            true,
        )?;
    }

    // Doc tests are informative only.
    cargo_test("doc tests", &["--doc", "--features", "i2s-engine/std"], false)?;

    println!(
        "{}",
        format!(
            "✓ All tests completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

fn cargo_test(label: &str, extra: &[&str], required: bool) -> Result<()> {
    println!("{}", format!("  Running {label}...").cyan());
    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("test");
    for package in PACKAGES {
        cmd.args(["-p", package]);
    }
    cmd.args(extra);

    let output = cmd
        .output()
        .with_context(|| format!("Failed to run {label}"))?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    if output.status.success() {
        println!(
            "{}",
            format!(
                "  ✓ {label} passed {} in {:.2}s",
                extract_test_summary(&stdout),
                start.elapsed().as_secs_f64()
            )
            .green()
        );
    } else if required {
        eprintln!("{}", format!("  ✗ {label} failed").red().bold());
        eprintln!();
        for line in stdout.lines() {
            eprintln!("  {line}");
        }
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        anyhow::bail!("{label} failed");
    } else {
        eprintln!("{}", format!("  ⚠ {label} failed").yellow().bold());
    }
    println!();
    Ok(())
}

/// Sum the per-binary "test result:" lines into one summary.
fn extract_test_summary(output: &str) -> String {
    let (mut passed, mut failed, mut binaries) = (0u32, 0u32, 0u32);
    for line in output.lines() {
        let Some(result) = line.split("test result:").nth(1) else {
            continue;
        };
        binaries = binaries.saturating_add(1);
        for part in result.split(';') {
            let mut words = part.split_whitespace().rev();
            let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                continue;
            };
            let Ok(count) = count.parse::<u32>() else {
                continue;
            };
            match kind {
                "passed" => passed = passed.saturating_add(count),
                "failed" => failed = failed.saturating_add(count),
                _ => {}
            }
        }
    }
    if binaries == 0 {
        return "(summary not available)".to_string();
    }
    format!("({passed} passed, {failed} failed across {binaries} binaries)")
}
