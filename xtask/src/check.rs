use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Bare-metal target used to prove the library crates stay `no_std`.
const BARE_METAL_TARGET: &str = "thumbv7em-none-eabihf";

/// How a failing step is reported.
#[derive(Clone, Copy, PartialEq, Eq)]
enum OnFailure {
    /// Abort the task.
    Abort,
    /// Print a warning and carry on.
    Warn,
}

struct Step {
    label: &'static str,
    args: &'static [&'static str],
    on_failure: OnFailure,
}

const CHECK_STEPS: [Step; 5] = [
    Step {
        label: "platform (no_std, defmt)",
        args: &[
            "check",
            "-p",
            "platform",
            "--target",
            BARE_METAL_TARGET,
            "--features",
            "defmt",
        ],
        on_failure: OnFailure::Abort,
    },
    Step {
        label: "i2s-engine (no_std, defmt)",
        args: &[
            "check",
            "-p",
            "i2s-engine",
            "--target",
            BARE_METAL_TARGET,
            "--features",
            "defmt",
        ],
        on_failure: OnFailure::Abort,
    },
    Step {
        label: "i2s-engine (host, std + tracing)",
        args: &["check", "-p", "i2s-engine", "--features", "std,tracing"],
        on_failure: OnFailure::Abort,
    },
    Step {
        label: "clippy",
        args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        on_failure: OnFailure::Warn,
    },
    Step {
        label: "formatting",
        args: &["fmt", "--all", "--check"],
        on_failure: OnFailure::Warn,
    },
];

/// `cargo xtask check`: both library crates on the bare-metal target and the
/// host, then lints.
pub fn run() -> Result<()> {
    banner("🔍 Checking engine builds...");
    let total_start = Instant::now();

    for step in &CHECK_STEPS {
        cargo_step(step.label, step.args, step.on_failure)?;
    }

    finish("All checks", total_start);
    Ok(())
}

/// `cargo xtask doc`: API docs for both library crates, mocks included.
pub fn doc(open: bool) -> Result<()> {
    banner("📚 Building documentation...");
    let total_start = Instant::now();

    // `std` pulls in the platform mocks so their docs are rendered too.
    let mut args = vec![
        "doc",
        "-p",
        "platform",
        "-p",
        "i2s-engine",
        "--no-deps",
        "--features",
        "i2s-engine/std",
        "--document-private-items",
    ];
    if open {
        args.push("--open");
    }
    cargo_step("documentation", &args, OnFailure::Abort)?;

    if !open {
        println!(
            "   {}",
            "target/doc/i2s_engine/index.html, or 'cargo xtask doc --open'".dimmed()
        );
        println!();
    }

    finish("Documentation", total_start);
    Ok(())
}

fn banner(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
    println!();
}

fn finish(what: &str, start: Instant) {
    println!(
        "{}",
        format!("✓ {what} completed in {:.2}s", start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();
}

fn cargo_step(label: &str, args: &[&str], on_failure: OnFailure) -> Result<()> {
    println!("{}", format!("  Running {label}...").cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run {label}"))?;

    if output.status.success() {
        println!(
            "{}",
            format!("  ✓ {label} passed in {:.2}s", start.elapsed().as_secs_f64()).green()
        );
        println!();
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    match on_failure {
        OnFailure::Abort => {
            eprintln!("{}", format!("  ✗ {label} failed").red().bold());
            eprintln!();
            eprintln!("{stderr}");
            anyhow::bail!("{label} failed");
        }
        OnFailure::Warn => {
            eprintln!("{}", format!("  ⚠ {label} reported problems").yellow().bold());
            eprintln!();
            eprintln!("{stderr}");
            println!();
            Ok(())
        }
    }
}
