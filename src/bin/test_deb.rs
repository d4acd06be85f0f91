//! Containerized acceptance test for a built package.
//!
//! Installs the artifact in a disposable container, submits one message
//! through the sendmail shim as an unprivileged user, and verifies what
//! landed in the Maildir.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use rattomail_dist::config::HarnessConfig;
use rattomail_dist::harness::{TestHarness, CHECK_NAMES};
use rattomail_dist::preflight;
use rattomail_dist::process::SystemRunner;

#[derive(Parser)]
#[command(name = "test-deb")]
#[command(about = "Install a rattomail .deb in a throwaway container and verify local delivery")]
struct Cli {
    /// Path to the package artifact to test
    deb: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    dotenvy::dotenv().ok();
    let base_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let cfg = HarnessConfig::new(&base_dir);

    preflight::require_host_tools(preflight::HARNESS_TOOLS)?;

    println!("=== Acceptance checks ({}) ===", CHECK_NAMES.len());
    for name in CHECK_NAMES {
        println!("  - {}", name);
    }

    let runner = SystemRunner;
    let tester = TestHarness::new(&runner, cfg);
    let report = tester.run(&cli.deb)?;

    report.print("Delivery Check Results");

    if !report.all_passed() {
        bail!(
            "{} of {} checks failed",
            report.fail_count(),
            report.checks.len()
        );
    }
    Ok(())
}
