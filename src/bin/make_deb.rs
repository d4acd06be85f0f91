//! Build the Debian package from a candidate executable.
//!
//! The executable is validated (regular file, executable, statically
//! linked), staged into a scratch tree with its man page, example config,
//! and sendmail symlink, then archived with fakeroot and dpkg-deb.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use rattomail_dist::config::PackagingConfig;
use rattomail_dist::pipeline;
use rattomail_dist::preflight;
use rattomail_dist::process::SystemRunner;

#[derive(Parser)]
#[command(name = "make-deb")]
#[command(about = "Package a statically linked rattomail executable as a .deb")]
struct Cli {
    /// Path to the statically linked executable to package
    executable: PathBuf,

    /// Validate the executable and print the artifact name, building nothing
    #[arg(long)]
    print_deb_name: bool,
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
    let cfg = PackagingConfig::new(&base_dir);
    let runner = SystemRunner;

    if cli.print_deb_name {
        preflight::require_host_tools(preflight::DRY_RUN_TOOLS)?;
        let name = pipeline::dry_run_name(&runner, &cfg, &cli.executable)?;
        println!("{}", name);
        return Ok(());
    }

    preflight::require_host_tools(preflight::BUILD_TOOLS)?;
    let artifact = pipeline::build_package(&runner, &cfg, &cli.executable)?;

    println!();
    println!("Created package: {}", artifact.display());
    Ok(())
}
