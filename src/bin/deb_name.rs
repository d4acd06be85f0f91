//! Print the artifact name the packaging pipeline would produce.
//!
//! Reads the version from the project manifest, so it works before any
//! binary has been built. Release scripts consume the output verbatim.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use rattomail_dist::config::PackagingConfig;
use rattomail_dist::pipeline;
use rattomail_dist::preflight;
use rattomail_dist::process::SystemRunner;

#[derive(Parser)]
#[command(name = "deb-name")]
#[command(about = "Print the Debian artifact name for the current tree")]
struct Cli {
    /// Print "<version> <architecture>" instead of the artifact name
    #[arg(long)]
    ver_arch: bool,
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

    preflight::require_host_tools(preflight::NAME_TOOLS)?;

    let runner = SystemRunner;
    let identity = pipeline::identity_from_manifest(&runner, &cfg)?;

    if cli.ver_arch {
        println!("{}", identity.ver_arch());
    } else {
        println!("{}", identity.deb_file_name());
    }

    Ok(())
}
