//! Embry runtime-asset tool
//!
//! Command-line surface over `embry-assets`: install the runtime payload,
//! inspect an install directory, or remove an install.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use embry_assets::{clean, default_install_dir, inspect, Bootstrapper, InstallState};

mod output;

use output::StyledOutput;

#[derive(Parser)]
#[command(name = "embry")]
#[command(about = "Embedded Ruby runtime asset bootstrapper", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install runtime assets (no-op when already installed)
    Bootstrap {
        /// Install directory (defaults to ~/.embry/runtime)
        #[arg(long)]
        install_dir: Option<PathBuf>,
        /// Payload directory (defaults to probing next to the executable)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Rebuild even when the install looks complete
        #[arg(short, long)]
        force: bool,
    },

    /// Report the state of an install directory
    Status {
        /// Install directory (defaults to ~/.embry/runtime)
        #[arg(long)]
        install_dir: Option<PathBuf>,
    },

    /// Remove installed runtime assets
    Clean {
        /// Install directory (defaults to ~/.embry/runtime)
        #[arg(long)]
        install_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut out = StyledOutput::new(output::resolve_color_choice());

    match cli.command {
        Commands::Bootstrap {
            install_dir,
            source,
            force,
        } => {
            let install_dir = resolve_install_dir(install_dir)?;
            let mut bootstrapper = Bootstrapper::new(&install_dir).force(force);
            if let Some(source) = source {
                bootstrapper = bootstrapper.with_source(source);
            }

            match bootstrapper.run() {
                Ok(layout) => {
                    out.success("✓ Runtime assets ready\n");
                    out.plain(&format!(
                        "  Ruby stdlib: {}\n",
                        layout.ruby_stdlib_path().display()
                    ));
                    out.plain(&format!(
                        "  Native libs: {}\n",
                        layout.native_libs_dir().display()
                    ));
                }
                Err(err) => {
                    out.stderr_error(&format!("Bootstrap failed: {}\n", err));
                    if let Some(context) = err.context() {
                        out.stderr_error(&format!("  Context: {}\n", context.display()));
                    }
                    std::process::exit(1);
                }
            }
        }

        Commands::Status { install_dir } => {
            let install_dir = resolve_install_dir(install_dir)?;
            match inspect(&install_dir) {
                InstallState::Complete(marker) => {
                    out.success("✓ Complete\n");
                    out.plain(&format!("  Install dir: {}\n", install_dir.display()));
                    out.plain(&format!("  Payload version: {}\n", marker.version));
                    if let Some(checksum) = &marker.checksum {
                        out.plain(&format!("  Archive checksum: {}\n", checksum));
                    }
                }
                InstallState::Incomplete => {
                    out.warning("! Incomplete\n");
                    out.plain(&format!("  Install dir: {}\n", install_dir.display()));
                    out.plain("  The next bootstrap run will rebuild it.\n");
                }
                InstallState::Absent => {
                    out.plain(&format!(
                        "Nothing installed at {}\n",
                        install_dir.display()
                    ));
                }
            }
        }

        Commands::Clean { install_dir } => {
            let install_dir = resolve_install_dir(install_dir)?;
            clean(&install_dir)
                .with_context(|| format!("failed to clean {}", install_dir.display()))?;
            out.plain(&format!(
                "Removed runtime assets under {}\n",
                install_dir.display()
            ));
        }
    }

    Ok(())
}

fn resolve_install_dir(arg: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    arg.or_else(default_install_dir).context(
        "could not determine an install directory (no home directory); pass --install-dir",
    )
}
