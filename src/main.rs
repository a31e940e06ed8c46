use anyhow::{Context, Result};
use chromedriver_fetch::ui::{self, Level, OutputFormat, emit};
use chromedriver_fetch::{browser, install, paths, release};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Download and install the chromedriver binary for the current platform.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit machine-readable JSON events instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download chromedriver, or reuse a matching binary already on PATH
    Install {
        /// Full version to pin (used as-is) or a major version to resolve
        #[arg(long)]
        version: Option<String>,

        /// Match the major version of the installed Chrome/Chromium browser
        #[arg(long, conflicts_with = "version")]
        match_browser: bool,

        /// Install directory (defaults to the per-user data directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Print the directory containing the chromedriver binary
    Path {
        /// Install directory (defaults to the per-user data directory)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    ui::init(format, !cli.json);

    let result = match cli.command {
        Commands::Install {
            version,
            match_browser,
            dir,
        } => run_install(version, match_browser, dir),
        Commands::Path { dir } => run_path(dir),
    };

    if let Err(e) = result {
        emit(Level::Error, "error", &format!("{e:#}"), None);
        std::process::exit(1);
    }
}

fn run_install(version: Option<String>, match_browser: bool, dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => paths::install_dir()?,
    };
    let version = requested_version(version, match_browser)?;
    install::install(&version, &dir)?;
    Ok(())
}

/// A fully-qualified version pin is used verbatim; a bare major version or no
/// version at all goes through the release metadata service.
fn requested_version(version: Option<String>, match_browser: bool) -> Result<String> {
    if match_browser {
        let major = browser::chrome_major_version()
            .context("No installed Chrome or Chromium browser found")?;
        emit(
            Level::Debug,
            "install.browser",
            &format!("Detected browser major version {major}"),
            None,
        );
        return release::resolve_version(Some(&major));
    }
    match version {
        Some(version) if version.contains('.') => Ok(version),
        hint => release::resolve_version(hint.as_deref()),
    }
}

fn run_path(dir: Option<PathBuf>) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => paths::install_dir()?,
    };
    println!("{}", dir.display());
    Ok(())
}
