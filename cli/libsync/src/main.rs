//! libsync CLI — keeps the local library cache in line with the remote store.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use manifest::LibsyncManifest;

#[derive(Parser)]
#[command(name = "libsync", version, about = "Library registry synchronization")]
struct Cli {
    /// Path to libsync.toml (default: search upward from the current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synchronize the local cache with the remote store
    Sync {
        /// Read from a local mirror directory instead of the remote store
        #[arg(long)]
        mirror: Option<PathBuf>,
        /// Write the accumulated changes as JSON to this file
        #[arg(long)]
        changes_out: Option<PathBuf>,
    },
    /// Compare two registry files
    Diff {
        /// Previous registry (missing file counts as empty)
        local: PathBuf,
        /// Current registry
        remote: PathBuf,
        /// Print the change set as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show resolved cache paths
    Paths {
        /// Library name
        #[arg(long)]
        lib: Option<String>,
        /// Library version
        #[arg(long)]
        version: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Sync {
            mirror,
            changes_out,
        } => {
            let (manifest, project_dir) = load_manifest_required(&cwd, cli.config.as_deref())?;
            commands::sync::run(
                &project_dir,
                &manifest,
                mirror.as_deref(),
                changes_out.as_deref(),
            )
        }

        Commands::Diff {
            local,
            remote,
            json,
        } => commands::diff::run(&local, &remote, json),

        Commands::Paths { lib, version } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd, cli.config.as_deref())?;
            commands::paths::run(
                &project_dir,
                &manifest.unwrap_or_default(),
                lib.as_deref(),
                version.as_deref(),
            )
        }
    }
}

/// Load the manifest, returning an error if not found.
fn load_manifest_required(
    cwd: &Path,
    explicit: Option<&Path>,
) -> anyhow::Result<(LibsyncManifest, PathBuf)> {
    match load_manifest_optional(cwd, explicit)? {
        (Some(manifest), dir) => Ok((manifest, dir)),
        (None, _) => anyhow::bail!("no libsync.toml found (pass --config <file>)"),
    }
}

/// Load the manifest from `--config` or by searching upward from `cwd`.
///
/// The returned directory is the one relative paths resolve against: the
/// manifest's directory when found, else `cwd`.
fn load_manifest_optional(
    cwd: &Path,
    explicit: Option<&Path>,
) -> anyhow::Result<(Option<LibsyncManifest>, PathBuf)> {
    if let Some(path) = explicit {
        let manifest = LibsyncManifest::load(path)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => cwd.to_path_buf(),
        };
        return Ok((Some(manifest), dir));
    }

    match LibsyncManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((Some(manifest), dir)),
        None => Ok((None, cwd.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_sync() {
        let cli = Cli::try_parse_from([
            "libsync",
            "sync",
            "--mirror",
            "/tmp/mirror",
            "--changes-out",
            "changes.json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Sync {
                mirror,
                changes_out,
            } => {
                assert_eq!(mirror, Some(PathBuf::from("/tmp/mirror")));
                assert_eq!(changes_out, Some(PathBuf::from("changes.json")));
            }
            _ => panic!("expected sync command"),
        }
    }

    #[test]
    fn cli_parses_diff() {
        let cli = Cli::try_parse_from(["libsync", "diff", "a.json", "b.json", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Diff { json: true, .. }));
    }

    #[test]
    fn explicit_config_sets_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        std::fs::write(&path, "[remote_store]\nnamespace = \"mysite\"\n").unwrap();

        let (manifest, project_dir) =
            load_manifest_required(Path::new("/elsewhere"), Some(&path)).unwrap();
        assert_eq!(project_dir, dir.path());
        assert!(manifest.remote_store.is_some());
    }

    #[test]
    fn explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(load_manifest_optional(dir.path(), Some(&missing)).is_err());
    }
}
