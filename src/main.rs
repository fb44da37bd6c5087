use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use input_patcher::engine::{self, Inspection};
use input_patcher::root::{self, DEFAULT_DESCRIPTOR};
use input_patcher::{ErrorKind, Outcome, PatchDescriptor, PatchError};
use tracing_subscriber::EnvFilter;

/// Prefix for every line shown to the user
const TAG: &str = "[InputPatcher]";

/// Toggle legacy InputManager axis fields in a Unity game's data files
#[derive(Debug, Parser)]
#[command(name = "input-patcher", version, about)]
struct Cli {
    /// Game installation directory (defaults to the current directory)
    game_root: Option<PathBuf>,
    /// Patch descriptor, relative paths are looked up next to this executable and then in the game root
    #[arg(long, default_value = DEFAULT_DESCRIPTOR)]
    patch: PathBuf,
    /// Report the current state without writing
    #[arg(long)]
    check: bool,
    /// Log every located field
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    println!("{TAG} ===== INPUT PATCHER v{} =====", env!("CARGO_PKG_VERSION"));
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = report_failure(&err);
            ExitCode::from(code)
        }
    }
}

/// Resolves the root and descriptor, then applies, reverts, or inspects
fn run(cli: &Cli) -> anyhow::Result<()> {
    let start = match &cli.game_root {
        Some(path) => path.clone(),
        None => env::current_dir().context("cannot determine the current directory")?,
    };
    let start = start.canonicalize().unwrap_or(start);
    let exe_dir = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from));

    let descriptor_path = root::resolve_descriptor(&cli.patch, exe_dir.as_deref(), &start);
    let descriptor = PatchDescriptor::load(&descriptor_path)?;
    let game_root = root::resolve_root(&start, &descriptor.root_contains)?;
    let target = descriptor.target_path(&game_root);

    println!("{TAG} Loaded patch: {} ({})", descriptor.name, descriptor.id);
    println!("{TAG} Root: \"{}\"", game_root.display());
    println!("{TAG} File: \"{}\"", target.display());
    if !descriptor.root_contains.is_empty() {
        let count = descriptor.root_contains.len();
        let label = if count == 1 { "item" } else { "items" };
        println!("{TAG} Root check: OK ({count} required {label})");
    }

    if cli.check {
        let inspection = engine::inspect_file(&descriptor, &target)?;
        print_inspection(&inspection);
        return Ok(());
    }

    let report = engine::apply_or_revert(&descriptor, &target)?;
    for change in &report.changes {
        if descriptor.toggles[change.rule].anchor().is_some() {
            println!("{TAG} Check: axis_name_ok ({:?})", change.anchor);
        } else {
            println!("{TAG} Check: axis_name_skipped");
        }
    }
    for change in &report.changes {
        println!(
            "{TAG} Patched: axis[{}] {:?}.{}: {} -> {}",
            descriptor.toggles[change.rule].axis_index,
            change.anchor,
            change.field,
            change.before,
            change.after
        );
    }
    match report.outcome {
        Outcome::Applied => println!("{TAG} Patch applied OK."),
        Outcome::Reverted => println!("{TAG} Patch reverted OK."),
    }
    Ok(())
}

/// Prints the per-rule state found by `--check`
fn print_inspection(inspection: &Inspection) {
    for reading in &inspection.readings {
        println!(
            "{TAG} State: axis[{}] {:?}.{} = {} (original {}, patched {})",
            reading.located.index,
            reading.located.anchor,
            reading.field,
            reading.current,
            reading.original,
            reading.patched
        );
    }
    println!("{TAG} Current state: {}", inspection.state);
}

/// Prints a failure block and picks the exit code
fn report_failure(err: &anyhow::Error) -> u8 {
    println!("{TAG} ERROR: {err:#}");
    let code = match err.downcast_ref::<PatchError>() {
        Some(e) => {
            if matches!(e, PatchError::FileLocked(_))
                || matches!(e, PatchError::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied)
            {
                println!("{TAG} Try closing the game or running this as Administrator.");
            }
            match e.kind() {
                ErrorKind::Descriptor => 2,
                ErrorKind::Environment => 3,
                ErrorKind::Format | ErrorKind::State => 1,
            }
        }
        None => 1,
    };
    println!("{TAG} ERROR: Patch failed to apply.");
    code
}
