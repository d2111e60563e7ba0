//! lintgate binary entry point.
//! Parses the CLI, delegates to the library, and maps outcomes to exit codes:
//! 0 pass, 1 blocked or invalid, 2 usage or input failure.

use anyhow::{Context, Result};
use clap::Parser;
use lintgate::cli::{Cli, Commands};
use lintgate::config;
use lintgate::executor::SystemRunner;
use lintgate::gate::{self, Outcome};
use lintgate::hook::{self, HookEvent, HookResponse};
use lintgate::resolve::{resolve, Reason, Resolution};
use lintgate::{output, refresh, tasks, validate};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("LINTGATE_LOG", "warn"))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("lintgate: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn exit_if(failed: bool) -> ExitCode {
    if failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let root = cli.project_root.as_deref();
    let cfg = cli.config.as_deref();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Hook { max_input_bytes } => run_hook(root, cfg, max_input_bytes),
        Commands::Check { paths, output } => {
            let eff = config::resolve_effective(root, cfg, output.as_deref(), None);
            let files = expand_paths(&paths)?;
            let reports: Vec<_> = files
                .iter()
                .map(|f| gate::check_file(&eff, f, &SystemRunner).report)
                .collect();
            output::print_check(&reports, &eff.output);
            Ok(exit_if(reports.iter().any(|r| r.blocked())))
        }
        Commands::Resolve { file, output } => {
            let eff = config::resolve_effective(root, cfg, output.as_deref(), None);
            let loaded = match config::load_config(&eff.config_path) {
                Ok(l) => l,
                Err(e) => {
                    print_config_error(&e);
                    return Ok(ExitCode::from(1));
                }
            };
            let file = std::env::current_dir()
                .context("cannot determine the current directory")?
                .join(&file);
            let res: Resolution = resolve(loaded.as_ref(), &file, &eff.project_root);
            output::print_resolution(&res, &eff.output);
            Ok(exit_if(res.reason == Reason::NoConfig))
        }
        Commands::Validate { output } => {
            let eff = config::resolve_effective(root, cfg, output.as_deref(), None);
            let text = fs::read_to_string(&eff.config_path)
                .with_context(|| format!("cannot read {}", eff.config_path.display()))?;
            let report = validate::validate_str(&text);
            let shown = lintgate::resolve::relative_path(&eff.config_path, &eff.project_root);
            output::print_validation(&report, &shown, &eff.output);
            Ok(exit_if(!report.is_valid()))
        }
        Commands::Route { identifier, output } => {
            let eff = config::resolve_effective(root, cfg, output.as_deref(), None);
            let rules = match config::load_config(&eff.config_path) {
                Ok(l) => l.map(|c| c.tasks).unwrap_or_default(),
                Err(e) => {
                    print_config_error(&e);
                    return Ok(ExitCode::from(1));
                }
            };
            let outcome = tasks::route(&rules, &identifier);
            output::print_route(&identifier, &outcome, &eff.output);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Refresh {
            discovered,
            write,
            output,
        } => {
            let eff = config::resolve_effective(root, cfg, output.as_deref(), None);
            match refresh::run_refresh(&eff.config_path, &discovered, write) {
                Ok(res) => {
                    output::print_refresh(&res, &eff.output, write);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    print_config_error(&e);
                    Ok(ExitCode::from(1))
                }
            }
        }
    }
}

fn run_hook(root: Option<&Path>, cfg: Option<&Path>, max_bytes: usize) -> Result<ExitCode> {
    let input = match hook::read_hook_input(max_bytes) {
        Ok(i) => i,
        Err(e) => {
            eprintln!("lintgate: {}", e);
            return Ok(ExitCode::from(2));
        }
    };
    log::debug!(
        "hook event {} (tool {})",
        input.hook_event_name.as_deref().unwrap_or("-"),
        input.tool_name.as_deref().unwrap_or("-")
    );
    let eff = config::resolve_effective(root, cfg, None, input.cwd.as_deref());
    let outcome = match input.event() {
        HookEvent::FileEdited(path) => gate::check_file(&eff, Path::new(&path), &SystemRunner).outcome,
        HookEvent::TaskCompleted(agent) => gate::check_task(&eff, &agent),
        HookEvent::Other => {
            log::debug!("payload carries neither a file path nor an agent; ignoring");
            Outcome::silent()
        }
    };
    if let Some(resp) = HookResponse::from_outcome(&outcome) {
        println!(
            "{}",
            serde_json::to_string(&resp).context("failed to encode hook response")?
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn print_config_error(e: &config::ConfigError) {
    for m in e.messages() {
        eprintln!("lintgate: {}", m);
    }
}

/// Expand literal paths and glob patterns relative to the working directory.
fn expand_paths(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    let mut files = Vec::new();
    for p in patterns {
        let full = cwd.join(p);
        if !p.contains(|c: char| matches!(c, '*' | '?' | '[')) {
            files.push(full);
            continue;
        }
        let pattern = full.to_string_lossy();
        let mut matched = 0;
        for entry in glob::glob(&pattern).with_context(|| format!("invalid glob '{}'", p))? {
            match entry {
                Ok(path) if path.is_file() => {
                    files.push(path);
                    matched += 1;
                }
                Ok(_) => {}
                Err(e) => log::warn!("skipping unreadable path: {}", e),
            }
        }
        if matched == 0 {
            log::warn!("no files match '{}'", p);
        }
    }
    Ok(files)
}
