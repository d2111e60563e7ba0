//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lintgate",
    version,
    about = "Rule-driven quality gate for agent hooks",
    long_about = "lintgate — resolve, run, and summarize per-file checks for an agent host.\n\nAn edited file is matched against the environments in .lintgate.json; the checks for its extension run in order and their output is normalized into diagnostics. A failing check blocks the edit.\n\nConfiguration precedence: CLI > environment > .lintgate.json discovery > defaults.",
    after_help = "Examples:\n  lintgate hook < payload.json\n  lintgate check 'src/**/*.py' --output json\n  lintgate resolve services/api/main.py\n  lintgate validate\n  lintgate route python-engineer\n  lintgate refresh discovered.json --write",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "CLAUDE_PROJECT_DIR",
        help = "Project root (default: nearest ancestor with .lintgate.json or .git)"
    )]
    pub project_root: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "LINTGATE_CONFIG",
        help = "Rule document, relative to the project root (default: .lintgate.json)"
    )]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current lintgate version.")]
    Version,
    /// Handle one hook event from stdin
    #[command(
        about = "Handle a hook event",
        long_about = "Read a hook payload (JSON) from stdin, gate the edited file or route the finished sub-task, and print the response JSON. Prints nothing when there is nothing to report.",
        after_help = "Exit codes:\n  0  event handled (including blocks)\n  2  payload unreadable or not JSON"
    )]
    Hook {
        #[arg(long, default_value_t = crate::hook::DEFAULT_MAX_INPUT_BYTES, help = "Maximum payload size in bytes")]
        max_input_bytes: usize,
    },
    /// Run checks for files or globs
    #[command(
        about = "Run checks",
        long_about = "Gate each file as if it had just been edited. Paths and globs are taken relative to the current directory. Exits 1 when any file is blocked.",
        after_help = "Examples:\n  lintgate check src/app.py\n  lintgate check 'services/**/*.py' --output json"
    )]
    Check {
        #[arg(required = true, help = "Files or glob patterns")]
        paths: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Explain which checks apply to a file
    #[command(
        about = "Resolve a file",
        long_about = "Print the environment, working directory, and checks that apply to a file, or the reason none do."
    )]
    Resolve {
        #[arg(help = "File path (absolute or relative to the project root)")]
        file: PathBuf,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Validate the rule document
    #[command(
        about = "Validate configuration",
        long_about = "Check .lintgate.json for structural errors and warnings. Exits 1 when there are errors."
    )]
    Validate {
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Show how a sub-agent identifier is routed
    #[command(
        about = "Route a sub-task",
        long_about = "Match a sub-agent identifier against the task rules and print the resulting action."
    )]
    Route {
        #[arg(help = "Sub-agent identifier, e.g. python-engineer")]
        identifier: String,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// Merge auto-discovered checks
    #[command(
        about = "Refresh auto-discovered checks",
        long_about = "Merge a discovered rule document into .lintgate.json. Only checks marked \"auto\": true are replaced; user-authored checks are never modified.",
        after_help = "Examples:\n  lintgate refresh discovered.json\n  lintgate refresh discovered.json --write"
    )]
    Refresh {
        #[arg(help = "Discovered rule document (JSON)")]
        discovered: PathBuf,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Write the merged document (default: preview)")]
        write: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
