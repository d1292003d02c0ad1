use std::env;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use buddy_guard::audit::AuditLog;
use buddy_guard::config::{load_config, load_from_path, LoadedConfig, PolicySnapshot};
use buddy_guard::core::GuardError;
use buddy_guard::hooks::{
    builtin_registry, load_failure_response, load_registrations, AutoFormatHook,
    CommandValidatorHook, Dispatcher, FileGuardHook, Hook, HookPhase, HookRegistry, HookRequest,
    HookResponse, EXIT_APPROVED, EXIT_NON_BLOCKING_ERROR,
};
use buddy_guard::logging;

/// Policy hooks for coding-assistant tool calls
///
/// Reads one JSON request on stdin, writes one JSON response on stdout.
/// Exit status: 0 approved, 1 non-blocking error, 2 blocked.
#[derive(Parser, Debug)]
#[command(name = "buddy-guard", version, about)]
struct Cli {
    /// Project directory for config discovery and the audit log
    #[arg(long, global = true, env = "CLAUDE_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    /// Policy config file, skipping discovery
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Block writes to protected files (PreToolUse)
    FileGuard,
    /// Block dangerous shell commands and warn about slow ones (PreToolUse)
    CommandValidator,
    /// Format a file after it was written (PostToolUse)
    AutoFormat,
    /// Run every hook registered for a phase
    Dispatch {
        #[arg(long, value_enum)]
        phase: PhaseArg,

        /// Settings file with hook registrations; built-in hooks when omitted
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PhaseArg {
    Pre,
    Post,
}

impl From<PhaseArg> for HookPhase {
    fn from(phase: PhaseArg) -> Self {
        match phase {
            PhaseArg::Pre => HookPhase::PreToolUse,
            PhaseArg::Post => HookPhase::PostToolUse,
        }
    }
}

impl Command {
    fn phase(&self) -> HookPhase {
        match self {
            Command::FileGuard | Command::CommandValidator => HookPhase::PreToolUse,
            Command::AutoFormat => HookPhase::PostToolUse,
            Command::Dispatch { phase, .. } => (*phase).into(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match logging::init_logging() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("buddy-guard: {:#}", e);
            None
        }
    };

    match run(cli).await {
        Ok(code) => to_exit_code(code),
        Err(e) => {
            tracing::error!("[Main] {:#}", e);
            eprintln!("buddy-guard: {:#}", e);
            to_exit_code(EXIT_NON_BLOCKING_ERROR)
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let request = read_request()?;
    let project_dir = match cli.project_dir {
        Some(dir) => dir,
        None => env::current_dir().context("cannot determine the project directory")?,
    };
    let phase = cli.command.phase();

    let loaded = match load_policy(cli.config.as_deref(), &project_dir) {
        Ok(loaded) => loaded,
        Err(e) => return refuse(phase, e),
    };
    if let Some(source) = &loaded.source {
        tracing::debug!("[Main] Policy loaded from {}", source.display());
    }
    let snapshot = Arc::new(PolicySnapshot::from_loaded(&loaded));

    match cli.command {
        Command::FileGuard => {
            let response = FileGuardHook::new(snapshot)
                .with_project_root(&project_dir)
                .with_audit(AuditLog::new(&project_dir))
                .check(&request);
            emit(&response)?;
            Ok(response.exit_code())
        }
        Command::CommandValidator => {
            let response = CommandValidatorHook::new(snapshot)
                .with_audit(AuditLog::new(&project_dir))
                .check(&request);
            emit(&response)?;
            Ok(response.exit_code())
        }
        Command::AutoFormat => {
            let response = AutoFormatHook::new(snapshot)
                .with_project_root(&project_dir)
                .invoke(request)
                .await?;
            emit(&response)?;
            Ok(EXIT_APPROVED)
        }
        Command::Dispatch { settings, .. } => {
            let registry = match settings {
                Some(path) => match load_registrations(&path) {
                    Ok(registrations) => HookRegistry::from_registrations(&registrations),
                    Err(e) => return refuse(phase, e),
                },
                None => builtin_registry(snapshot, Some(project_dir.as_path())),
            };

            let decision = Dispatcher::new(registry).dispatch(phase, &request).await;
            let code = decision.exit_code();
            emit(&decision.into_response())?;
            Ok(code)
        }
    }
}

fn read_request() -> Result<HookRequest> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read hook request from stdin")?;
    serde_json::from_str(&input).context("stdin is not a valid hook request")
}

fn load_policy(explicit: Option<&Path>, project_dir: &Path) -> Result<LoadedConfig, GuardError> {
    match explicit {
        Some(path) => load_from_path(path),
        None => load_config(project_dir),
    }
}

/// A configuration that cannot be read must not turn into "approve
/// everything": validation phases block, formatting reports an error.
fn refuse(phase: HookPhase, error: GuardError) -> Result<i32> {
    match load_failure_response(phase, &error) {
        Some(response) => {
            tracing::error!("[Main] {}", error);
            emit(&response)?;
            Ok(response.exit_code())
        }
        None => Err(error.into()),
    }
}

fn emit(response: &HookResponse) -> Result<()> {
    println!("{}", serde_json::to_string(response)?);
    Ok(())
}

fn to_exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map(ExitCode::from).unwrap_or(ExitCode::FAILURE)
}
