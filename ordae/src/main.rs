//! ORDAE loop orchestrator CLI.
//!
//! Each invocation runs at most one loop iteration against the workspace
//! rooted at `--root`; scheduling repeated runs is left to the caller.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, Subcommand};

use ordae::core::mission::{EnhancementLevel, Mission};
use ordae::core::state::LoopState;
use ordae::cycle::{preview, run_iteration};
use ordae::exit_codes;
use ordae::io::config::{OrdaeConfig, load_config};
use ordae::io::init::{InitOptions, init_workspace};
use ordae::io::knowledge::YamlKnowledgeBase;
use ordae::io::loop_state::{load_loop_state, render_loop_state};
use ordae::io::mission_file::{clear_mission, write_mission};
use ordae::io::paths::{WorkspacePaths, config_path};
use ordae::io::rest_store::RestPersonaStore;
use ordae::io::store::{OfflineStore, PersonaStore};
use ordae::logging;
use ordae::progress::summarize;

#[derive(Parser)]
#[command(
    name = "ordae",
    version,
    about = "Observe, Remember, Decide, Act, Evaluate loop orchestrator"
)]
struct Cli {
    /// Workspace root.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.ordae/config.toml`, the persona data and memory directories.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Run exactly one loop iteration.
    Run {
        /// Iteration number recorded in the ledger.
        #[arg(long, default_value_t = 1)]
        iteration: u32,
        /// Initial loop state (JSON, may be empty).
        #[arg(long)]
        state: Option<PathBuf>,
        /// Print the final loop state as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Observe and decide without acting or writing the ledger.
    Decide,
    /// Manage the strategic objectives file.
    Mission {
        #[command(subcommand)]
        command: MissionCommand,
    },
    /// Summarize the ledger against the active mission.
    Progress,
}

#[derive(Subcommand)]
enum MissionCommand {
    /// Onboard one or more organizations.
    Onboard {
        #[arg(long = "org", required = true)]
        organizations: Vec<String>,
        #[arg(long = "program")]
        programs: Vec<String>,
    },
    /// Enhance existing persona categories.
    Enhance {
        #[arg(long = "persona", required = true)]
        personas: Vec<String>,
        #[arg(long, value_enum, default_value_t = EnhancementLevel::Comprehensive)]
        level: EnhancementLevel,
    },
    /// Remove the objectives file.
    Clear,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = cli.root.as_path();
    match cli.command {
        Command::Init { force } => {
            let paths = init_workspace(root, &InitOptions { force })?;
            println!(
                "initialized {}",
                paths.display_relative(&paths.config_path)
            );
            Ok(exit_codes::OK)
        }
        Command::Run {
            iteration,
            state,
            json,
        } => cmd_run(root, iteration, state.as_deref(), json),
        Command::Decide => cmd_decide(root),
        Command::Mission { command } => cmd_mission(root, command),
        Command::Progress => {
            let (paths, _) = load_workspace(root)?;
            println!("{}", summarize(&paths)?);
            Ok(exit_codes::OK)
        }
    }
}

fn load_workspace(root: &Path) -> Result<(WorkspacePaths, OrdaeConfig)> {
    let cfg = load_config(&config_path(root))?;
    Ok((WorkspacePaths::with_config(root, &cfg), cfg))
}

/// Persona store for this process: the configured REST backend, else offline.
fn open_store(cfg: &OrdaeConfig) -> Result<Box<dyn PersonaStore>> {
    match RestPersonaStore::from_config(&cfg.store)? {
        Some(store) => Ok(Box::new(store)),
        None => Ok(Box::new(OfflineStore)),
    }
}

fn cmd_run(root: &Path, iteration: u32, state: Option<&Path>, json: bool) -> Result<i32> {
    let (paths, cfg) = load_workspace(root)?;
    let initial = match state {
        Some(path) => load_loop_state(path)?,
        None => LoopState::default(),
    };
    let store = open_store(&cfg)?;
    let knowledge = YamlKnowledgeBase::new(&paths.knowledge_dir);

    let final_state = run_iteration(
        &paths,
        &cfg,
        store.as_ref(),
        &knowledge,
        iteration,
        initial,
        |report| println!("{report}"),
    )?;

    if json {
        println!("{}", render_loop_state(&final_state)?);
    }
    let passed = final_state
        .evaluation
        .as_ref()
        .is_some_and(|evaluation| evaluation.passed());
    Ok(if passed {
        exit_codes::OK
    } else {
        exit_codes::FAILED
    })
}

fn cmd_decide(root: &Path) -> Result<i32> {
    let (paths, cfg) = load_workspace(root)?;
    let store = open_store(&cfg)?;
    let (_, decision) = preview(&paths, &cfg, store.as_ref())?;
    let mut out = serde_json::to_string_pretty(&decision).context("serialize decision")?;
    out.push('\n');
    print!("{out}");
    Ok(exit_codes::OK)
}

fn cmd_mission(root: &Path, command: MissionCommand) -> Result<i32> {
    let (paths, _) = load_workspace(root)?;
    let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    match command {
        MissionCommand::Onboard {
            organizations,
            programs,
        } => {
            let programs = (!programs.is_empty()).then_some(programs);
            let mission = Mission::onboarding(organizations, programs, created_at);
            write_mission(&paths.objectives_path, &mission)?;
            println!(
                "mission {} written to {}",
                mission.mission,
                paths.display_relative(&paths.objectives_path)
            );
        }
        MissionCommand::Enhance { personas, level } => {
            let mission = Mission::persona_enhancement(personas, level, created_at);
            write_mission(&paths.objectives_path, &mission)?;
            println!(
                "mission {} written to {}",
                mission.mission,
                paths.display_relative(&paths.objectives_path)
            );
        }
        MissionCommand::Clear => {
            if clear_mission(&paths.objectives_path)? {
                println!("mission cleared");
            } else {
                println!("no active mission");
            }
        }
    }
    Ok(exit_codes::OK)
}
