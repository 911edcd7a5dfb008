//! Crewline - multi-role generation pipeline CLI
//!
//! The `crewline` command drives a request through the manager, analyst,
//! architect, implementer, tester, reviewer and deployer workers, and keeps
//! every session on disk so it can be revised later.
//!
//! ## Commands
//!
//! - `run`: start a new session from a prompt
//! - `revise`: submit a follow-up prompt to a stored session
//! - `route`: look up the next worker for a `(role, phase)` pair
//! - `diff`: show the line-tagged diff of two files
//! - `context`: print the conversation a worker would receive
//! - `sessions`: list stored sessions

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crewline_agents::{llm_registry, AgentsConfig, ChatClient};
use crewline_core::{
    assemble, diff_lines, route, scripted_registry, ChainReport, ModelTier, Orchestrator, Phase,
    PipelineConfig, Role, Session, SessionSpan, WorkerOutput, WorkerRegistry, METRICS,
};
use crewline_state::{FsSessionStore, SessionId, SessionStore};
use serde::Deserialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "crewline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-role generation pipeline", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding stored sessions
    #[arg(long, global = true, env = "CREWLINE_HOME", default_value = ".crewline")]
    home: PathBuf,

    /// Pipeline configuration file (TOML)
    #[arg(long, global = true, env = "CREWLINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session and run the worker chain
    Run {
        /// The request to build
        prompt: String,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Submit a revision to a stored session and rerun the chain
    Revise {
        /// Session to revise
        #[arg(short, long)]
        session: String,

        /// The revision request
        prompt: String,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Show which worker runs after a role declares a phase
    Route {
        /// Role that produced the latest message
        role: Role,

        /// Phase it declared
        phase: Phase,

        /// Route through the tester
        #[arg(long)]
        tdd: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the line-tagged diff between two files
    Diff {
        /// Previous version
        old: PathBuf,

        /// New version
        new: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the conversation assembled from a session's context
    Context {
        /// Session to render
        #[arg(short, long)]
        session: String,

        /// Only include these roles (comma-separated)
        #[arg(long, value_delimiter = ',')]
        roles: Vec<Role>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List stored sessions, newest first
    Sessions {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
struct PipelineArgs {
    /// Route through the tester before and after implementation
    #[arg(long, env = "CREWLINE_TDD")]
    tdd: bool,

    /// Model tier (HIGH or MID)
    #[arg(long, env = "CREWLINE_TIER")]
    tier: Option<ModelTier>,

    /// Ceiling on automatic steps per chain
    #[arg(long)]
    max_steps: Option<usize>,

    /// Replay worker outputs from a JSON file instead of calling a model
    #[arg(long)]
    script: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Contents of the `--config` file: pipeline settings at the top level and
/// model endpoint settings under `[agents]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    #[serde(flatten)]
    pipeline: PipelineConfig,
    agents: AgentsConfig,
}

impl FileConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config in {:?}", path))
    }

    fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Pipeline settings with command-line overrides applied.
    fn pipeline_with(&self, args: &PipelineArgs) -> Result<PipelineConfig> {
        let mut pipeline = self.pipeline.clone();
        if args.tdd {
            pipeline.tdd_enabled = true;
        }
        if let Some(tier) = args.tier {
            pipeline.tier = tier;
        }
        if let Some(max_steps) = args.max_steps {
            pipeline.max_steps = max_steps;
        }
        pipeline.validate()?;
        Ok(pipeline)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    crewline_core::init_tracing(cli.json, level);

    let result = dispatch(cli).await;
    METRICS.flush();
    result
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = FileConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { prompt, pipeline } => {
            let store = open_store(&cli.home)?;
            let workers = build_workers(pipeline.script.as_deref(), &config.agents)?;
            let settings = config.pipeline_with(&pipeline)?;
            let (session, report) = cmd_run(store, workers, settings, &prompt).await?;
            print_report(&session, &report, pipeline.format)
        }
        Commands::Revise {
            session,
            prompt,
            pipeline,
        } => {
            let store = open_store(&cli.home)?;
            let workers = build_workers(pipeline.script.as_deref(), &config.agents)?;
            let settings = config.pipeline_with(&pipeline)?;
            let (session, report) = cmd_revise(store, workers, settings, &session, &prompt).await?;
            print_report(&session, &report, pipeline.format)
        }
        Commands::Route {
            role,
            phase,
            tdd,
            format,
        } => cmd_route(role, phase, tdd, format),
        Commands::Diff { old, new, format } => cmd_diff(&old, &new, format),
        Commands::Context {
            session,
            roles,
            format,
        } => {
            let store = open_store(&cli.home)?;
            cmd_context(store.as_ref(), &session, &roles, format).await
        }
        Commands::Sessions { format } => {
            let store = open_store(&cli.home)?;
            cmd_sessions(store.as_ref(), format).await
        }
    }
}

fn open_store(home: &Path) -> Result<Arc<dyn SessionStore>> {
    let store = FsSessionStore::new(home)
        .with_context(|| format!("Failed to open session store at {:?}", home))?;
    Ok(Arc::new(store))
}

/// Scripted workers when a script file is given, model-backed otherwise.
fn build_workers(script: Option<&Path>, agents: &AgentsConfig) -> Result<WorkerRegistry> {
    match script {
        Some(path) => {
            let script: BTreeMap<Role, Vec<WorkerOutput>> = read_json_file(path)?;
            info!(path = %path.display(), roles = script.len(), "using scripted workers");
            Ok(scripted_registry(script).0)
        }
        None => {
            let client =
                ChatClient::from_env(agents).context("Failed to create model client")?;
            Ok(llm_registry(Arc::new(client)))
        }
    }
}

fn read_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}

async fn load_session(store: &dyn SessionStore, session_id: &str) -> Result<Session> {
    let record = store
        .load(&SessionId::from(session_id))
        .await
        .with_context(|| format!("Failed to load session '{}'", session_id))?;
    Ok(Session::from_record(record)?)
}

/// Start a new session
async fn cmd_run(
    store: Arc<dyn SessionStore>,
    workers: WorkerRegistry,
    config: PipelineConfig,
    prompt: &str,
) -> Result<(Session, ChainReport)> {
    let orchestrator = Orchestrator::new(workers, config).with_store(store);
    let mut session = Session::new();
    let report = orchestrator.start(&mut session, prompt).await?;
    Ok((session, report))
}

/// Revise a stored session
async fn cmd_revise(
    store: Arc<dyn SessionStore>,
    workers: WorkerRegistry,
    config: PipelineConfig,
    session_id: &str,
    prompt: &str,
) -> Result<(Session, ChainReport)> {
    let mut session = load_session(store.as_ref(), session_id).await?;
    let orchestrator = Orchestrator::new(workers, config).with_store(store);
    let report = orchestrator.revise(&mut session, prompt).await?;
    Ok((session, report))
}

fn print_report(session: &Session, report: &ChainReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let files: BTreeMap<String, Vec<String>> = session
                .context
                .artifacts()
                .map(|(role, artifact)| {
                    (
                        role.to_string(),
                        artifact
                            .files
                            .iter()
                            .filter(|(_, file)| !file.is_deleted())
                            .map(|(path, _)| path.clone())
                            .collect(),
                    )
                })
                .collect();
            let output = json!({
                "report": report,
                "name": session.context.name(),
                "summary": session.context.summary(),
                "usage": session.usage_totals(),
                "files": files,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => println!("{}", render_report(session, report)),
    }
    Ok(())
}

fn render_report(session: &Session, report: &ChainReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Session: {}\n", report.session_id));
    if !session.context.name().is_empty() {
        out.push_str(&format!("Project: {}\n", session.context.name()));
    }

    let chain: Vec<&str> = report.invoked.iter().map(|role| role.as_str()).collect();
    if chain.is_empty() {
        out.push_str("Chain:   (no workers ran)\n");
    } else {
        out.push_str(&format!("Chain:   {}\n", chain.join(" -> ")));
    }
    out.push_str(&format!("Halted:  {}\n", report.halt));

    let usage = session.usage_totals();
    out.push_str(&format!(
        "Usage:   {} in / {} out over {} worker messages ({:.1}s)\n",
        usage.input_tokens, usage.output_tokens, usage.worker_messages, usage.time_taken_secs
    ));

    let mut artifacts = session.context.artifacts().peekable();
    if artifacts.peek().is_some() {
        out.push_str("\nArtifacts:\n");
    }
    for (role, artifact) in artifacts {
        out.push_str(&format!("  {}\n", role));
        for (path, file) in &artifact.files {
            if file.is_deleted() {
                out.push_str(&format!("    {} (deleted)\n", path));
                continue;
            }
            let stats = file.stats();
            out.push_str(&format!(
                "    {} (+{} -{} ={})\n",
                path, stats.added, stats.removed, stats.unchanged
            ));
        }
    }
    out.trim_end().to_string()
}

/// Look up a transition
fn cmd_route(role: Role, phase: Phase, tdd: bool, format: OutputFormat) -> Result<()> {
    let next = route(role, phase, tdd);
    match format {
        OutputFormat::Json => {
            let output = json!({
                "from": role,
                "phase": phase,
                "tdd_enabled": tdd,
                "next": next,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => match next {
            Some(next) => println!("{} --{}--> {}", role, phase, next),
            None => println!("{} --{}--> (terminal)", role, phase),
        },
    }
    Ok(())
}

/// Diff two files line by line
fn cmd_diff(old: &Path, new: &Path, format: OutputFormat) -> Result<()> {
    let old_text = std::fs::read_to_string(old)
        .with_context(|| format!("Failed to read file: {:?}", old))?;
    let new_text = std::fs::read_to_string(new)
        .with_context(|| format!("Failed to read file: {:?}", new))?;
    let diff = diff_lines(&old_text, &new_text);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
        OutputFormat::Text => {
            for line in &diff {
                println!("[{}] {}", line.tag, line.line);
            }
        }
    }
    Ok(())
}

/// Print the assembled conversation for a session
async fn cmd_context(
    store: &dyn SessionStore,
    session_id: &str,
    roles: &[Role],
    format: OutputFormat,
) -> Result<()> {
    let session = load_session(store, session_id).await?;
    let _span = SessionSpan::enter(session.id.as_str());

    let filter: BTreeSet<Role> = roles.iter().copied().collect();
    let turns = assemble(&session.context, Some(&filter));
    info!(turns = turns.len(), roles = filter.len(), "assembled context");

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&turns)?),
        OutputFormat::Text => {
            if turns.is_empty() {
                println!("Session '{}' has no context yet.", session_id);
            }
            for turn in turns {
                println!("--- {} ---", turn.role);
                println!("{}", turn.content.trim_end());
                println!();
            }
        }
    }
    Ok(())
}

/// List stored sessions
async fn cmd_sessions(store: &dyn SessionStore, format: OutputFormat) -> Result<()> {
    let sessions = store.list().await?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!("No sessions found. Start one with 'crewline run <prompt>'.");
        return Ok(());
    }

    for summary in sessions {
        println!(
            "{}  steps={:<3} messages={:<3} {}  {}",
            summary.session_id,
            summary.steps,
            summary.message_count,
            summary.digest.short(),
            summary.saved_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}
