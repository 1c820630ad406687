// Callsmith - synthetic function-calling dataset pipeline
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use callsmith::config::{load_config, Config};
use callsmith::pipeline::{
    convert_multi_turn, generate_functions, generate_queries, generate_scenarios, validate_jsonl,
    Artifact, RunContext, StageRunner,
};
use callsmith::providers::{create_provider, CompletionProvider};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "callsmith")]
#[command(about = "Synthetic function-calling dataset pipeline", version)]
struct Args {
    /// Pipeline stage to run
    #[command(subcommand)]
    command: Command,

    /// Root directory for per-run artifacts
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,

    /// Directory holding the stage prompt templates
    #[arg(long = "templates", global = true)]
    templates: Option<PathBuf>,

    /// File holding the current run id
    #[arg(long = "run-id-file", global = true)]
    run_id_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new run and generate scenarios from the curriculum
    Scenarios {
        /// Curriculum CSV (domain,subdomain[,entities])
        #[arg(long)]
        curriculum: Option<PathBuf>,
    },
    /// Generate function signatures for the current run's scenarios
    Functions,
    /// Generate simple, parallel, multiple and multi-turn queries
    Queries,
    /// Convert multi-turn queries to engineered JSONL
    Convert {
        /// Output path (default: the run's multi_turn_eng.jsonl)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Validate an engineered JSONL file
    Validate {
        /// File to check (default: the current run's multi_turn_eng.jsonl)
        path: Option<PathBuf>,
    },
    /// Run every stage on a new run
    Run {
        /// Curriculum CSV (domain,subdomain[,entities])
        #[arg(long)]
        curriculum: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let args = Args::parse();
    let mut config = load_config()?;
    apply_path_flags(&mut config, &args);

    match args.command {
        Command::Scenarios { curriculum } => {
            if let Some(curriculum) = curriculum {
                config.paths.curriculum = curriculum;
            }
            let provider = create_provider(&config.completion)?;
            run_scenarios(&config, provider.as_ref()).await?;
        }
        Command::Functions => {
            let provider = create_provider(&config.completion)?;
            let ctx = resume_run(&config)?;
            generate_functions(&ctx, &stage_runner(&config, provider.as_ref()), &config.stages)
                .await?;
        }
        Command::Queries => {
            let provider = create_provider(&config.completion)?;
            let ctx = resume_run(&config)?;
            generate_queries(&ctx, &stage_runner(&config, provider.as_ref()), &config.stages)
                .await?;
        }
        Command::Convert { out } => {
            let ctx = resume_run(&config)?;
            let path = convert_multi_turn(&ctx, out.as_deref())?;
            println!("Wrote: {}", path.display());
        }
        Command::Validate { path } => {
            let path = match path {
                Some(path) => path,
                None => resume_run(&config)?.artifact_path(Artifact::MultiTurnEng),
            };
            return run_validate(&path);
        }
        Command::Run { curriculum } => {
            if let Some(curriculum) = curriculum {
                config.paths.curriculum = curriculum;
            }
            let provider = create_provider(&config.completion)?;
            let ctx = run_scenarios(&config, provider.as_ref()).await?;
            let runner = stage_runner(&config, provider.as_ref());

            generate_functions(&ctx, &runner, &config.stages).await?;
            generate_queries(&ctx, &runner, &config.stages).await?;

            if config.stages.queries.multi_turn {
                let path = convert_multi_turn(&ctx, None)?;
                return run_validate(&path);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn apply_path_flags(config: &mut Config, args: &Args) {
    if let Some(dir) = &args.data_dir {
        config.paths.data_dir = dir.clone();
    }
    if let Some(dir) = &args.templates {
        config.paths.template_dir = dir.clone();
    }
    if let Some(file) = &args.run_id_file {
        config.paths.run_id_file = file.clone();
    }
}

fn stage_runner<'a>(config: &Config, provider: &'a dyn CompletionProvider) -> StageRunner<'a> {
    StageRunner::new(provider, config.paths.template_dir.clone())
        .with_rate_sleep(config.completion.rate_sleep_secs)
}

fn resume_run(config: &Config) -> Result<RunContext> {
    RunContext::resume(&config.paths.data_dir, &config.paths.run_id_file)
}

/// Create a new run and generate its scenarios
async fn run_scenarios(config: &Config, provider: &dyn CompletionProvider) -> Result<RunContext> {
    let ctx = RunContext::create(
        &config.paths.data_dir,
        &config.paths.run_id_file,
        provider.default_model(),
    )?;
    println!("Run ID: {}", ctx.run_id());

    generate_scenarios(
        &ctx,
        &stage_runner(config, provider),
        &config.paths.curriculum,
        &config.stages,
    )
    .await?;
    Ok(ctx)
}

fn run_validate(path: &std::path::Path) -> Result<ExitCode> {
    let report = validate_jsonl(path)?;
    for issue in &report.issues {
        println!("{}", issue);
    }
    println!("{}", report.summary());

    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Initialize tracing
///
/// Default level is INFO; RUST_LOG overrides it. Logs go to stderr so
/// stdout stays clean for reports.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
    // init() also bridges `log` records (reqwest, hyper) into tracing
}
