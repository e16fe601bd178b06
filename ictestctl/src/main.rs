// IC testing control CLI
// Inspects test tables and drives the registered environment

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ictest_rl_env::{list_envs, TestTable, IC_TESTING_ID};

mod rollout;

#[derive(Parser)]
#[command(name = "ictestctl")]
#[command(about = "IC testing RL environment CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the shape and label balance of a test table
    Inspect {
        /// Semicolon-separated table file
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Play episodes with actions sampled from the action space
    Rollout {
        /// Table file; defaults to DATA_PATH/TRAINING_FILE
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Registered environment id
        #[arg(long, default_value = IC_TESTING_ID)]
        env: String,

        /// Number of episodes
        #[arg(short = 'n', long, default_value = "10")]
        episodes: usize,

        /// Override the registered step cap
        #[arg(long)]
        max_steps: Option<usize>,

        /// Seed for action sampling
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered environments
    Envs,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { data } => inspect(&data)?,

        Commands::Rollout {
            data,
            env,
            episodes,
            max_steps,
            seed,
            json,
        } => {
            let options = rollout::RolloutOptions {
                env_id: env,
                data,
                episodes,
                max_steps,
                seed,
            };
            let summary = rollout::run(&options)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                summary.print();
            }
        }

        Commands::Envs => {
            for id in list_envs() {
                println!("{id}");
            }
        }
    }

    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let table = TestTable::load(path)
        .with_context(|| format!("Failed to load test table {}", path.display()))?;

    let duts = table.number_of_duts();
    let good = table.good_count();
    println!("Table: {}", path.display());
    println!("   DUTs:  {duts}");
    println!("   Tests: {}", table.number_of_tests());
    println!("   Good:  {good}");
    println!("   Bad:   {}", duts - good);

    Ok(())
}
