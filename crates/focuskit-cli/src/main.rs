//! focuskit CLI: run the battery in a terminal, simulate it, or re-analyze results.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use focuskit_core::simulate::ParticipantProfile;

mod commands;

#[derive(Parser)]
#[command(
    name = "focuskit",
    version,
    about = "Timed cognitive test battery with an AI-written summary"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take the battery interactively in this terminal
    Run {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Seed for stimulus randomness
        #[arg(long)]
        seed: Option<u64>,

        /// Directory for the session report (default: output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Recorded voice sample to send to the speech service
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Analysis provider name (default: default_provider from config)
        #[arg(long)]
        provider: Option<String>,

        /// Use the offline analysis instead of a remote provider
        #[arg(long)]
        offline: bool,
    },

    /// Run the battery with a scripted participant
    Simulate {
        /// Participant profile: steady or distracted
        #[arg(long, default_value = "steady")]
        profile: ParticipantProfile,

        /// Seed for stimulus and participant randomness
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Directory for the session report (default: output_dir from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print every display cue the battery emitted
        #[arg(long)]
        transcript: bool,

        /// Analysis provider name (default: default_provider from config)
        #[arg(long)]
        provider: Option<String>,

        /// Use the offline analysis instead of a remote provider
        #[arg(long)]
        offline: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Request a narrative for saved results
    Analyze {
        /// Session report or aggregate result JSON
        #[arg(long)]
        results: PathBuf,

        /// Write the updated session report here
        #[arg(long)]
        output: Option<PathBuf>,

        /// Analysis provider name (default: default_provider from config)
        #[arg(long)]
        provider: Option<String>,

        /// Use the offline analysis instead of a remote provider
        #[arg(long)]
        offline: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List Gemini models that can generate content
    Models {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter focuskit.toml
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("focuskit=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            seed,
            output,
            audio,
            provider,
            offline,
        } => {
            commands::run::execute(commands::run::RunArgs {
                config,
                seed,
                output,
                audio,
                provider,
                offline,
            })
            .await
        }
        Commands::Simulate {
            profile,
            seed,
            output,
            transcript,
            provider,
            offline,
            config,
        } => {
            commands::simulate::execute(
                profile, seed, output, transcript, provider, offline, config,
            )
            .await
        }
        Commands::Analyze {
            results,
            output,
            provider,
            offline,
            config,
        } => commands::analyze::execute(results, output, provider, offline, config).await,
        Commands::Models { config } => commands::models::execute(config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
