//! A thin demonstration binary: load a JSON `Repo` snapshot, project it,
//! and print the resulting stack. Everything non-trivial lives in the
//! library; this exists only so the crate is runnable end to end.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use stackcore::forge::GitForgeState;
use stackcore::model::Repo;
use stackcore::projector;

#[derive(Parser, Debug)]
#[command(name = "stackcore", about = "Project a repo snapshot into a stack tree")]
struct Args {
    /// Path to a JSON-serialized `Repo` snapshot.
    #[arg(long)]
    snapshot: PathBuf,

    /// Path to a JSON-serialized `GitForgeState`, if PR annotations are wanted.
    #[arg(long)]
    forge: Option<PathBuf>,

    /// Override "now" for anything that wants it; unused by projection itself,
    /// kept for parity with the orchestrator's clock-injection contract.
    #[arg(long, default_value_t = 0)]
    now_ms: i64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!(now_ms = args.now_ms, "starting projection");

    let snapshot_raw = fs::read_to_string(&args.snapshot)?;
    let repo: Repo = serde_json::from_str(&snapshot_raw)?;

    let forge_state = match &args.forge {
        Some(path) => {
            let raw = fs::read_to_string(path)?;
            Some(serde_json::from_str::<GitForgeState>(&raw)?)
        }
        None => None,
    };

    match projector::project(&repo, forge_state.as_ref()) {
        Some(stack) => {
            println!("{}", serde_json::to_string_pretty(&stack)?);
        }
        None => {
            tracing::warn!("no trunk could be resolved from this snapshot");
            println!("null");
        }
    }

    Ok(())
}
