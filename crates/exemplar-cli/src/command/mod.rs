use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{classify::ClassifyArg, evaluate::EvaluateArg, holdout::HoldoutArg, train::TrainArg};

mod classify;
mod evaluate;
mod holdout;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train on a data file and classify the same instances again
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Measure accuracy over repeated random train/test splits
    Holdout(#[clap(flatten)] HoldoutArg),
    /// Train a model and save it as JSON
    Train(#[clap(flatten)] TrainArg),
    /// Classify instances with a saved model
    Classify(#[clap(flatten)] ClassifyArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing(args.verbose);
    match &args.mode {
        Mode::Evaluate(arg) => evaluate::run(arg)?,
        Mode::Holdout(arg) => holdout::run(arg)?,
        Mode::Train(arg) => train::run(arg)?,
        Mode::Classify(arg) => classify::run(arg)?,
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
