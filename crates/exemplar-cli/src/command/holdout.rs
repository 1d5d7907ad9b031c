use exemplar_model::evaluation::{self, HoldoutConfig};

use crate::util::{self, DataArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct HoldoutArg {
    #[clap(flatten)]
    data: DataArg,
    /// Fraction of instances used for training in each round
    #[arg(long, default_value_t = 0.8)]
    training_fraction: f64,
    /// Number of train/test rounds
    #[arg(long, default_value_t = 100)]
    repeat: usize,
    /// Leave instances unclassified below this confidence
    #[arg(long, default_value_t = 0.0)]
    min_confidence: f64,
    /// Seed for shuffling instances
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

pub(crate) fn run(arg: &HoldoutArg) -> anyhow::Result<()> {
    let HoldoutArg {
        data,
        training_fraction,
        repeat,
        min_confidence,
        seed,
    } = arg;
    anyhow::ensure!(
        (0.0..=1.0).contains(training_fraction),
        "training fraction must be within 0.0..=1.0, got {training_fraction}"
    );

    let instances = data.load()?;
    let config = HoldoutConfig {
        training_fraction: *training_fraction,
        repeat: *repeat,
        min_confidence: *min_confidence,
        seed: *seed,
    };
    let report = evaluation::repeated_holdout(&instances, &config)?;

    eprintln!(
        "Holdout: {repeat} rounds, {} training / {} test instances",
        report.num_training, report.num_test
    );
    util::print_tally(&report.tally);
    if let Some(accuracy) = &report.round_accuracy {
        eprintln!("  Round accuracy:");
        eprintln!("    Min:    {:.4}", accuracy.min);
        eprintln!("    Max:    {:.4}", accuracy.max);
        eprintln!("    Mean:   {:.4}", accuracy.mean);
        eprintln!("    StdDev: {:.4}", accuracy.std_dev);
    }
    Ok(())
}
