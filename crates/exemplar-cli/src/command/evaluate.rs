use std::time::Instant;

use anyhow::Context;
use exemplar_model::{
    evaluation,
    model::{LearnerModel, Model as _},
};

use crate::util::{self, DataArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    #[clap(flatten)]
    data: DataArg,
    /// Leave instances unclassified below this confidence
    #[arg(long, default_value_t = 0.0)]
    min_confidence: f64,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        data,
        min_confidence,
    } = arg;
    let instances = data.load()?;

    let start = Instant::now();
    let mut model = LearnerModel::new();
    model
        .add_training_instances(&instances)
        .context("Failed to train model")?;
    model.train()?;
    eprintln!("Trained in {:.3?}", start.elapsed());

    let start = Instant::now();
    let bytes = model.export().context("Failed to export model")?;
    let mut restored = LearnerModel::new().with_min_confidence(*min_confidence);
    restored.load(&bytes).context("Failed to load exported model")?;
    eprintln!(
        "Exported and reloaded {} bytes in {:.3?}",
        bytes.len(),
        start.elapsed()
    );

    let start = Instant::now();
    let tally = evaluation::resubstitution(&restored, &instances)?;
    eprintln!(
        "Classified {} instances in {:.3?}",
        tally.total(),
        start.elapsed()
    );

    eprintln!("Resubstitution:");
    util::print_tally(&tally);
    Ok(())
}
