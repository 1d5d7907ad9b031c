use std::path::PathBuf;

use exemplar_model::{evaluation::Tally, instance::Instance, model::Model as _};

use crate::util::{self, DataArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ClassifyArg {
    /// Saved model file
    model: PathBuf,
    #[clap(flatten)]
    data: DataArg,
    /// Leave instances unclassified below this confidence
    #[arg(long, default_value_t = 0.0)]
    min_confidence: f64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ClassifyArg) -> anyhow::Result<()> {
    let ClassifyArg {
        model,
        data,
        min_confidence,
        output,
    } = arg;

    let saved = util::read_model_file(model)?;
    let model = saved.to_model(*min_confidence)?;
    eprintln!(
        "Loaded model {} ({} experiences, trained at {})",
        saved.name, saved.num_experiences, saved.trained_at
    );

    let instances = data.load()?;
    let mut classified = instances.iter().map(Instance::unlabeled).collect::<Vec<_>>();
    model.classify_all(&mut classified)?;

    let mut tally = Tally::default();
    for (instance, query) in instances.iter().zip(&classified) {
        if let Some(expected) = &instance.classification {
            tally.record(expected, query.classification.as_deref());
        }
    }
    util::write_json(&classified, output.as_deref())?;

    eprintln!("Classified {} instances", classified.len());
    util::print_tally(&tally);
    Ok(())
}
