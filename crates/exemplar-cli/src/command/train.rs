use std::path::PathBuf;

use anyhow::Context;
use exemplar_model::model::{LearnerModel, Model as _};

use crate::{
    schema::saved_model::SavedModel,
    util::{self, DataArg},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    #[clap(flatten)]
    data: DataArg,
    /// Model name; defaults to the data file name
    #[arg(long)]
    name: Option<String>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg { data, name, output } = arg;
    let instances = data.load()?;

    let mut model = LearnerModel::new();
    model
        .add_training_instances(&instances)
        .context("Failed to train model")?;
    model.train()?;

    let name = name.clone().unwrap_or_else(|| {
        data.data
            .file_stem()
            .map_or_else(|| "model".to_owned(), |stem| stem.to_string_lossy().into_owned())
    });
    let saved = SavedModel::from_model(name, &model);
    util::write_json(&saved, output.as_deref())?;

    eprintln!();
    eprintln!("Model saved successfully");
    if let Some(path) = output {
        eprintln!("  Path: {}", path.display());
    }
    eprintln!("  Name: {}", saved.name);
    eprintln!("  Trained at: {}", saved.trained_at);
    eprintln!("  Experiences: {}", saved.num_experiences);
    if let Some(arity) = saved.feature_arity {
        eprintln!("  Features: {arity}");
    }

    Ok(())
}
