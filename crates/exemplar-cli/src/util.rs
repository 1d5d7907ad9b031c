use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use exemplar_model::{
    evaluation::Tally,
    instance::Instance,
    table::{self, TableOptions},
};

use crate::schema::saved_model::SavedModel;

/// JSON destination: a file when a path is given, stdout otherwise.
pub struct JsonSink {
    writer: Box<dyn Write>,
    destination: String,
}

impl JsonSink {
    pub fn open(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self {
                writer: Box::new(io::stdout().lock()),
                destination: "stdout".to_owned(),
            });
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self {
            writer: Box::new(BufWriter::new(file)),
            destination: path.display().to_string(),
        })
    }

    /// Writes `value` as pretty JSON followed by a newline and flushes.
    pub fn finish<T>(mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize + ?Sized,
    {
        serde_json::to_writer_pretty(&mut self.writer, value)
            .map_err(io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"))
            .and_then(|()| self.writer.flush())
            .with_context(|| format!("Failed to write JSON to {}", self.destination))
    }
}

pub fn write_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize + ?Sized,
{
    JsonSink::open(path)?.finish(value)
}

/// Delimited data file shared by the subcommands.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DataArg {
    /// Data file; the last column is the label
    pub data: PathBuf,
    /// Treat the first line as column names
    #[arg(long)]
    pub headers: bool,
    /// Column delimiter
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,
}

impl DataArg {
    pub fn load(&self) -> anyhow::Result<Vec<Instance>> {
        let options = TableOptions {
            headers: self.headers,
            delimiter: self.delimiter,
        };
        let instances = table::load_instances(&self.data, &options)
            .with_context(|| format!("Failed to load data file: {}", self.data.display()))?;
        eprintln!(
            "Loaded {} instances from {}",
            instances.len(),
            self.data.display()
        );
        Ok(instances)
    }
}

/// Read a saved model from a JSON file
pub fn read_model_file(path: &Path) -> anyhow::Result<SavedModel> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open model file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse model JSON file: {}", path.display()))
}

pub fn print_tally(tally: &Tally) {
    let percent = |value: Option<f64>| match value {
        Some(value) => format!("{:.2}%", value * 100.0),
        None => "n/a".to_owned(),
    };
    eprintln!("  Right:     {}", tally.right);
    eprintln!("  Wrong:     {}", tally.wrong);
    eprintln!("  Unknown:   {}", tally.unknown);
    eprintln!("  Precision: {}", percent(tally.precision()));
    eprintln!("  Accuracy:  {}", percent(tally.accuracy()));
    eprintln!("  Recall:    {}", percent(tally.recall()));
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_output_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&[1, 2], Some(path.as_path())).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "[\n  1,\n  2\n]\n");
    }

    #[test]
    fn test_read_model_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let err = read_model_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to open model file"));

        let mut file = File::create(&path).unwrap();
        file.write_all(b"{").unwrap();
        let err = read_model_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse model JSON file"));
    }

    #[test]
    fn test_data_arg_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.tsv");
        fs::write(&path, "x\ty\tlabel\n1\t2\ta\n").unwrap();
        let arg = DataArg {
            data: path,
            headers: true,
            delimiter: '\t',
        };
        let instances = arg.load().unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].classification.as_deref(), Some("a"));
    }
}
