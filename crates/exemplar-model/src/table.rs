//! Delimited tabular data reader.
//!
//! Each non-blank line is one instance. The last column holds the label,
//! every other column a feature. Cells that parse as numbers become numeric
//! features, other cells text features (see [`FeatureValue::parse`]).
//!
//! With [`TableOptions::headers`] set, the first line names the feature
//! columns, and each feature name may appear only once. Otherwise columns are
//! named by position (`feature_000`, ...).
//!
//! ```
//! use exemplar_model::{instance::FeatureValue, table::{TableOptions, read_instances}};
//!
//! let data = "length,color,kind\n4.5,red,apple\n\n12,yellow,banana\n";
//! let options = TableOptions { headers: true, ..TableOptions::default() };
//! let instances = read_instances(data.as_bytes(), &options)?;
//!
//! assert_eq!(instances.len(), 2);
//! assert_eq!(instances[1].features["length"], FeatureValue::Number(12.0));
//! assert_eq!(instances[1].classification.as_deref(), Some("banana"));
//! # Ok::<(), exemplar_model::table::TableError>(())
//! ```

use std::{
    collections::{BTreeMap, HashSet},
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::{
    instance::{FeatureValue, Instance},
    model::feature_name,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TableError {
    #[display("failed to read table data")]
    Io(io::Error),
    #[display("line {line}: expected {expected} columns, found {actual}")]
    RaggedRow {
        line: usize,
        expected: usize,
        actual: usize,
    },
    #[display("line {line}: rows need at least one feature column and a label column")]
    TooFewColumns { line: usize },
    #[display("column name {name:?} appears more than once in the header")]
    DuplicateColumn { name: String },
}

impl From<io::Error> for TableError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Treat the first line as column names.
    pub headers: bool,
    pub delimiter: char,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            headers: false,
            delimiter: ',',
        }
    }
}

/// Reads instances from the delimited file at `path`.
pub fn load_instances<P>(path: P, options: &TableOptions) -> Result<Vec<Instance>, TableError>
where
    P: AsRef<Path>,
{
    let file = File::open(path)?;
    read_instances(BufReader::new(file), options)
}

/// Reads instances from delimited text.
pub fn read_instances<R>(reader: R, options: &TableOptions) -> Result<Vec<Instance>, TableError>
where
    R: BufRead,
{
    let mut columns: Option<usize> = None;
    let mut names: Vec<String> = vec![];
    let mut instances = vec![];

    for (i, line) in reader.lines().enumerate() {
        let line_number = i + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let cells = line.split(options.delimiter).collect::<Vec<_>>();
        match columns {
            None => {
                if cells.len() < 2 {
                    return Err(TableError::TooFewColumns { line: line_number });
                }
                columns = Some(cells.len());
                if options.headers {
                    names = header_names(&cells[..cells.len() - 1])?;
                    continue;
                }
                names = (0..cells.len()).map(feature_name).collect();
            }
            Some(expected) if expected != cells.len() => {
                return Err(TableError::RaggedRow {
                    line: line_number,
                    expected,
                    actual: cells.len(),
                });
            }
            Some(_) => {}
        }

        let Some((label, feature_cells)) = cells.split_last() else {
            continue;
        };
        let features = names
            .iter()
            .zip(feature_cells)
            .map(|(name, cell)| (name.clone(), FeatureValue::parse(cell)))
            .collect::<BTreeMap<_, _>>();
        instances.push(Instance::labeled(features, label.trim()));
    }

    tracing::debug!(
        instances = instances.len(),
        columns = ?columns,
        "read table"
    );
    Ok(instances)
}

fn header_names(cells: &[&str]) -> Result<Vec<String>, TableError> {
    let mut seen = HashSet::new();
    cells
        .iter()
        .map(|cell| {
            let name = cell.trim();
            if seen.insert(name) {
                Ok(name.to_owned())
            } else {
                Err(TableError::DuplicateColumn {
                    name: name.to_owned(),
                })
            }
        })
        .collect()
}
