//! Named-feature model interface, data loading and evaluation for the
//! exemplar learner.
//!
//! # Modules
//!
//! - [`instance`]: Instances described by named numeric or text features
//! - [`model`]: The [`Model`](model::Model) trait and its learner-backed implementation
//! - [`table`]: Delimited tabular data reader producing labeled instances
//! - [`evaluation`]: Resubstitution and repeated holdout accuracy measurement
//!
//! # Data Flow
//!
//! ```text
//! Delimited file
//!     ↓ table::load_instances
//! Instance (named features + label)
//!     ↓ Model::add_training_instance
//! LearnerModel ──wraps──> Learner
//!     ↓ Model::classify
//! Instance (classification, confidence, distribution)
//! ```
//!
//! # Examples
//!
//! ```
//! use exemplar_model::{
//!     evaluation,
//!     model::{LearnerModel, Model as _},
//!     table::{TableOptions, read_instances},
//! };
//!
//! let data = "red,round,apple\ngreen,round,apple\nyellow,long,banana\ngreen,long,banana\n";
//! let instances = read_instances(data.as_bytes(), &TableOptions::default())?;
//!
//! let mut model = LearnerModel::new();
//! model.add_training_instances(&instances)?;
//! model.train()?;
//!
//! let tally = evaluation::resubstitution(&model, &instances)?;
//! assert_eq!(tally.right, 4);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod evaluation;
pub mod instance;
pub mod model;
pub mod table;
