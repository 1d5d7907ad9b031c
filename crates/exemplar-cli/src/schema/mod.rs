pub mod saved_model;
