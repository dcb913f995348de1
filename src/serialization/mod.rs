//! Helpers for (de)serialising trained models.

pub mod json;

pub use json::{load_model, model_from_json, model_json, save_model};
