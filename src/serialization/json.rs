//! Versioned JSON format storing a model's configuration, vocabulary, and merges.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::TrainerConfig;
use crate::error::{Result, WbpeError};
use crate::model::{BpeModel, Pair};
use crate::vocab::{Symbol, Vocabulary};

/// Format tag written into every serialised model.
pub const FORMAT: &str = "wbpe";
/// Current on-disk format version.
pub const VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ModelFile {
    format: String,
    version: u32,
    config: TrainerConfig,
    vocab: Vec<Symbol>,
    merges: Vec<Pair>,
}

/// Serialises a model to a JSON string.
pub fn model_json(model: &BpeModel, pretty: bool) -> Result<String> {
    let file = ModelFile {
        format: FORMAT.to_string(),
        version: VERSION,
        config: model.trainer_config().clone(),
        vocab: model.vocab().symbols().to_vec(),
        merges: model.merges().to_vec(),
    };
    let json = if pretty {
        serde_json::to_string_pretty(&file)?
    } else {
        serde_json::to_string(&file)?
    };
    Ok(json)
}

/// Reconstructs a model from its JSON representation.
///
/// The stored configuration is re-validated and every merge pair is checked
/// against the vocabulary bounds, so a tampered or truncated file fails
/// loading instead of producing a tokenizer that panics later.
pub fn model_from_json(json: &str) -> Result<BpeModel> {
    let file: ModelFile = serde_json::from_str(json)?;
    if file.format != FORMAT {
        return Err(WbpeError::Serialization(format!(
            "unsupported format tag {:?}; expected {FORMAT:?}",
            file.format
        )));
    }
    if file.version != VERSION {
        return Err(WbpeError::Serialization(format!(
            "unsupported format version {}; expected {VERSION}",
            file.version
        )));
    }
    file.config.validate()?;
    let vocab = Vocabulary::from_symbols(
        file.vocab,
        &file.config.end_of_word_marker,
        &file.config.unknown_token,
    )?;
    for &(left, right) in &file.merges {
        if left as usize >= vocab.len() || right as usize >= vocab.len() {
            return Err(WbpeError::Serialization(format!(
                "merge pair ({left}, {right}) references ids outside a vocabulary of {} entries",
                vocab.len()
            )));
        }
    }
    Ok(BpeModel::new(vocab, file.merges, file.config))
}

/// Persists a model to `path` as JSON.
pub fn save_model<P: AsRef<Path>>(model: &BpeModel, path: P) -> Result<()> {
    let json = model_json(model, false)?;
    fs::write(path.as_ref(), json)
        .map_err(|err| WbpeError::io(err, Some(path.as_ref().to_path_buf())))
}

/// Loads a model previously written with [`save_model`].
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<BpeModel> {
    let json = fs::read_to_string(path.as_ref())
        .map_err(|err| WbpeError::io(err, Some(path.as_ref().to_path_buf())))?;
    model_from_json(&json)
}
