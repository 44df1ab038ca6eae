//! Persistence of trained models.
//!
//! A training run produces two artifacts, the fitted vectorizer and the
//! fitted classifier. They are written side by side into a generation
//! directory and published together by moving a pointer file; see
//! [`artifacts`] for the directory layout.
//!
//! Each file is a small fixed header followed by a bincode payload; see
//! [`codec`] for the layout. [`ArtifactStore`] owns the directory and only
//! ever hands out a validated [`ModelPair`](crate::ml::ModelPair).

pub mod artifacts;
pub mod codec;

pub use artifacts::{ArtifactStore, CLASSIFIER_FILE, CURRENT_FILE, VECTORIZER_FILE};
pub use codec::{ArtifactKind, FORMAT_VERSION};

use std::path::Path;

use crate::error::Result;
use crate::ml::model::ModelPair;

/// Publish `pair` in `dir`, replacing any previous pair. Returns the new
/// generation number.
pub fn save_pair<P: AsRef<Path>>(dir: P, pair: &ModelPair) -> Result<u64> {
    ArtifactStore::new(dir).save(pair)
}

/// Load the validated pair stored in `dir`.
pub fn load_pair<P: AsRef<Path>>(dir: P) -> Result<ModelPair> {
    ArtifactStore::new(dir).load()
}
