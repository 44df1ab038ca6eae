//! Models directory holding the vectorizer/classifier pair.
//!
//! Every save writes a complete pair into a fresh generation directory and
//! then publishes it by replacing `current.json` with a single rename.
//! Readers resolve the pointer first and read both files from the one
//! generation it names, so a save in progress is invisible to them.
//!
//! ```text
//! models/
//! ├── current.json              {"generation":3}
//! ├── generation_00000002/      previous pair, kept for readers still on it
//! └── generation_00000003/
//!     ├── vectorizer.bin
//!     └── classifier.bin
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskProfilerError};
use crate::ml::classifier::TrainedClassifier;
use crate::ml::model::ModelPair;
use crate::ml::tfidf::TrainedVectorizer;
use crate::storage::codec::{self, ArtifactKind};

/// File name of the persisted vectorizer.
pub const VECTORIZER_FILE: &str = "vectorizer.bin";

/// File name of the persisted classifier.
pub const CLASSIFIER_FILE: &str = "classifier.bin";

/// Pointer naming the published generation.
pub const CURRENT_FILE: &str = "current.json";

const GENERATION_PREFIX: &str = "generation_";

/// How many times a load restarts when its generation is pruned mid-read.
const LOAD_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct CurrentPointer {
    generation: u64,
}

fn generation_name(generation: u64) -> String {
    format!("{GENERATION_PREFIX}{generation:08x}")
}

fn parse_generation(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)
        .and_then(|hex| u64::from_str_radix(hex, 16).ok())
}

/// A directory that stores one published [`ModelPair`].
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Use `dir` as the models directory. Nothing is touched until
    /// [`save`](Self::save) or [`load`](Self::load).
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        ArtifactStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The models directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn current_path(&self) -> PathBuf {
        self.dir.join(CURRENT_FILE)
    }

    /// Directory holding the pair of `generation`.
    pub fn generation_dir(&self, generation: u64) -> PathBuf {
        self.dir.join(generation_name(generation))
    }

    /// The published generation.
    ///
    /// Returns [`RiskProfilerError::ArtifactsMissing`] when nothing has been
    /// published yet.
    pub fn current_generation(&self) -> Result<u64> {
        let bytes = match fs::read(self.current_path()) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no {CURRENT_FILE} in {}", self.dir.display());
                return Err(RiskProfilerError::ArtifactsMissing);
            }
            Err(e) => return Err(e.into()),
        };
        let pointer: CurrentPointer = serde_json::from_slice(&bytes).map_err(|e| {
            RiskProfilerError::artifact(format!("{CURRENT_FILE} is corrupt: {e}"))
        })?;
        Ok(pointer.generation)
    }

    /// Path of the published vectorizer.
    pub fn vectorizer_path(&self) -> Result<PathBuf> {
        Ok(self
            .generation_dir(self.current_generation()?)
            .join(VECTORIZER_FILE))
    }

    /// Path of the published classifier.
    pub fn classifier_path(&self) -> Result<PathBuf> {
        Ok(self
            .generation_dir(self.current_generation()?)
            .join(CLASSIFIER_FILE))
    }

    /// Whether a generation is published and both of its files are present.
    pub fn exists(&self) -> bool {
        match self.current_generation() {
            Ok(generation) => {
                let dir = self.generation_dir(generation);
                dir.join(VECTORIZER_FILE).is_file() && dir.join(CLASSIFIER_FILE).is_file()
            }
            Err(_) => false,
        }
    }

    /// Generation numbers of every generation directory on disk, ascending.
    pub fn generations(&self) -> Result<Vec<u64>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut generations = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(generation) = entry.file_name().to_str().and_then(parse_generation) {
                generations.push(generation);
            }
        }
        generations.sort_unstable();
        Ok(generations)
    }

    /// Persist a model pair as a new generation and publish it, replacing the
    /// pair readers see in one step. Returns the new generation number.
    ///
    /// Both files are fully written and synced before the pointer moves, so a
    /// failure at any point leaves the previously published pair in effect.
    pub fn save(&self, pair: &ModelPair) -> Result<u64> {
        fs::create_dir_all(&self.dir)?;

        let vectorizer_bytes = codec::encode(ArtifactKind::Vectorizer, pair.vectorizer())?;
        let classifier_bytes = codec::encode(ArtifactKind::Classifier, pair.classifier())?;

        let previous = self.current_generation().ok();
        // Directories above the pointer are leftovers of interrupted saves.
        let generation = self
            .generations()?
            .into_iter()
            .chain(previous)
            .max()
            .unwrap_or(0)
            + 1;

        let generation_dir = self.generation_dir(generation);
        fs::create_dir(&generation_dir)?;
        for (name, bytes) in [
            (VECTORIZER_FILE, &vectorizer_bytes),
            (CLASSIFIER_FILE, &classifier_bytes),
        ] {
            let path = generation_dir.join(name);
            let tmp = codec::write_temp(&path, bytes)?;
            codec::publish(&tmp, &path)?;
        }
        sync_dir(&generation_dir);

        let pointer = serde_json::to_vec(&CurrentPointer { generation })?;
        let current = self.current_path();
        let tmp = codec::write_temp(&current, &pointer)?;
        codec::publish(&tmp, &current)?;
        sync_dir(&self.dir);

        self.prune(generation, previous);

        log::info!(
            "published model generation {generation} in {} ({} + {} bytes)",
            self.dir.display(),
            vectorizer_bytes.len(),
            classifier_bytes.len()
        );
        Ok(generation)
    }

    /// Remove every generation except the published one and the one it
    /// replaced. Failures only cost disk space, so they are logged.
    fn prune(&self, current: u64, previous: Option<u64>) {
        let generations = match self.generations() {
            Ok(generations) => generations,
            Err(e) => {
                log::warn!("cannot list model generations in {}: {e}", self.dir.display());
                return;
            }
        };

        for generation in generations {
            if generation == current || Some(generation) == previous {
                continue;
            }
            let dir = self.generation_dir(generation);
            match fs::remove_dir_all(&dir) {
                Ok(()) => log::debug!("removed model generation {generation}"),
                Err(e) => log::warn!("cannot remove {}: {e}", dir.display()),
            }
        }
    }

    /// Load and validate the published model pair.
    ///
    /// Returns [`RiskProfilerError::ArtifactsMissing`] when nothing is
    /// published or a file of the published generation is absent, and an
    /// artifact or compatibility error when the files cannot be used
    /// together.
    pub fn load(&self) -> Result<ModelPair> {
        let mut attempt = 1;
        loop {
            let generation = self.current_generation()?;
            match self.load_generation(generation) {
                Err(RiskProfilerError::ArtifactsMissing)
                    if attempt < LOAD_ATTEMPTS
                        && self.current_generation().ok() != Some(generation) =>
                {
                    log::debug!("model generation {generation} was replaced while loading, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Load and validate the pair of one generation.
    pub fn load_generation(&self, generation: u64) -> Result<ModelPair> {
        let dir = self.generation_dir(generation);
        let vectorizer_bytes = read_artifact(&dir.join(VECTORIZER_FILE))?;
        let classifier_bytes = read_artifact(&dir.join(CLASSIFIER_FILE))?;

        let vectorizer: TrainedVectorizer =
            codec::decode(ArtifactKind::Vectorizer, &vectorizer_bytes)?;
        let classifier: TrainedClassifier =
            codec::decode(ArtifactKind::Classifier, &classifier_bytes)?;

        let pair = ModelPair::new(vectorizer, classifier)?;
        log::debug!(
            "loaded model generation {generation} from {} (vocabulary size {})",
            self.dir.display(),
            pair.vectorizer().dimension()
        );
        Ok(pair)
    }
}

/// Make completed renames durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = fs::File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("artifact {} not found", path.display());
            Err(RiskProfilerError::ArtifactsMissing)
        }
        Err(e) => Err(e.into()),
    }
}
