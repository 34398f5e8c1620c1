//! Persisted confirmation store.
//!
//! Confirmed variant keys are saved per input file set, so a manuscript
//! only asks about each variant once across sessions. Keys confirmed in
//! earlier sessions must be re-confirmed (automatically, on sight) each
//! run; stale keys for variants that no longer exist fall away.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use collapser_foundation::{Error, Result};
use sha2::{Digest, Sha256};

/// Confirmation keys for one input file set.
pub struct ConfirmStore {
    path: PathBuf,
    confirmed: HashMap<String, bool>,
    fresh: HashMap<String, bool>,
}

impl ConfirmStore {
    /// Opens the store for a file set, loading any prior confirmations.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing store file cannot be read or
    /// decoded.
    pub fn open(dir: impl AsRef<Path>, file_set_key: &str) -> Result<Self> {
        let path = dir.as_ref().join(file_set_key);
        let confirmed = if path.exists() {
            let file = File::open(&path)
                .map_err(|e| Error::io(format!("opening {}: {e}", path.display())))?;
            rmp_serde::from_read(BufReader::new(file))
                .map_err(|e| Error::serialization(format!("decoding {}: {e}", path.display())))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            confirmed,
            fresh: HashMap::new(),
        })
    }

    /// Derives a stable store key from the names of the input files.
    #[must_use]
    pub fn file_set_key<S: AsRef<str>>(files: &[S]) -> String {
        let mut hasher = Sha256::new();
        for file in files {
            hasher.update(file.as_ref().as_bytes());
            hasher.update(b"\n");
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }

    /// True when the key was confirmed in a previous session.
    #[must_use]
    pub fn is_confirmed(&self, key: &str) -> bool {
        self.confirmed.get(key).copied().unwrap_or(false)
    }

    /// Records a confirmation for this session.
    pub fn confirm(&mut self, key: impl Into<String>) {
        self.fresh.insert(key.into(), true);
    }

    /// Carries every prior confirmation into this session unseen. Used
    /// when rendering an excerpt that won't walk the whole manuscript.
    pub fn reconfirm_all(&mut self) {
        for key in self.confirmed.keys() {
            self.fresh.insert(key.clone(), true);
        }
    }

    /// Number of confirmations recorded this session.
    #[must_use]
    pub fn session_len(&self) -> usize {
        self.fresh.len()
    }

    /// Writes this session's confirmations, replacing the stored set.
    ///
    /// # Errors
    ///
    /// Returns an error when the store file cannot be written.
    pub fn finish(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("creating {}: {e}", parent.display())))?;
        }
        let encoded = rmp_serde::to_vec_named(&self.fresh)
            .map_err(|e| Error::serialization(e.to_string()))?;
        let file = File::create(&self.path)
            .map_err(|e| Error::io(format!("creating {}: {e}", self.path.display())))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(&encoded)
            .map_err(|e| Error::io(format!("writing {}: {e}", self.path.display())))?;
        writer
            .flush()
            .map_err(|e| Error::io(format!("writing {}: {e}", self.path.display())))?;
        Ok(())
    }
}
