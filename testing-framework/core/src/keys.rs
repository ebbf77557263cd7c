use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr as _,
};

use solana_sdk::{
    pubkey::Pubkey,
    signer::{
        Signer as _,
        keypair::{Keypair, read_keypair_file},
    },
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("no key material for '{label}' in {}", .dir.display())]
    Missing { label: String, dir: PathBuf },
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} does not hold a base58 public key as a JSON string", .path.display())]
    InvalidPublicKey { path: PathBuf },
    #[error("failed to read keypair {}: {message}", .path.display())]
    InvalidKeypair { path: PathBuf, message: String },
}

/// Directory of named key files.
///
/// `<label>.json` is a CLI keypair (JSON array of 64 bytes) and
/// `<label>_pub.json` a base58 public key stored as a JSON string.
#[derive(Clone, Debug)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn keypair_path(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}.json"))
    }

    #[must_use]
    pub fn public_key_path(&self, label: &str) -> PathBuf {
        self.dir.join(format!("{label}_pub.json"))
    }

    /// Public key for `label`, falling back to the keypair file when no public
    /// key file exists.
    pub fn load_public_key(&self, label: &str) -> Result<Pubkey, KeyStoreError> {
        let path = self.public_key_path(label);
        if path.is_file() {
            return read_public_key(&path);
        }

        if self.keypair_path(label).is_file() {
            return self.load_keypair(label).map(|keypair| keypair.pubkey());
        }

        Err(KeyStoreError::Missing {
            label: label.to_owned(),
            dir: self.dir.clone(),
        })
    }

    pub fn load_keypair(&self, label: &str) -> Result<Keypair, KeyStoreError> {
        let path = self.keypair_path(label);
        if !path.is_file() {
            return Err(KeyStoreError::Missing {
                label: label.to_owned(),
                dir: self.dir.clone(),
            });
        }

        read_keypair_file(&path).map_err(|err| KeyStoreError::InvalidKeypair {
            path,
            message: err.to_string(),
        })
    }
}

fn read_public_key(path: &Path) -> Result<Pubkey, KeyStoreError> {
    let raw = fs::read_to_string(path).map_err(|source| KeyStoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str::<String>(&raw)
        .ok()
        .and_then(|encoded| Pubkey::from_str(&encoded).ok())
        .ok_or_else(|| KeyStoreError::InvalidPublicKey {
            path: path.to_path_buf(),
        })
}
