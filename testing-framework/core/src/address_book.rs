use std::{
    collections::BTreeMap,
    fs,
    io::Write as _,
    path::{Path, PathBuf},
    str::FromStr as _,
};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

pub const ADDRESS_BOOK_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum AddressBookError {
    #[error("address book io failed for {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("address book {} is not valid JSON", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("address book {} has version {found}, expected {}", .path.display(), ADDRESS_BOOK_VERSION)]
    UnsupportedVersion { path: PathBuf, found: u32 },
    #[error("slot '{slot}' holds '{value}', which is not a base58 address")]
    InvalidAddress { slot: String, value: String },
}

/// What a [`AddressBook::record`] call did to the stored mapping.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteOutcome {
    Inserted,
    Unchanged,
    Replaced { previous: Pubkey },
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: u32,
    addresses: BTreeMap<String, String>,
}

/// Versioned mapping from slot names to ledger addresses, persisted as one
/// JSON document. Writes are last-write-wins and replace the file atomically.
#[derive(Debug)]
pub struct AddressBook {
    path: PathBuf,
    addresses: BTreeMap<String, Pubkey>,
    slot_files: Option<PathBuf>,
}

impl AddressBook {
    /// Load the book at `path`, or start an empty one if the file is absent.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AddressBookError> {
        let path = path.into();
        let addresses = if path.is_file() {
            load(&path)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            addresses,
            slot_files: None,
        })
    }

    /// Also mirror every slot to `<dir>/<slot>_pub.json`.
    #[must_use]
    pub fn with_slot_files(mut self, dir: impl Into<PathBuf>) -> Self {
        self.slot_files = Some(dir.into());
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn get(&self, slot: &str) -> Option<Pubkey> {
        self.addresses.get(slot).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Store `address` under `slot` and persist. Recording an identical value
    /// again only restores files that are missing on disk.
    pub fn record(&mut self, slot: &str, address: Pubkey) -> Result<WriteOutcome, AddressBookError> {
        let outcome = match self.addresses.get(slot) {
            None => WriteOutcome::Inserted,
            Some(previous) if *previous == address => WriteOutcome::Unchanged,
            Some(previous) => WriteOutcome::Replaced {
                previous: *previous,
            },
        };

        if outcome != WriteOutcome::Unchanged || !self.path.is_file() {
            let mut next = self.addresses.clone();
            next.insert(slot.to_owned(), address);
            self.persist(&next)?;
            self.addresses = next;
        }

        if let Some(dir) = &self.slot_files {
            let mirror = dir.join(format!("{slot}_pub.json"));
            if outcome != WriteOutcome::Unchanged || !mirror.is_file() {
                let contents = serde_json::to_string(&address.to_string()).map_err(|source| {
                    AddressBookError::Parse {
                        path: mirror.clone(),
                        source,
                    }
                })?;
                write_atomic(&mirror, contents.as_bytes())?;
            }
        }

        debug!(slot, %address, ?outcome, "address recorded");
        Ok(outcome)
    }

    fn persist(&self, addresses: &BTreeMap<String, Pubkey>) -> Result<(), AddressBookError> {
        let document = Document {
            version: ADDRESS_BOOK_VERSION,
            addresses: addresses
                .iter()
                .map(|(slot, key)| (slot.clone(), key.to_string()))
                .collect(),
        };
        let contents =
            serde_json::to_vec_pretty(&document).map_err(|source| AddressBookError::Parse {
                path: self.path.clone(),
                source,
            })?;
        write_atomic(&self.path, &contents)
    }
}

/// Slot for a per-token address, e.g. `slot_name("alice", "X") == "alice_x"`.
#[must_use]
pub fn slot_name(prefix: &str, token: &str) -> String {
    format!("{prefix}_{}", token.to_lowercase())
}

fn load(path: &Path) -> Result<BTreeMap<String, Pubkey>, AddressBookError> {
    let raw = fs::read(path).map_err(|source| AddressBookError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Document =
        serde_json::from_slice(&raw).map_err(|source| AddressBookError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if document.version != ADDRESS_BOOK_VERSION {
        return Err(AddressBookError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: document.version,
        });
    }

    document
        .addresses
        .into_iter()
        .map(|(slot, value)| match Pubkey::from_str(&value) {
            Ok(key) => Ok((slot, key)),
            Err(_) => Err(AddressBookError::InvalidAddress { slot, value }),
        })
        .collect()
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), AddressBookError> {
    let io_err = |source| AddressBookError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(io_err)?;

    let mut file = NamedTempFile::new_in(&dir).map_err(io_err)?;
    file.write_all(contents).map_err(io_err)?;
    file.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}
