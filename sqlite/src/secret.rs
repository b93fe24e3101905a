//! File-backed passphrase storage.
//!
//! The passphrase is generated once from the thread-local CSPRNG and written
//! next to the database. On unix the file is created owner-read/write only.

use basket_core::environment::{SecretError, SecretStore};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Length of generated passphrases
pub const PASSPHRASE_LEN: usize = 32;

/// Passphrase kept in a local file, created on first use.
#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    // Serializes create-or-read within the process
    guard: Mutex<()>,
}

impl FileSecretStore {
    /// Create a store reading from (or creating) the file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Location of the passphrase file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing(&self) -> Result<Vec<u8>, SecretError> {
        let contents = fs::read_to_string(&self.path)?;
        let secret = contents.trim();
        if secret.is_empty() {
            return Err(SecretError::Invalid(format!(
                "passphrase file {} is empty",
                self.path.display()
            )));
        }
        Ok(secret.as_bytes().to_vec())
    }

    fn create(&self) -> Result<Vec<u8>, SecretError> {
        let secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(PASSPHRASE_LEN)
            .map(char::from)
            .collect();

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path)?;
        file.write_all(secret.as_bytes())?;
        file.sync_all()?;

        tracing::info!(path = %self.path.display(), "Generated new database passphrase");
        Ok(secret.into_bytes())
    }
}

impl SecretStore for FileSecretStore {
    fn get_or_create_secret(&self) -> Result<Vec<u8>, SecretError> {
        let _lock = self
            .guard
            .lock()
            .map_err(|_| SecretError::Invalid("secret lock poisoned".to_string()))?;

        match self.read_existing() {
            Ok(secret) => Ok(secret),
            Err(SecretError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                match self.create() {
                    // Another process won the race
                    Err(SecretError::Io(e)) if e.kind() == ErrorKind::AlreadyExists => {
                        self.read_existing()
                    },
                    other => other,
                }
            },
            Err(e) => Err(e),
        }
    }
}
