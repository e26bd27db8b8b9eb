//! Persistence for installed license keys and trial eligibility.

use crate::error::{LicenseError, LicenseResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Holds the currently installed license key, if any.
pub trait LicenseKeyStore: Send + Sync {
    fn load(&self) -> LicenseResult<Option<Vec<u8>>>;
    fn save(&self, key: &[u8]) -> LicenseResult<()>;
    /// Removes the key. Removing a missing key is not an error.
    fn remove(&self) -> LicenseResult<()>;
}

/// Volatile key store (for testing and embedded use).
#[derive(Debug, Default)]
pub struct MemoryKeyStore {
    key: Mutex<Option<Vec<u8>>>,
}

impl MemoryKeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LicenseKeyStore for MemoryKeyStore {
    fn load(&self) -> LicenseResult<Option<Vec<u8>>> {
        Ok(self.key.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, key: &[u8]) -> LicenseResult<()> {
        *self.key.lock().unwrap_or_else(PoisonError::into_inner) = Some(key.to_vec());
        Ok(())
    }

    fn remove(&self) -> LicenseResult<()> {
        self.key.lock().unwrap_or_else(PoisonError::into_inner).take();
        Ok(())
    }
}

/// Stores the key in a single file.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Opens the store at `<data-local-dir>/<subject>/license.key`.
    pub fn for_subject(subject: &str) -> LicenseResult<Self> {
        Ok(Self::new(subject_dir(subject)?.join("license.key")))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LicenseKeyStore for FileKeyStore {
    fn load(&self) -> LicenseResult<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LicenseError::Storage(format!(
                "failed to read license key {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, key: &[u8]) -> LicenseResult<()> {
        ensure_parent(&self.path)?;
        std::fs::write(&self.path, key).map_err(|e| {
            LicenseError::Storage(format!(
                "failed to write license key {}: {e}",
                self.path.display()
            ))
        })
    }

    fn remove(&self) -> LicenseResult<()> {
        remove_if_exists(&self.path)
    }
}

/// Remembers whether the consumer may still receive a trial license.
pub trait EligibilityStore: Send + Sync {
    fn is_eligible(&self) -> bool;
    /// Marks the consumer as having received a trial.
    fn revoke(&self) -> LicenseResult<()>;
}

/// Volatile eligibility flag.
#[derive(Debug)]
pub struct MemoryEligibility {
    eligible: AtomicBool,
}

impl MemoryEligibility {
    #[must_use]
    pub fn new(eligible: bool) -> Self {
        Self {
            eligible: AtomicBool::new(eligible),
        }
    }
}

impl EligibilityStore for MemoryEligibility {
    fn is_eligible(&self) -> bool {
        self.eligible.load(Ordering::SeqCst)
    }

    fn revoke(&self) -> LicenseResult<()> {
        self.eligible.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Eligible while the marker file does not exist.
#[derive(Debug, Clone)]
pub struct FileEligibility {
    marker: PathBuf,
}

impl FileEligibility {
    pub fn new(marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Uses `<data-local-dir>/<subject>/trial.used` as the marker.
    pub fn for_subject(subject: &str) -> LicenseResult<Self> {
        Ok(Self::new(subject_dir(subject)?.join("trial.used")))
    }

    #[must_use]
    pub fn marker(&self) -> &Path {
        &self.marker
    }
}

impl EligibilityStore for FileEligibility {
    fn is_eligible(&self) -> bool {
        !self.marker.exists()
    }

    fn revoke(&self) -> LicenseResult<()> {
        ensure_parent(&self.marker)?;
        std::fs::write(&self.marker, chrono::Utc::now().to_rfc3339()).map_err(|e| {
            LicenseError::Storage(format!(
                "failed to write eligibility marker {}: {e}",
                self.marker.display()
            ))
        })
    }
}

fn subject_dir(subject: &str) -> LicenseResult<PathBuf> {
    let base = dirs::data_local_dir()
        .ok_or_else(|| LicenseError::Storage("no local data directory".to_string()))?;
    let name: String = subject
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    Ok(base.join(name))
}

fn ensure_parent(path: &Path) -> LicenseResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| {
                LicenseError::Storage(format!("failed to create {}: {e}", parent.display()))
            }),
        _ => Ok(()),
    }
}

fn remove_if_exists(path: &Path) -> LicenseResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LicenseError::Storage(format!(
            "failed to remove {}: {e}",
            path.display()
        ))),
    }
}
