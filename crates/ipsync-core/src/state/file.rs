// # File Address Store
//
// File-based implementation of AddressStore.
//
// ## File Format
//
// The file holds exactly the address string (e.g. `203.0.113.9:51012`), with
// no trailing newline. Surrounding whitespace is ignored on load so a
// hand-edited file still compares equal.
//
// ## Crash Safety
//
// - Atomic writes: new content goes to `<name>.tmp`, is synced, then renamed
//   over the original
// - Permissions of the existing file are carried over to the replacement

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::address_store::AddressStore;

/// Address store backed by a plain text file
///
/// # Example
///
/// ```rust,no_run
/// use ipsync_core::state::FileAddressStore;
/// use ipsync_core::traits::AddressStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileAddressStore::open("/var/lib/ipsync/address").await?;
///
///     println!("last known: {}", store.load().await?);
///     store.store("203.0.113.9:51012").await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileAddressStore {
    path: PathBuf,
    temp_path: PathBuf,
}

impl FileAddressStore {
    /// Open an existing address file
    ///
    /// The file must already exist: a missing file at startup means the
    /// listener has no baseline to compare against, which is a configuration
    /// error rather than an empty address.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        let metadata = fs::metadata(&path).await.map_err(|e| {
            Error::config(format!(
                "Address file {} is not accessible: {}",
                path.display(),
                e
            ))
        })?;

        if !metadata.is_file() {
            return Err(Error::config(format!(
                "Address file {} is not a regular file",
                path.display()
            )));
        }

        let temp_path = Self::temp_path_for(&path)?;
        Ok(Self { path, temp_path })
    }

    /// Path of the address file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<dir>/<name>.tmp`, next to the target so the rename stays on one
    /// filesystem
    fn temp_path_for(path: &Path) -> Result<PathBuf, Error> {
        let name = path.file_name().ok_or_else(|| {
            Error::config(format!("Address file path {} has no file name", path.display()))
        })?;

        let mut temp_name = OsString::from(name);
        temp_name.push(".tmp");
        Ok(path.with_file_name(temp_name))
    }

    /// Write and sync `address` to the temp file
    async fn write_temp(&self, address: &str) -> Result<(), Error> {
        let mut file = fs::File::create(&self.temp_path).await.map_err(|e| {
            Error::address_store(format!(
                "Failed to create temp file {}: {}",
                self.temp_path.display(),
                e
            ))
        })?;

        file.write_all(address.as_bytes()).await.map_err(|e| {
            Error::address_store(format!(
                "Failed to write to temp file {}: {}",
                self.temp_path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            Error::address_store(format!(
                "Failed to sync temp file {}: {}",
                self.temp_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    async fn write_atomically(&self, address: &str) -> Result<(), Error> {
        if let Err(e) = self.write_temp(address).await {
            let _ = fs::remove_file(&self.temp_path).await;
            return Err(e);
        }

        match fs::metadata(&self.path).await {
            Ok(metadata) => {
                let permissions = metadata.permissions();
                if let Err(e) = fs::set_permissions(&self.temp_path, permissions).await {
                    tracing::warn!(
                        "Failed to copy permissions to {}: {}",
                        self.temp_path.display(),
                        e
                    );
                }
            }
            Err(e) => tracing::warn!("Address file {} vanished: {}", self.path.display(), e),
        }

        if let Err(e) = fs::rename(&self.temp_path, &self.path).await {
            let _ = fs::remove_file(&self.temp_path).await;
            return Err(Error::address_store(format!(
                "Failed to rename {} to {}: {}",
                self.temp_path.display(),
                self.path.display(),
                e
            )));
        }

        tracing::trace!("Address written to file: {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl AddressStore for FileAddressStore {
    async fn load(&self) -> Result<String, Error> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::address_store(format!(
                "Failed to read address file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(content.trim().to_string())
    }

    async fn store(&self, address: &str) -> Result<(), Error> {
        self.write_atomically(address).await
    }
}
