//! File-scoped mutual exclusion for read-modify-write cycles.
//!
//! Two layers: a process-wide registry of mutexes keyed by absolute path, and
//! an advisory lock on a sidecar `<file>.lock` so separate processes writing
//! the same log serialize too.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use fs4::fs_std::FileExt;

use crate::error::{Error, Result};

type Registry = Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>;

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Default::default)
}

/// Mutex shared by every caller in this process that names `path`.
fn path_mutex(path: &Path) -> Arc<Mutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut map = registry().lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(map.entry(key).or_default())
}

/// Sidecar lock file path for a log file.
pub fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    path.with_file_name(name)
}

/// Run `f` while holding exclusive access to `path`.
///
/// Blocks until every other holder in this process, and every other process
/// cooperating through the sidecar file, has released it.
pub fn with_file_lock<T>(path: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let mutex = path_mutex(path);
    // The guarded value is `()`, so a panic in another holder leaves nothing
    // inconsistent behind.
    let _guard = mutex.lock().unwrap_or_else(PoisonError::into_inner);
    let _sidecar = SidecarLock::acquire(path)?;
    f()
}

struct SidecarLock {
    file: File,
}

impl SidecarLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = lock_path(path);
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::write_failed(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| Error::write_failed(&lock_path, e))?;
        FileExt::lock_exclusive(&file).map_err(|e| Error::write_failed(&lock_path, e))?;
        Ok(Self { file })
    }
}

impl Drop for SidecarLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release log file lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn lock_path_is_a_sibling() {
        assert_eq!(
            lock_path(Path::new("logs/events.json")),
            PathBuf::from("logs/events.json.lock")
        );
    }

    #[test]
    fn same_path_shares_one_mutex() {
        let a = path_mutex(Path::new("registry-test/events.json"));
        let b = path_mutex(Path::new("registry-test/./events.json"));
        let c = path_mutex(Path::new("registry-test/other.json"));
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn holders_never_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let path = Arc::new(dir.path().join("events.json"));
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let path = Arc::clone(&path);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    with_file_lock(&path, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    })
                    .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(lock_path(&path).exists());
    }

    #[test]
    fn closure_error_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        let err = with_file_lock(&path, || -> Result<()> {
            Err(crate::ValidationError::EmptyEvent.into())
        })
        .unwrap_err();
        assert!(err.is_client_error());

        // Released after the failure.
        with_file_lock(&path, || Ok(())).unwrap();
    }
}
