use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// A cheaply clonable handle to a base64 image payload.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef(Arc<str>);

impl ArtifactRef {
    pub fn new(encoded: impl Into<Arc<str>>) -> Self {
        Self(encoded.into())
    }

    pub fn encoded(&self) -> &str {
        &self.0
    }

    pub fn decode(&self) -> forge_media::Result<Vec<u8>> {
        forge_media::decode(&self.0)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> forge_media::Result<()> {
        forge_media::save_encoded(path, &self.0)
    }
}

impl fmt::Debug for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArtifactRef")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

impl From<String> for ArtifactRef {
    fn from(encoded: String) -> Self {
        Self::new(encoded)
    }
}

impl From<&str> for ArtifactRef {
    fn from(encoded: &str) -> Self {
        Self::new(encoded)
    }
}

#[derive(Debug)]
struct Registry {
    dir: PathBuf,
    live: AtomicUsize,
    released: AtomicUsize,
    next: AtomicU64,
}

/// Issues [`TransientArtifact`] files under one directory and counts how many
/// are still held.
#[derive(Debug, Clone)]
pub struct TransientArtifacts {
    registry: Arc<Registry>,
}

impl TransientArtifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            registry: Arc::new(Registry {
                dir: dir.into(),
                live: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
                next: AtomicU64::new(0),
            }),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.registry.dir
    }

    /// Write `bytes` to a fresh file and hand back its handle.
    pub fn acquire(&self, bytes: &[u8], extension: &str) -> io::Result<TransientArtifact> {
        std::fs::create_dir_all(&self.registry.dir)?;
        let seq = self.registry.next.fetch_add(1, Ordering::Relaxed);
        let path = self
            .registry
            .dir
            .join(format!("forge-{}-{seq}.{extension}", std::process::id()));
        std::fs::write(&path, bytes)?;

        self.registry.live.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(path = %path.display(), len = bytes.len(), "acquired transient artifact");
        Ok(TransientArtifact {
            path,
            len: bytes.len(),
            registry: Arc::clone(&self.registry),
            released: false,
        })
    }

    /// Handles issued and not yet released.
    pub fn live(&self) -> usize {
        self.registry.live.load(Ordering::Acquire)
    }

    /// Handles released so far, by either path.
    pub fn released(&self) -> usize {
        self.registry.released.load(Ordering::Acquire)
    }
}

/// A locally addressable file holding a large binary result. The file is
/// deleted exactly once: by [`TransientArtifact::release`] or on drop.
#[derive(Debug)]
pub struct TransientArtifact {
    path: PathBuf,
    len: usize,
    registry: Arc<Registry>,
    released: bool,
}

impl TransientArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy the artifact somewhere durable. The handle stays live.
    pub fn save_to(&self, dest: impl AsRef<Path>) -> io::Result<()> {
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&self.path, dest)?;
        Ok(())
    }

    pub fn release(mut self) -> io::Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> io::Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.registry.live.fetch_sub(1, Ordering::AcqRel);
        self.registry.released.fetch_add(1, Ordering::AcqRel);
        tracing::debug!(path = %self.path.display(), "released transient artifact");

        match std::fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

impl Drop for TransientArtifact {
    fn drop(&mut self) {
        if let Err(err) = self.release_inner() {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to remove transient artifact");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_ref_debug_hides_payload() {
        let artifact = ArtifactRef::from("aGVsbG8=");
        assert_eq!(format!("{artifact:?}"), "ArtifactRef(8 bytes)");
        assert_eq!(artifact.decode().expect("decode"), b"hello");
    }

    #[test]
    fn explicit_release_removes_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifacts = TransientArtifacts::new(dir.path());

        let video = artifacts.acquire(b"mp4", "mp4").expect("acquire");
        let path = video.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(artifacts.live(), 1);

        video.release().expect("release");
        assert!(!path.exists());
        assert_eq!(artifacts.live(), 0);
        assert_eq!(artifacts.released(), 1);
    }

    #[test]
    fn drop_releases_unreleased_handles() {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifacts = TransientArtifacts::new(dir.path());

        let first = artifacts.acquire(b"one", "mp4").expect("acquire");
        let second = artifacts.acquire(b"two", "mp4").expect("acquire");
        assert_ne!(first.path(), second.path());
        assert_eq!(artifacts.live(), 2);

        drop(first);
        second.release().expect("release");
        assert_eq!(artifacts.live(), 0);
        assert_eq!(artifacts.released(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
    }

    #[test]
    fn save_to_copies_without_releasing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let artifacts = TransientArtifacts::new(dir.path().join("transient"));
        let video = artifacts.acquire(b"frames", "mp4").expect("acquire");

        let dest = dir.path().join("out").join("clip.mp4");
        video.save_to(&dest).expect("save");
        assert_eq!(std::fs::read(&dest).expect("read"), b"frames");
        assert_eq!(artifacts.live(), 1);
    }
}
