use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use bytes::Bytes;

use super::Corpus;

/// A store keeping one file per message inside a directory.
#[derive(Debug, Clone)]
pub struct FileCorpus {
    dir: PathBuf,
}

impl FileCorpus {
    /// Opens the store at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating message directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path for `key`, or `None` if the key could escape the directory.
    fn path(&self, key: &str) -> Option<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        valid.then(|| self.dir.join(key))
    }
}

impl Corpus for FileCorpus {
    fn keys(&self) -> anyhow::Result<Vec<String>> {
        let mut keys = Vec::new();
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("listing {}", self.dir.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.path(name).is_some() {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        let Some(path) = self.path(key) else {
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    fn insert(&mut self, key: &str, content: &[u8]) -> anyhow::Result<()> {
        let path = self
            .path(key)
            .with_context(|| format!("invalid message key '{key}'"))?;
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<bool> {
        let Some(path) = self.path(key) else {
            return Ok(false);
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }
}
