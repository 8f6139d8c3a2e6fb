//! Message stores.
//!
//! A store maps message keys to raw message bytes, kept exactly as they
//! arrived. Keys start with the
//! 10-digit Unix timestamp at which the message was received, so sorting
//! keys as strings sorts messages by arrival time.

use bytes::Bytes;

pub mod file;
pub mod memory;

pub use file::FileCorpus;
pub use memory::MemoryCorpus;

/// Width of the timestamp prefix of every message key.
pub const TIMESTAMP_WIDTH: usize = 10;

/// Timestamp encoded in the first ten characters of `key`.
pub fn key_timestamp(key: &str) -> Option<i64> {
    let prefix = key.get(..TIMESTAMP_WIDTH)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Formats a timestamp as a fixed-width key.
pub fn format_key(timestamp: i64) -> String {
    format!("{:0width$}", timestamp, width = TIMESTAMP_WIDTH)
}

pub trait Corpus: Send + Sync {
    /// All keys, sorted.
    fn keys(&self) -> anyhow::Result<Vec<String>>;

    fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>>;

    fn insert(&mut self, key: &str, content: &[u8]) -> anyhow::Result<()>;

    /// Removes a message. Returns `false` when there was nothing to remove.
    fn remove(&mut self, key: &str) -> anyhow::Result<bool>;

    /// Stores `content` under a fresh key derived from `now`, stepping past
    /// any key already in use.
    fn create(&mut self, content: &[u8], now: i64) -> anyhow::Result<String> {
        let keys = self.keys()?;
        let mut candidate = now;
        while keys.binary_search(&format_key(candidate)).is_ok() {
            candidate += 1;
        }
        let key = format_key(candidate);
        self.insert(&key, content)?;
        Ok(key)
    }

    /// Removes every message whose key timestamp is before `cutoff`.
    fn purge_older_than(&mut self, cutoff: i64) -> anyhow::Result<usize> {
        let mut purged = 0;
        for key in self.keys()? {
            match key_timestamp(&key) {
                Some(ts) if ts < cutoff => {
                    if self.remove(&key)? {
                        purged += 1;
                    }
                }
                _ => {}
            }
        }
        Ok(purged)
    }
}

/// Moves `key` from one store to another.
///
/// Returns `false` when the source no longer holds the key, which happens
/// when a review page is submitted twice.
pub fn move_message(from: &mut dyn Corpus, to: &mut dyn Corpus, key: &str) -> anyhow::Result<bool> {
    let Some(content) = from.get(key)? else {
        return Ok(false);
    };
    to.insert(key, &content)?;
    from.remove(key)?;
    Ok(true)
}
