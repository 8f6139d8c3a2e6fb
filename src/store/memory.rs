use std::collections::BTreeMap;

use bytes::Bytes;

use super::Corpus;

/// A store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    messages: BTreeMap<String, Bytes>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages<K, V>(messages: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Bytes>,
    {
        Self {
            messages: messages
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Corpus for MemoryCorpus {
    fn keys(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.messages.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.messages.get(key).cloned())
    }

    fn insert(&mut self, key: &str, content: &[u8]) -> anyhow::Result<()> {
        self.messages.insert(key.to_string(), Bytes::copy_from_slice(content));
        Ok(())
    }

    fn remove(&mut self, key: &str) -> anyhow::Result<bool> {
        Ok(self.messages.remove(key).is_some())
    }
}
