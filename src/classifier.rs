//! Spam probability estimation.
//!
//! The review workflow only needs the [`Classifier`] capability. The
//! bundled [`WordClassifier`] keeps per-word ham/spam counts, scores words
//! with Robinson's smoothed probability and combines the strongest clues.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Statistics the classifier holds for one word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordInfo {
    pub spam_count: u32,
    pub ham_count: u32,
    pub spam_prob: f64,
}

pub trait Classifier: Send + Sync {
    /// Spam probability of a token stream and the clues that decided it.
    fn classify(&self, tokens: &[String]) -> (f64, Vec<(String, f64)>);

    fn train(&mut self, tokens: &[String], is_spam: bool);

    fn word_info(&self, word: &str) -> Option<WordInfo>;

    /// Number of trained `(ham, spam)` messages.
    fn counts(&self) -> (u32, u32);

    /// Writes the trained state to durable storage.
    fn persist(&mut self) -> anyhow::Result<()>;
}

const UNKNOWN_WORD_STRENGTH: f64 = 0.45;
const UNKNOWN_WORD_PROB: f64 = 0.5;
const MIN_PROB_STRENGTH: f64 = 0.1;
const MAX_DISCRIMINATORS: usize = 150;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct WordCounts {
    spam: u32,
    ham: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Database {
    nham: u32,
    nspam: u32,
    words: HashMap<String, WordCounts>,
}

#[derive(Debug, Default)]
pub struct WordClassifier {
    path: Option<PathBuf>,
    db: Database,
}

impl WordClassifier {
    /// A classifier with no backing file; `persist` is a no-op.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Loads the database at `path`, starting empty if it does not exist.
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let db = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading database {}", path.display()))?;
            serde_yaml::from_str(&text)
                .with_context(|| format!("parsing database {}", path.display()))?
        } else {
            Database::default()
        };
        Ok(Self { path: Some(path), db })
    }

    fn word_prob(&self, counts: WordCounts) -> f64 {
        let nham = self.db.nham.max(1) as f64;
        let nspam = self.db.nspam.max(1) as f64;
        let ham_ratio = counts.ham as f64 / nham;
        let spam_ratio = counts.spam as f64 / nspam;
        let n = (counts.ham + counts.spam) as f64;

        let prob = if ham_ratio + spam_ratio == 0.0 {
            UNKNOWN_WORD_PROB
        } else {
            spam_ratio / (ham_ratio + spam_ratio)
        };

        (UNKNOWN_WORD_STRENGTH * UNKNOWN_WORD_PROB + n * prob) / (UNKNOWN_WORD_STRENGTH + n)
    }
}

impl Classifier for WordClassifier {
    fn classify(&self, tokens: &[String]) -> (f64, Vec<(String, f64)>) {
        let unique: HashSet<&String> = tokens.iter().collect();

        let mut clues: Vec<(String, f64)> = unique
            .into_iter()
            .filter_map(|token| {
                let counts = self.db.words.get(token)?;
                let prob = self.word_prob(*counts);
                ((prob - 0.5).abs() >= MIN_PROB_STRENGTH).then(|| (token.clone(), prob))
            })
            .collect();

        clues.sort_by(|a, b| {
            (b.1 - 0.5)
                .abs()
                .total_cmp(&(a.1 - 0.5).abs())
                .then_with(|| a.0.cmp(&b.0))
        });
        clues.truncate(MAX_DISCRIMINATORS);

        if clues.is_empty() {
            return (UNKNOWN_WORD_PROB, clues);
        }

        // Robinson's geometric-mean combination.
        let n = clues.len() as f64;
        let ln_ham: f64 = clues.iter().map(|(_, p)| (1.0 - p).ln()).sum();
        let ln_spam: f64 = clues.iter().map(|(_, p)| p.ln()).sum();
        let p = 1.0 - (ln_ham / n).exp();
        let q = 1.0 - (ln_spam / n).exp();
        let prob = if p + q == 0.0 {
            UNKNOWN_WORD_PROB
        } else {
            (1.0 + (p - q) / (p + q)) / 2.0
        };

        clues.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        (prob, clues)
    }

    fn train(&mut self, tokens: &[String], is_spam: bool) {
        if is_spam {
            self.db.nspam += 1;
        } else {
            self.db.nham += 1;
        }

        let unique: HashSet<&String> = tokens.iter().collect();
        for token in unique {
            let counts = self.db.words.entry(token.clone()).or_default();
            if is_spam {
                counts.spam += 1;
            } else {
                counts.ham += 1;
            }
        }
    }

    fn word_info(&self, word: &str) -> Option<WordInfo> {
        let counts = *self.db.words.get(word)?;
        Some(WordInfo {
            spam_count: counts.spam,
            ham_count: counts.ham,
            spam_prob: self.word_prob(counts),
        })
    }

    fn counts(&self) -> (u32, u32) {
        (self.db.nham, self.db.nspam)
    }

    fn persist(&mut self) -> anyhow::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let text = serde_yaml::to_string(&self.db)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, text).with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            nham = self.db.nham,
            nspam = self.db.nspam,
            "Classifier database saved"
        );
        Ok(())
    }
}
