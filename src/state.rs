//! Process-wide review state.
//!
//! One [`AppState`] is built at startup from the configuration and shared by
//! every connection behind a single mutex, so at most one handler reads or
//! mutates the classifier and stores at a time.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::classifier::{Classifier, WordClassifier};
use crate::config::{ClassificationConfig, Config};
use crate::store::{Corpus, FileCorpus};
use crate::tokenizer::{Tokenizer, WhitespaceTokenizer};

pub type SharedState = Arc<Mutex<AppState>>;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// The unknown store plus the two terminal stores.
pub struct Stores {
    pub unknown: Box<dyn Corpus>,
    pub ham: Box<dyn Corpus>,
    pub spam: Box<dyn Corpus>,
}

/// Messages classified through the web interface since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub spam: u32,
    pub ham: u32,
    pub unsure: u32,
}

pub struct AppState {
    pub classification: ClassificationConfig,
    pub page_size: usize,
    pub classifier: Box<dyn Classifier>,
    pub tokenizer: Box<dyn Tokenizer>,
    pub stores: Stores,
    pub session: SessionStats,
}

impl AppState {
    pub fn new(
        classification: ClassificationConfig,
        page_size: usize,
        classifier: Box<dyn Classifier>,
        tokenizer: Box<dyn Tokenizer>,
        stores: Stores,
    ) -> Self {
        Self {
            classification,
            page_size,
            classifier,
            tokenizer,
            stores,
            session: SessionStats::default(),
        }
    }

    /// Opens the on-disk stores and classifier database named in `cfg` and
    /// purges expired trained messages.
    pub fn open(cfg: &Config) -> anyhow::Result<Self> {
        tracing::info!(path = %cfg.storage.database.display(), "Loading database");
        let classifier = WordClassifier::load(&cfg.storage.database)?;

        let mut stores = Stores {
            unknown: Box::new(FileCorpus::open(&cfg.storage.unknown_dir)?),
            ham: Box::new(FileCorpus::open(&cfg.storage.ham_dir)?),
            spam: Box::new(FileCorpus::open(&cfg.storage.spam_dir)?),
        };

        let cutoff = chrono::Utc::now().timestamp() - i64::from(cfg.storage.expiry_days) * SECONDS_PER_DAY;
        let purged = stores.ham.purge_older_than(cutoff)? + stores.spam.purge_older_than(cutoff)?;
        if purged > 0 {
            tracing::info!(purged, "Expired trained messages removed");
        }

        Ok(Self::new(
            cfg.classification.clone(),
            cfg.review.page_size,
            Box::new(classifier),
            Box::new(WhitespaceTokenizer),
            stores,
        ))
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn persist(&mut self) -> anyhow::Result<()> {
        self.classifier.persist()
    }

    /// Tokenizes and scores a message.
    pub fn score(&self, message: &str) -> (f64, Vec<(String, f64)>) {
        let tokens = self.tokenizer.tokenize(message);
        self.classifier.classify(&tokens)
    }
}
