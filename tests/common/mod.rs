#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use trainer::classifier::{Classifier, WordInfo};
use trainer::config::ClassificationConfig;
use trainer::http::framer::{Frame, RequestFramer};
use trainer::http::request::Request;
use trainer::state::{AppState, Stores};
use trainer::store::MemoryCorpus;
use trainer::tokenizer::WhitespaceTokenizer;

/// Calls observed by [`RecordingClassifier`].
#[derive(Clone, Default)]
pub struct Recorder {
    pub trained: Arc<Mutex<Vec<(Vec<String>, bool)>>>,
    pub persisted: Arc<Mutex<usize>>,
    pub scored: Arc<Mutex<usize>>,
}

impl Recorder {
    pub fn train_calls(&self) -> Vec<(Vec<String>, bool)> {
        self.trained.lock().unwrap().clone()
    }

    pub fn persist_calls(&self) -> usize {
        *self.persisted.lock().unwrap()
    }

    pub fn classify_calls(&self) -> usize {
        *self.scored.lock().unwrap()
    }
}

/// Scores every message with a fixed probability and records training.
pub struct RecordingClassifier {
    recorder: Recorder,
    prob: f64,
}

impl Classifier for RecordingClassifier {
    fn classify(&self, _tokens: &[String]) -> (f64, Vec<(String, f64)>) {
        *self.recorder.scored.lock().unwrap() += 1;
        (self.prob, vec![("clue".to_string(), self.prob)])
    }

    fn train(&mut self, tokens: &[String], is_spam: bool) {
        self.recorder.trained.lock().unwrap().push((tokens.to_vec(), is_spam));
    }

    fn word_info(&self, word: &str) -> Option<WordInfo> {
        (word == "viagra").then_some(WordInfo {
            spam_count: 3,
            ham_count: 0,
            spam_prob: 0.99,
        })
    }

    fn counts(&self) -> (u32, u32) {
        let calls = self.recorder.trained.lock().unwrap();
        let spam = calls.iter().filter(|(_, s)| *s).count() as u32;
        (calls.len() as u32 - spam, spam)
    }

    fn persist(&mut self) -> anyhow::Result<()> {
        *self.recorder.persisted.lock().unwrap() += 1;
        Ok(())
    }
}

/// State over in-memory stores with a classifier answering `prob`.
pub fn state_with(unknown: MemoryCorpus, prob: f64) -> (AppState, Recorder) {
    let recorder = Recorder::default();
    let classifier = RecordingClassifier {
        recorder: recorder.clone(),
        prob,
    };
    let stores = Stores {
        unknown: Box::new(unknown),
        ham: Box::new(MemoryCorpus::new()),
        spam: Box::new(MemoryCorpus::new()),
    };
    let state = AppState::new(
        ClassificationConfig::default(),
        20,
        Box::new(classifier),
        Box::new(WhitespaceTokenizer),
        stores,
    );
    (state, recorder)
}

/// Frames and decodes a request given as raw bytes.
pub fn request(raw: &[u8]) -> Request {
    let mut framer = RequestFramer::default();
    match framer.feed(raw).unwrap() {
        Frame::Complete(framed) => Request::from_framed(framed).unwrap(),
        Frame::NeedMore => panic!("request incomplete"),
    }
}

/// A urlencoded POST request.
pub fn post(path: &str, body: &str) -> Vec<u8> {
    format!(
        "POST {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}
