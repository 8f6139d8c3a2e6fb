//! Bayes Trainer - web interface for reviewing and training on queued mail
//!
//! Serves the pages used to label unknown messages as ham or spam, one
//! calendar day at a time, and to train and query the classifier.

pub mod classifier;
pub mod config;
pub mod http;
pub mod message;
pub mod review;
pub mod server;
pub mod state;
pub mod store;
pub mod tokenizer;
pub mod web;
