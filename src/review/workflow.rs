//! Applying review decisions and choosing the next page to show.

use std::str::FromStr;

use chrono::TimeZone;

use crate::http::request::Params;
use crate::message;
use crate::review::paginator::{ReviewPage, ReviewPaginator};
use crate::state::AppState;
use crate::store::{key_timestamp, move_message, Corpus};

/// Prefix of the radio-button fields of a review form:
/// `classify:<label>:<key>`.
pub const DECISION_FIELD: &str = "classify";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Discard,
    Defer,
    Ham,
    Spam,
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discard" => Ok(Decision::Discard),
            "defer" => Ok(Decision::Defer),
            "ham" => Ok(Decision::Ham),
            "spam" => Ok(Decision::Spam),
            other => Err(format!("unknown decision '{other}'")),
        }
    }
}

/// Explicit day navigation requested with the Previous/Next buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Previous(i64),
    Next(i64),
    Latest,
}

/// A parsed review form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSubmission {
    /// Decisions in ascending field-name order.
    pub decisions: Vec<(String, Decision)>,
    pub start_at: usize,
    pub how_many: usize,
    pub navigation: Navigation,
}

impl ReviewSubmission {
    pub fn from_params(params: &Params, default_page_size: usize) -> Self {
        let mut decisions = Vec::new();

        for (name, value) in params.iter() {
            let mut parts = name.split(':');
            let (Some(DECISION_FIELD), Some(_label), Some(key), None) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            match value.to_text().parse::<Decision>() {
                Ok(decision) => decisions.push((key.to_string(), decision)),
                Err(e) => tracing::warn!(field = %name, "ignoring review field: {}", e),
            }
        }

        let number = |name: &str| params.text(name).and_then(|v| v.trim().parse::<i64>().ok());

        let navigation = match params.text("go") {
            Some("Next day") => number("next").map_or(Navigation::Latest, Navigation::Next),
            Some("Previous day") => number("prior").map_or(Navigation::Latest, Navigation::Previous),
            _ => Navigation::Latest,
        };

        Self {
            decisions,
            start_at: number("startAt").and_then(|v| usize::try_from(v).ok()).unwrap_or(0),
            how_many: number("howMany")
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(default_page_size),
            navigation,
        }
    }
}

/// Counts from applying one batch of decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub trained: usize,
    pub discarded: usize,
    pub deferred: usize,
    /// Decisions for keys no longer in the unknown store.
    pub skipped: usize,
    pub last_key: Option<String>,
}

/// Applies each decision independently.
///
/// Ham and spam decisions move the message into the matching store and
/// train the classifier on it. A key that has already left the unknown store
/// (a resubmitted page) is skipped. The classifier is persisted when
/// anything was trained.
pub fn apply_decisions(state: &mut AppState, decisions: &[(String, Decision)]) -> anyhow::Result<ReviewOutcome> {
    let mut outcome = ReviewOutcome::default();

    for (key, decision) in decisions {
        outcome.last_key = Some(key.clone());

        match decision {
            Decision::Discard => {
                if state.stores.unknown.remove(key)? {
                    outcome.discarded += 1;
                } else {
                    outcome.skipped += 1;
                }
            }
            Decision::Defer => outcome.deferred += 1,
            Decision::Ham | Decision::Spam => {
                let is_spam = *decision == Decision::Spam;
                let Some(content) = state.stores.unknown.get(key)? else {
                    outcome.skipped += 1;
                    continue;
                };

                let target: &mut dyn Corpus = if is_spam {
                    &mut *state.stores.spam
                } else {
                    &mut *state.stores.ham
                };
                if !move_message(&mut *state.stores.unknown, target, key)? {
                    outcome.skipped += 1;
                    continue;
                }

                let tokens = state.tokenizer.tokenize(&String::from_utf8_lossy(&content));
                state.classifier.train(&tokens, is_spam);
                outcome.trained += 1;
            }
        }
    }

    if outcome.trained > 0 {
        state.persist()?;
    }

    tracing::info!(
        trained = outcome.trained,
        discarded = outcome.discarded,
        deferred = outcome.deferred,
        skipped = outcome.skipped,
        "Review batch applied"
    );

    Ok(outcome)
}

/// Chooses which day to display after a batch, as a target timestamp for
/// [`ReviewPaginator::page`] (`None` meaning the most recent day).
///
/// A batch with deferred messages redisplays its own day. Any other batch
/// moves on to the prior day, or the next day when there is no prior one.
/// Without a batch, explicit navigation is honoured.
pub fn next_target<Tz: TimeZone>(
    outcome: &ReviewOutcome,
    navigation: Navigation,
    paginator: &ReviewPaginator<Tz>,
    sorted_keys: &[String],
    now: i64,
) -> anyhow::Result<Option<i64>> {
    let last = outcome.last_key.as_deref().and_then(key_timestamp);

    if let Some(ts) = last {
        if outcome.deferred > 0 {
            return Ok(Some(ts));
        }
        let page = paginator.page(sorted_keys, Some(ts), now)?;
        let target = if page.prior != 0 { page.prior } else { page.next };
        return Ok((target != 0).then_some(target));
    }

    Ok(match navigation {
        Navigation::Previous(ts) | Navigation::Next(ts) if ts != 0 => Some(ts),
        _ => None,
    })
}

/// Display group of a message on a review page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Spam,
    Ham,
    Unsure,
}

impl Bucket {
    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Spam => "Spam",
            Bucket::Ham => "Ham",
            Bucket::Unsure => "Unsure",
        }
    }
}

/// One message row of a review page.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewRow {
    pub key: String,
    pub bucket: Bucket,
    /// The pre-selected decision. Unsure messages are provisionally labelled
    /// ham or spam when their score clears a cutoff.
    pub suggested: Bucket,
    pub subject: String,
    pub from: String,
    pub snippet: String,
}

/// Rows of a page grouped into spam, ham and unsure buckets, in that order.
///
/// Every message of the day is read to find its bucket, but only rows
/// `start_at..start_at + how_many` of each bucket are summarised and scored.
pub fn bucket_page(
    state: &AppState,
    page: &ReviewPage,
    start_at: usize,
    how_many: usize,
) -> anyhow::Result<Vec<(Bucket, Vec<ReviewRow>)>> {
    let mut pending: [(Bucket, Vec<(&String, String)>); 3] = [
        (Bucket::Spam, Vec::new()),
        (Bucket::Ham, Vec::new()),
        (Bucket::Unsure, Vec::new()),
    ];

    for key in &page.keys {
        let Some(raw) = state.stores.unknown.get(key)? else {
            continue;
        };
        let text = String::from_utf8_lossy(&raw).into_owned();
        let slot = match judge(state, key, &text) {
            Bucket::Spam => 0,
            Bucket::Ham => 1,
            Bucket::Unsure => 2,
        };
        pending[slot].1.push((key, text));
    }

    Ok(pending
        .into_iter()
        .map(|(bucket, messages)| {
            let rows: Vec<ReviewRow> = messages
                .into_iter()
                .skip(start_at)
                .take(how_many)
                .map(|(key, text)| summarise(state, key, bucket, &text))
                .collect();
            (bucket, rows)
        })
        .collect())
}

/// Bucket named by the classification header a message was filed with.
fn judge(state: &AppState, key: &str, text: &str) -> Bucket {
    let cfg = &state.classification;
    let judgement = message::header(text, &cfg.header_name)
        .map(|v| v.split(';').next().unwrap_or_default().trim().to_string());

    match judgement.as_deref() {
        Some(j) if j == cfg.spam_string => Bucket::Spam,
        Some(j) if j == cfg.ham_string => Bucket::Ham,
        Some(j) if j == cfg.unsure_string => Bucket::Unsure,
        other => {
            tracing::debug!(key = %key, header = ?other, "no usable classification header");
            Bucket::Unsure
        }
    }
}

fn summarise(state: &AppState, key: &str, bucket: Bucket, text: &str) -> ReviewRow {
    let cfg = &state.classification;
    let suggested = if bucket == Bucket::Unsure {
        let (prob, _) = state.score(text);
        if prob < cfg.ham_cutoff {
            Bucket::Ham
        } else if prob >= cfg.spam_cutoff {
            Bucket::Spam
        } else {
            Bucket::Unsure
        }
    } else {
        bucket
    };

    ReviewRow {
        key: key.to_string(),
        bucket,
        suggested,
        subject: message::header(text, "Subject").unwrap_or_else(|| "(none)".to_string()),
        from: message::header(text, "From").unwrap_or_else(|| "(none)".to_string()),
        snippet: message::body_text(text),
    }
}
