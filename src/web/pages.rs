//! Page handlers.
//!
//! Each handler runs with the shared state locked and pushes its part of the
//! page between the preamble and trailer written by the router.

use anyhow::Context;
use chrono::{Local, Utc};
use tokio::io::AsyncWrite;

use crate::http::request::Params;
use crate::http::writer::ResponseWriter;
use crate::message;
use crate::review::workflow::{self, Bucket, ReviewRow, ReviewSubmission};
use crate::review::{ReviewPage, ReviewPaginator};
use crate::state::AppState;
use crate::web::html::{self, escape, section, trim_and_quote};
use crate::web::router::Outcome;

const TRAIN_AS_SPAM: &str = "Train as Spam";
const TRAIN_AS_HAM: &str = "Train as Ham";

pub async fn home<W>(state: &mut AppState, _params: &Params, out: &mut ResponseWriter<'_, W>) -> anyhow::Result<Outcome>
where
    W: AsyncWrite + Unpin + Send,
{
    let (nham, nspam) = state.classifier.counts();
    let session = state.session;
    let summary = format!(
        "Emails classified this session: <b>{}</b> spam, <b>{}</b> ham, <b>{}</b> unsure.<br>\n\
         Total emails trained: Spam: <b>{nspam}</b> Ham: <b>{nham}</b><br>",
        session.spam, session.ham, session.unsure
    );

    let mut body = section("Status", &summary);
    body.push_str(&section(
        "Train on stored messages",
        "<p>The trainer stores every message it is given. You can train the classifier \
         on those messages using the <a href='review'>Review messages</a> page.</p>\n\
         <form action='upload' method='POST' enctype='multipart/form-data'>\n\
         Upload an unknown message or mbox file: <input type='file' name='file'>\n\
         <input type='submit' name='which' value='Upload'>\n</form>",
    ));
    body.push_str(&section(
        "Train on a given message",
        &html::upload_form("train", &[TRAIN_AS_SPAM, TRAIN_AS_HAM]),
    ));
    body.push_str(&section("Classify a message", &html::upload_form("classify", &["Classify"])));
    body.push_str(&section("Word query", &html::word_query_form("")));
    out.push(body).await?;

    Ok(Outcome::Continue)
}

async fn save_database<W>(state: &mut AppState, out: &mut ResponseWriter<'_, W>) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    out.push("<b>Saving... ").await?;
    state.persist()?;
    out.push("Done</b>.\n").await?;
    Ok(())
}

/// Saves the database; with a `how` containing "shutdown" also asks the
/// acceptor to stop once this response is flushed.
pub async fn save<W>(state: &mut AppState, params: &Params, out: &mut ResponseWriter<'_, W>) -> anyhow::Result<Outcome>
where
    W: AsyncWrite + Unpin + Send,
{
    save_database(state, out).await?;

    let shutdown = params
        .text("how")
        .is_some_and(|how| how.to_lowercase().contains("shutdown"));
    if shutdown {
        tracing::info!("Shutdown requested from the web interface");
        out.push("<b>Shutdown</b>. Goodbye.</div></body></html>\n").await?;
        return Ok(Outcome::Shutdown);
    }

    Ok(Outcome::Continue)
}

/// Stores uploaded messages in the unknown store for later review.
pub async fn upload<W>(state: &mut AppState, params: &Params, out: &mut ResponseWriter<'_, W>) -> anyhow::Result<Outcome>
where
    W: AsyncWrite + Unpin + Send,
{
    let content = params.message_content().context("no message was supplied")?;
    let now = Utc::now().timestamp();

    let mut stored = 0;
    for message in message::split_mbox(&content) {
        let key = state.stores.unknown.create(&message, now)?;
        tracing::debug!(key = %key, "Stored unknown message");
        stored += 1;
    }
    tracing::info!(stored, "Messages uploaded");

    save_database(state, out).await?;
    out.push(format!("<p>OK. Stored {stored} message{}.</p>\n", plural(stored))).await?;
    Ok(Outcome::Continue)
}

/// Trains the classifier on an uploaded or pasted message or mailbox.
pub async fn train<W>(state: &mut AppState, params: &Params, out: &mut ResponseWriter<'_, W>) -> anyhow::Result<Outcome>
where
    W: AsyncWrite + Unpin + Send,
{
    let content = params.message_content().context("no message was supplied")?;
    let is_spam = params.text("which") == Some(TRAIN_AS_SPAM);

    out.push("<b>Training...</b>\n").await?;
    let messages = message::split_mbox(&content);
    for message in &messages {
        let tokens = state.tokenizer.tokenize(&String::from_utf8_lossy(message));
        state.classifier.train(&tokens, is_spam);
    }
    tracing::info!(count = messages.len(), is_spam, "Trained on uploaded messages");

    save_database(state, out).await?;
    out.push("<p>OK. Return <a href='home'>Home</a> or train again:</p>\n").await?;
    out.push(section(
        "Train another",
        &html::upload_form("train", &[TRAIN_AS_SPAM, TRAIN_AS_HAM]),
    ))
    .await?;
    Ok(Outcome::Continue)
}

pub async fn classify<W>(state: &mut AppState, params: &Params, out: &mut ResponseWriter<'_, W>) -> anyhow::Result<Outcome>
where
    W: AsyncWrite + Unpin + Send,
{
    let content = params.message_content().context("no message was supplied")?;
    let content = String::from_utf8_lossy(&content)
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let (prob, clues) = state.score(&content);

    if prob < state.classification.ham_cutoff {
        state.session.ham += 1;
    } else if prob >= state.classification.spam_cutoff {
        state.session.spam += 1;
    } else {
        state.session.unsure += 1;
    }

    out.push(format!("<p>Spam probability: <b>{prob:.8}</b></p>\n")).await?;
    let mut table = String::from("<table>\n");
    for (word, p) in &clues {
        table.push_str(&format!("<tr><td>{}</td><td>{p:.8}</td></tr>\n", escape(word)));
    }
    table.push_str("</table>");
    out.push(section("Clues:", &table)).await?;
    out.push("<p>Return <a href='home'>Home</a> or classify another:</p>\n").await?;
    out.push(section("Classify another", &html::upload_form("classify", &["Classify"])))
        .await?;
    Ok(Outcome::Continue)
}

pub async fn wordquery<W>(state: &mut AppState, params: &Params, out: &mut ResponseWriter<'_, W>) -> anyhow::Result<Outcome>
where
    W: AsyncWrite + Unpin + Send,
{
    let typed = params.text("word").context("no word was supplied")?;
    let word = typed.to_lowercase();

    let info = match state.classifier.word_info(&word) {
        Some(info) => format!(
            "Number of spam messages: <b>{}</b>.<br>\n\
             Number of ham messages: <b>{}</b>.<br>\n\
             Probability that a message containing this word is spam: <b>{:.6}</b>.<br>",
            info.spam_count, info.ham_count, info.spam_prob
        ),
        None => format!("'{}' does not appear in the database.", escape(&word)),
    };

    let mut body = section(&format!("Statistics for '{}'", escape(&word)), &info);
    body.push_str(&section("Word query", &html::word_query_form(typed)));
    out.push(body).await?;
    Ok(Outcome::Continue)
}

/// Shows one unknown message verbatim.
pub async fn view<W>(state: &mut AppState, params: &Params, out: &mut ResponseWriter<'_, W>) -> anyhow::Result<Outcome>
where
    W: AsyncWrite + Unpin + Send,
{
    let key = params.text("key").context("no message key was supplied")?;

    match state.stores.unknown.get(key)? {
        Some(raw) => {
            let text = String::from_utf8_lossy(&raw);
            out.push(format!("<pre>{}</pre>\n", escape(&text))).await?;
        }
        None => {
            out.push(format!(
                "<p>Can't find message {}.\nMaybe it expired.</p>\n",
                escape(key)
            ))
            .await?;
        }
    }
    Ok(Outcome::Continue)
}

/// Applies submitted decisions, then lists one day of unknown messages.
pub async fn review<W>(state: &mut AppState, params: &Params, out: &mut ResponseWriter<'_, W>) -> anyhow::Result<Outcome>
where
    W: AsyncWrite + Unpin + Send,
{
    let submission = ReviewSubmission::from_params(params, state.page_size);
    let outcome = workflow::apply_decisions(state, &submission.decisions)?;

    if outcome.trained > 0 {
        out.push(format!(
            "<p><b>Trained on {} message{}.</b> ",
            outcome.trained,
            plural(outcome.trained)
        ))
        .await?;
        out.push("Saved.<br>&nbsp;</p>\n").await?;
    }
    if outcome.discarded > 0 || outcome.deferred > 0 {
        out.push(format!(
            "<p>Discarded {}, deferred {}.</p>\n",
            outcome.discarded, outcome.deferred
        ))
        .await?;
    }

    let paginator = ReviewPaginator::new(Local);
    let keys = state.stores.unknown.keys()?;
    let now = Utc::now().timestamp();
    let target = workflow::next_target(&outcome, submission.navigation, &paginator, &keys, now)?;
    let page = paginator.page(&keys, target, now)?;

    if page.keys.is_empty() {
        out.push(section(
            "No untrained messages",
            "<p>There are no untrained messages to display.</p>",
        ))
        .await?;
        return Ok(Outcome::Continue);
    }

    let groups = workflow::bucket_page(state, &page, submission.start_at, submission.how_many)?;
    out.push(html::section_start(&format!("Untrained messages received on {}", page.date)))
        .await?;
    push_review(out, &page, &groups, &submission).await?;
    out.push(html::SECTION_END).await?;
    Ok(Outcome::Continue)
}

/// Streams the navigation form and the message table, one row at a time.
async fn push_review<W>(
    out: &mut ResponseWriter<'_, W>,
    page: &ReviewPage,
    groups: &[(Bucket, Vec<ReviewRow>)],
    submission: &ReviewSubmission,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    let disabled = |ts: i64| if ts == 0 { "disabled" } else { "" };

    out.push(format!(
        "<p>These are untrained emails, which you can use to train the classifier. \
         Check the appropriate button for each email, then click 'Train' below. \
         'Defer' leaves the message here, to be trained on later.</p>\n\
         <form action='review' method='GET'>\n\
         <input type='hidden' name='prior' value='{}'>\n\
         <input type='hidden' name='next' value='{}'>\n\
         <input type='hidden' name='startAt' value='{}'>\n\
         <input type='hidden' name='howMany' value='{}'>\n\
         <input type='submit' name='go' value='Previous day' {}>&nbsp;\n\
         <input type='submit' name='go' value='Next day' {}>\n\
         </form>\n<form action='review' method='POST'>\n<table class='messagetable'>\n",
        page.prior,
        page.next,
        submission.start_at,
        submission.how_many,
        disabled(page.prior),
        disabled(page.next),
    ))
    .await?;

    for (bucket, rows) in groups {
        if rows.is_empty() {
            continue;
        }
        out.push(format!(
            "<tr><td><b>Messages classified as {}:</b></td><td><b>From:</b></td>\
             <td>Discard</td><td>Defer</td><td>Ham</td><td>Spam</td></tr>\n",
            bucket.label()
        ))
        .await?;

        for (i, row) in rows.iter().enumerate() {
            out.push(render_row(row, i % 2 == 0)).await?;
        }
    }

    out.push(
        "<tr><td></td><td></td><td colspan='4'><input type='submit' value='Train'></td></tr>\n\
         </table></form>\n",
    )
    .await?;
    Ok(())
}

fn render_row(row: &ReviewRow, striped: bool) -> String {
    let label = row.suggested.label();
    let key = escape(&row.key);
    let checked = |bucket: Bucket| if row.suggested == bucket { "checked" } else { "" };
    let radio = |value: &str, state: &str| {
        format!("<td><input type='radio' name='classify:{label}:{key}' value='{value}' {state}></td>")
    };

    format!(
        "<tr class='{}'><td><span title=\"{}\"><a href='/view?key={key}&amp;corpus={}'>{}</a></span></td>\
         <td>{}</td>{}{}{}{}</tr>\n",
        if striped { "stripe_on" } else { "stripe_off" },
        trim_and_quote(&row.snippet, 200),
        row.bucket.label(),
        trim_and_quote(&row.subject, 50),
        trim_and_quote(&row.from, 40),
        radio("discard", ""),
        radio("defer", checked(Bucket::Unsure)),
        radio("ham", checked(Bucket::Ham)),
        radio("spam", checked(Bucket::Spam)),
    )
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
