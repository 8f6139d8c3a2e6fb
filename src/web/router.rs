//! Maps request paths to page handlers.

use chrono::Local;
use tokio::io::AsyncWrite;

use crate::http::request::Request;
use crate::http::response::{Response, ResponseHead, StatusCode};
use crate::http::writer::{ResponseWriter, WriteError};
use crate::state::SharedState;
use crate::web::{assets, html, pages};

/// What the acceptor should do once a response has been flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// Stop accepting connections.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Save,
    Upload,
    Train,
    Review,
    Classify,
    Wordquery,
    View,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Page(Page),
    Helmet,
}

impl Route {
    /// Resolves a request path. `/` is the home page; otherwise the path
    /// without its leading slash, capitalised, names the page.
    pub fn resolve(path: &str) -> Option<Route> {
        if path == "/" {
            return Some(Route::Page(Page::Home));
        }
        if path == assets::HELMET_PATH {
            return Some(Route::Helmet);
        }

        let name = capitalize(path.strip_prefix('/')?);
        let page = match name.as_str() {
            "Home" => Page::Home,
            "Save" => Page::Save,
            "Upload" => Page::Upload,
            "Train" => Page::Train,
            "Review" => Page::Review,
            "Classify" => Page::Classify,
            "Wordquery" => Page::Wordquery,
            "View" => Page::View,
            _ => return None,
        };
        Some(Route::Page(page))
    }
}

impl Page {
    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Save => "Save",
            Page::Upload => "Upload",
            Page::Train => "Train",
            Page::Review => "Review",
            Page::Classify => "Classify",
            Page::Wordquery => "Wordquery",
            Page::View => "View",
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Writes the complete response for `req`.
///
/// Page responses are streamed: the status line and page preamble go out
/// first, then whatever the handler pushes, then the trailer.
pub async fn dispatch<W>(req: &Request, shared: &SharedState, out: &mut ResponseWriter<'_, W>) -> anyhow::Result<Outcome>
where
    W: AsyncWrite + Unpin + Send,
{
    let page = match Route::resolve(&req.path) {
        None => {
            tracing::warn!(path = %req.path, "No such page");
            out.send(&Response::not_found(&req.path)).await?;
            return Ok(Outcome::Continue);
        }
        Some(Route::Helmet) => {
            out.send(&assets::helmet()).await?;
            return Ok(Outcome::Continue);
        }
        Some(Route::Page(page)) => page,
    };

    tracing::info!(method = ?req.method, page = page.title(), "Serving page");

    out.push_head(&ResponseHead::new(StatusCode::Ok, "text/html")).await?;

    let is_shutdown = req
        .params
        .text("how")
        .is_some_and(|how| how.to_lowercase().contains("shutdown"));
    out.push(html::preamble(page.title(), !is_shutdown)).await?;

    let mut state = shared.lock().await;
    let result = match page {
        Page::Home => pages::home(&mut state, &req.params, out).await,
        Page::Save => pages::save(&mut state, &req.params, out).await,
        Page::Upload => pages::upload(&mut state, &req.params, out).await,
        Page::Train => pages::train(&mut state, &req.params, out).await,
        Page::Review => pages::review(&mut state, &req.params, out).await,
        Page::Classify => pages::classify(&mut state, &req.params, out).await,
        Page::Wordquery => pages::wordquery(&mut state, &req.params, out).await,
        Page::View => pages::view(&mut state, &req.params, out).await,
    };
    drop(state);

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) if e.downcast_ref::<WriteError>().is_some() => return Err(e),
        Err(e) => {
            tracing::error!(page = page.title(), error = %e, "Page handler failed");
            out.push(format!("<p><b>Error:</b> {}</p>\n", html::escape(&format!("{e:#}"))))
                .await?;
            Outcome::Continue
        }
    };

    if outcome == Outcome::Continue {
        let now = Local::now().format("%a %b %e %H:%M:%S %Y").to_string();
        out.push(html::trailer(&now)).await?;
    }

    Ok(outcome)
}
