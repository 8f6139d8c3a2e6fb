mod common;

use trainer::http::writer::ResponseWriter;
use trainer::store::{Corpus, MemoryCorpus};
use trainer::web::{dispatch, Outcome, Page, Route};

use common::{post, request, state_with};

#[test]
fn test_route_resolution() {
    assert_eq!(Route::resolve("/"), Some(Route::Page(Page::Home)));
    assert_eq!(Route::resolve("/home"), Some(Route::Page(Page::Home)));
    assert_eq!(Route::resolve("/wordQuery"), Some(Route::Page(Page::Wordquery)));
    assert_eq!(Route::resolve("/REVIEW"), Some(Route::Page(Page::Review)));
    assert_eq!(Route::resolve("/helmet.gif"), Some(Route::Helmet));
    assert_eq!(Route::resolve("/nowhere"), None);
    assert_eq!(Route::resolve("/review/extra"), None);
}

async fn serve(req: &trainer::http::request::Request, shared: &trainer::state::SharedState) -> (Outcome, String) {
    let mut sink: Vec<u8> = Vec::new();
    let outcome = {
        let mut writer = ResponseWriter::new(&mut sink);
        dispatch(req, shared, &mut writer).await.unwrap()
    };
    (outcome, String::from_utf8_lossy(&sink).into_owned())
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let (state, _) = state_with(MemoryCorpus::new(), 0.5);
    let shared = state.into_shared();
    let req = request(b"GET /nowhere HTTP/1.1\r\n\r\n");

    let (outcome, text) = serve(&req, &shared).await;
    assert_eq!(outcome, Outcome::Continue);
    assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(text.contains("/nowhere"));
}

#[tokio::test]
async fn test_helmet_image() {
    let (state, _) = state_with(MemoryCorpus::new(), 0.5);
    let shared = state.into_shared();
    let req = request(b"GET /helmet.gif HTTP/1.1\r\n\r\n");

    let (_, text) = serve(&req, &shared).await;
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Content-Type: image/gif\r\n"));
    assert!(text.contains("Expires: "));
    assert!(text.contains("GIF89a") || text.contains("GIF87a"));
}

#[tokio::test]
async fn test_home_page_has_preamble_and_trailer() {
    let (state, _) = state_with(MemoryCorpus::new(), 0.5);
    let shared = state.into_shared();
    let req = request(b"GET / HTTP/1.1\r\n\r\n");

    let (outcome, text) = serve(&req, &shared).await;
    assert_eq!(outcome, Outcome::Continue);
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Connection: close\r\n"));
    assert!(text.contains("helmet.gif"));
    assert!(text.contains("Save &amp; shutdown"));
    assert!(text.trim_end().ends_with("</html>"));
}

#[tokio::test]
async fn test_train_as_spam() {
    let (state, recorder) = state_with(MemoryCorpus::new(), 0.5);
    let shared = state.into_shared();
    let req = request(&post("/train", "which=Train+as+Spam&text=Subject%3A+cheap+pills%0A%0Abuy+them+now"));

    let (outcome, text) = serve(&req, &shared).await;
    assert_eq!(outcome, Outcome::Continue);
    assert!(text.contains("Training..."));

    let calls = recorder.train_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1);
    assert!(calls[0].0.contains(&"pills".to_string()));
    assert_eq!(recorder.persist_calls(), 1);
}

#[tokio::test]
async fn test_train_without_message_reports_error() {
    let (state, recorder) = state_with(MemoryCorpus::new(), 0.5);
    let shared = state.into_shared();
    let req = request(&post("/train", "which=Train+as+Ham&text="));

    let (outcome, text) = serve(&req, &shared).await;
    assert_eq!(outcome, Outcome::Continue);
    assert!(text.contains("no message was supplied"));
    assert!(recorder.train_calls().is_empty());
}

#[tokio::test]
async fn test_save_and_shutdown() {
    let (state, recorder) = state_with(MemoryCorpus::new(), 0.5);
    let shared = state.into_shared();
    let req = request(&post("/save", "how=Save+%26+shutdown"));

    let (outcome, text) = serve(&req, &shared).await;
    assert_eq!(outcome, Outcome::Shutdown);
    assert_eq!(recorder.persist_calls(), 1);
    assert!(text.contains("Goodbye"));
    assert!(!text.contains("helmet.gif"));
    assert!(!text.contains("name='how'"));
}

#[tokio::test]
async fn test_save_without_shutdown_continues() {
    let (state, recorder) = state_with(MemoryCorpus::new(), 0.5);
    let shared = state.into_shared();
    let req = request(&post("/save", "how=Save"));

    let (outcome, _) = serve(&req, &shared).await;
    assert_eq!(outcome, Outcome::Continue);
    assert_eq!(recorder.persist_calls(), 1);
}

#[tokio::test]
async fn test_classify_counts_session() {
    let (state, _) = state_with(MemoryCorpus::new(), 0.95);
    let shared = state.into_shared();
    let req = request(&post("/classify", "text=Subject%3A+hi%0A%0Ahello"));

    let (_, text) = serve(&req, &shared).await;
    assert!(text.contains("Spam probability: <b>0.95000000</b>"));
    assert_eq!(shared.lock().await.session.spam, 1);
}

#[tokio::test]
async fn test_wordquery() {
    let (state, _) = state_with(MemoryCorpus::new(), 0.5);
    let shared = state.into_shared();

    let (_, known) = serve(&request(b"GET /wordquery?word=VIAGRA HTTP/1.1\r\n\r\n"), &shared).await;
    assert!(known.contains("Number of spam messages: <b>3</b>"));

    let (_, unknown) = serve(&request(b"GET /wordquery?word=zebra HTTP/1.1\r\n\r\n"), &shared).await;
    assert!(unknown.contains("does not appear in the database"));
}

#[tokio::test]
async fn test_upload_stores_each_mbox_message() {
    let (state, _) = state_with(MemoryCorpus::new(), 0.5);
    let shared = state.into_shared();
    let mbox = "From a@example.com Mon Jan  1 00:00:00 2001\nSubject: one\n\nbody one\n\
                From b@example.com Mon Jan  1 00:00:00 2001\nSubject: two\n\nbody two\n";
    let body = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("text", mbox)
        .finish();

    let (_, text) = serve(&request(&post("/upload", &body)), &shared).await;
    assert!(text.contains("Stored 2 messages"));
    assert_eq!(shared.lock().await.stores.unknown.keys().unwrap().len(), 2);
}

#[tokio::test]
async fn test_view_missing_message() {
    let unknown = MemoryCorpus::with_messages([("1000000000", "Subject: hi\n\n<b>x</b>")]);
    let (state, _) = state_with(unknown, 0.5);
    let shared = state.into_shared();

    let (_, found) = serve(&request(b"GET /view?key=1000000000 HTTP/1.1\r\n\r\n"), &shared).await;
    assert!(found.contains("&lt;b&gt;x&lt;/b&gt;"));

    let (_, missing) = serve(&request(b"GET /view?key=1999999999 HTTP/1.1\r\n\r\n"), &shared).await;
    assert!(missing.contains("Can't find message 1999999999"));
}

#[tokio::test]
async fn test_upload_keeps_file_bytes() {
    let (state, _) = state_with(MemoryCorpus::new(), 0.5);
    let shared = state.into_shared();

    let mut body = Vec::new();
    body.extend_from_slice(b"--b0und\r\nContent-Disposition: form-data; name=\"file\"; filename=\"m.eml\"\r\n\r\n");
    body.extend_from_slice(b"Subject: caf\xe9\r\n\r\nol\xe9");
    body.extend_from_slice(b"\r\n--b0und\r\nContent-Disposition: form-data; name=\"which\"\r\n\r\nUpload");
    body.extend_from_slice(b"\r\n--b0und--\r\n");
    let mut raw = format!(
        "POST /upload HTTP/1.1\r\nContent-Type: multipart/form-data; boundary=b0und\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    raw.extend_from_slice(&body);

    let (_, text) = serve(&request(&raw), &shared).await;
    assert!(text.contains("Stored 1 message."));

    let state = shared.lock().await;
    let keys = state.stores.unknown.keys().unwrap();
    let stored = state.stores.unknown.get(&keys[0]).unwrap().unwrap();
    assert_eq!(&stored[..], b"Subject: caf\xe9\n\nol\xe9");
}

#[tokio::test]
async fn test_review_navigation_keeps_row_offset() {
    let unknown = MemoryCorpus::with_messages([("1000000000", "Subject: hi\n\nhello there")]);
    let (state, _) = state_with(unknown, 0.5);
    let shared = state.into_shared();

    let (_, text) = serve(&request(b"GET /review?startAt=0&howMany=5 HTTP/1.1\r\n\r\n"), &shared).await;
    assert!(text.contains("<input type='hidden' name='startAt' value='0'>"));
    assert!(text.contains("<input type='hidden' name='howMany' value='5'>"));
    assert!(text.contains("name='classify:Unsure:1000000000'"));
    assert!(text.contains("Previous day' disabled"));
}
