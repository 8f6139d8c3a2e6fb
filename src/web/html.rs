//! HTML fragments shared by the pages.

/// Escapes text for use in element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Truncates to `limit` characters, ending in "..." when shortened, then
/// escapes.
pub fn trim_and_quote(field: &str, limit: usize) -> String {
    if field.chars().count() <= limit {
        return escape(field);
    }
    let kept: String = field.chars().take(limit.saturating_sub(3)).collect();
    escape(&format!("{kept}..."))
}

pub fn preamble(title: &str, show_image: bool) -> String {
    let crumbs = if title == "Home" {
        title.to_string()
    } else {
        format!("<a href='home'>Home</a> &gt; {title}")
    };
    let image = if show_image {
        "<img src='helmet.gif' align='absmiddle'>&nbsp;"
    } else {
        ""
    };
    format!(
        "<!DOCTYPE html>\n<html><head><title>Spambayes Trainer: {title}</title></head>\n\
         <body>\n<div class='banner'>{image}<span class='header'>Spambayes Trainer: {crumbs}</span></div>\n\
         <div class='content'>\n"
    )
}

pub fn trailer(time: &str) -> String {
    format!(
        "</div>\n<form action='save' method='POST'>\n\
         <p><a href='home'>Spambayes Trainer</a>, {time}.\n\
         <input type='submit' name='how' value='Save'>\n\
         <input type='submit' name='how' value='Save &amp; shutdown'></p>\n\
         </form>\n</body></html>\n"
    )
}

/// Closes what [`section_start`] opened.
pub const SECTION_END: &str = "</td></tr></table>\n<br>\n";

/// Opens a titled section whose body is pushed separately.
pub fn section_start(title: &str) -> String {
    format!(
        "<table class='sectiontable'>\n<tr><td class='sectionheading'>{title}</td></tr>\n\
         <tr><td class='sectionbody'>"
    )
}

pub fn section(title: &str, body: &str) -> String {
    format!("{}{body}{SECTION_END}", section_start(title))
}

/// Upload form posting a message file or pasted text to `action`.
pub fn upload_form(action: &str, buttons: &[&str]) -> String {
    let submits: Vec<String> = buttons
        .iter()
        .map(|b| format!("<input type='submit' name='which' value='{b}'>"))
        .collect();
    format!(
        "<form action='{action}' method='POST' enctype='multipart/form-data'>\n\
         Either upload a message or mbox file: <input type='file' name='file'><br>\n\
         Or paste one whole message (including headers) here:<br>\n\
         <textarea name='text' rows='3' cols='60'></textarea><br>\n{}\n</form>",
        submits.join("&nbsp;")
    )
}

pub fn word_query_form(word: &str) -> String {
    format!(
        "<form action='wordquery'>\n<input name='word' value='{}' type='text' size='30'>\n\
         <input type='submit' value='Tell me about this word'>\n</form>",
        escape(word)
    )
}
