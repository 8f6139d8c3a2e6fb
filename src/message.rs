//! Just enough RFC 5322 handling to summarise a message for review.

/// Splits a message into its header block and body at the first blank
/// line, whichever line ending it uses.
pub fn split(message: &str) -> (&str, &str) {
    let crlf = message.find("\r\n\r\n").map(|i| (i, 4));
    let lf = message.find("\n\n").map(|i| (i, 2));
    let blank = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 < b.0 { a } else { b }),
        (a, b) => a.or(b),
    };
    match blank {
        Some((i, len)) => (&message[..i], &message[i + len..]),
        None => (message, ""),
    }
}

/// First value of header `name`, unfolded.
pub fn header(message: &str, name: &str) -> Option<String> {
    let (headers, _) = split(message);
    let mut found: Option<String> = None;

    for line in headers.lines() {
        let line = line.trim_end_matches('\r');
        if line.starts_with([' ', '\t']) {
            if let Some(value) = found.as_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if found.is_some() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.trim().eq_ignore_ascii_case(name) {
                found = Some(value.trim().to_string());
            }
        }
    }

    found
}

/// Body text with runs of whitespace collapsed.
pub fn body_text(message: &str) -> String {
    let (_, body) = split(message);
    let text = body.replace("&nbsp;", " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits uploaded content into messages.
///
/// Line endings are normalised to `\n`; all other bytes are kept as they
/// are. Content starting with `From ` is a Unix mailbox whose messages each
/// begin with a `From ` line; those lines are dropped. Anything else is a
/// single message.
pub fn split_mbox(content: &[u8]) -> Vec<Vec<u8>> {
    let content = normalize_newlines(content);
    if !content.starts_with(b"From ") {
        return vec![content];
    }

    let mut messages = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    for line in content.split_inclusive(|&b| b == b'\n') {
        if line.starts_with(b"From ") {
            if let Some(message) = current.take() {
                messages.push(message);
            }
            current = Some(Vec::new());
        } else if let Some(message) = current.as_mut() {
            message.extend_from_slice(line);
        }
    }
    messages.extend(current);
    messages
}

fn normalize_newlines(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut bytes = content.iter().copied().peekable();
    while let Some(b) = bytes.next() {
        if b == b'\r' {
            bytes.next_if_eq(&b'\n');
            out.push(b'\n');
        } else {
            out.push(b);
        }
    }
    out
}
