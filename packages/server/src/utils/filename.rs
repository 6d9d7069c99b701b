/// Validate an upload filename: flat, visible, header-safe.
///
/// Returns the trimmed name. Uploads keep the client's name for display
/// and downloads, so anything path-like or unprintable is refused here
/// before it ever reaches the catalog.
pub fn validate_upload_name(raw: &str) -> Result<&str, &'static str> {
    let name = raw.trim();

    if name.is_empty() {
        return Err("A file name is required");
    }
    if name.contains(['/', '\\']) {
        return Err("File names must not contain path separators");
    }
    if name == ".." {
        return Err("File names must not be '..'");
    }
    if name.starts_with('.') {
        return Err("Hidden file names are not allowed");
    }
    // A control character would let a name smuggle CRLF into the
    // Content-Disposition header.
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err("File names must not contain control characters");
    }

    Ok(name)
}

/// Build a safe `Content-Disposition` header value for a download.
pub fn content_disposition(filename: &str, attachment: bool) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    let disposition = if attachment { "attachment" } else { "inline" };
    format!("{disposition}; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
