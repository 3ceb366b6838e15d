/// Local filename for a downloaded file: the server's suggestion when usable,
/// otherwise `fallback`. Path separators and characters Windows rejects are
/// replaced so the result always stays inside the target directory.
pub fn local_filename(suggested: Option<&str>, fallback: &str) -> String {
    let candidate = suggested
        .map(|name| name.rsplit(['/', '\\']).next().unwrap_or(name))
        .map(sanitize)
        .filter(|name| !name.is_empty());
    match candidate {
        Some(name) => name,
        None => {
            let name = sanitize(fallback);
            if name.is_empty() {
                "download".to_string()
            } else {
                name
            }
        }
    }
}

fn sanitize(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    let mut final_name = truncate_chars(compacted, 120);
    let stem_len = final_name.find('.').unwrap_or(final_name.len());
    if is_reserved_windows_name(&final_name[..stem_len]) {
        final_name.insert(stem_len, '_');
    }
    final_name
}

fn truncate_chars(name: String, max: usize) -> String {
    match name.char_indices().nth(max) {
        Some((end, _)) => name[..end].to_string(),
        None => name,
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
