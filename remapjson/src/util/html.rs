//! HTML escaping for preview fragments.

/// Escape `<`, `>`, `&`, `'` and `"` so text can be embedded in HTML.
///
/// Quotes use numeric references (`&#39;`, `&#34;`), matching what the web UI
/// expects back from the preview endpoints.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&#34;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
