//! HTML fragments returned to the operator UI (HTMX swaps).
//!
//! Every interpolated value is escaped.

use crate::util::escape_html;

/// Read-only input holding a minted webhook URL, with a copy button.
pub fn webhook_url(url: &str) -> String {
    format!(
        r#"<input type="text" readonly value="{}"><button class="btn-copy" onclick="navigator.clipboard.writeText(this.previousElementSibling.value)">Copy</button>"#,
        escape_html(url)
    )
}

/// Target URL and template recovered from a token.
pub fn unsealed(target_url: &str, template: &str) -> String {
    format!(
        concat!(
            r#"<div class="field"><div class="section-label">Target URL</div>"#,
            r#"<div class="preview-box"><pre>{}</pre></div></div>"#,
            r#"<div class="field"><div class="section-label">Template</div>"#,
            r#"<div class="preview-box"><pre>{}</pre></div></div>"#,
        ),
        escape_html(target_url),
        escape_html(template)
    )
}

pub fn preformatted(text: &str) -> String {
    format!("<pre>{}</pre>", escape_html(text))
}

pub fn error(message: &str) -> String {
    format!(r#"<span class="error">{}</span>"#, escape_html(message))
}
