/// Characters kept from the stripped body.
pub const EXCERPT_CHARS: usize = 120;

/// Remove `<...>` tags. A `<` with no later `>` is plain text.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Plain-text preview of an HTML body: tags stripped, the first
/// `EXCERPT_CHARS` characters, always followed by `...`.
pub fn excerpt(html: &str) -> String {
    let mut out: String = strip_tags(html).chars().take(EXCERPT_CHARS).collect();
    out.push_str("...");
    out
}
