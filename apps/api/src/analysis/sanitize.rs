// Response sanitization: untrusted model text → candidate JSON document.
// Ordered steps, each independently testable:
//   1. fenced block  → content between the first and last ``` markers
//   2. otherwise     → slice from the first '{' to the last '}' inclusive
//   3. trim surrounding whitespace
// Nothing here validates JSON; decoding is the caller's job.

const FENCE: &str = "```";

/// Runs the full sanitization sequence. Never allocates.
pub fn sanitize_response(raw: &str) -> &str {
    extract_fenced(raw)
        .or_else(|| slice_braces(raw))
        .unwrap_or(raw)
        .trim()
}

/// Content between the first and last fence markers, minus the info string
/// (`json`, `JSON`, ...) that may follow the opening fence.
/// A lone marker (e.g. truncated output) does not count as a fenced block.
pub fn extract_fenced(raw: &str) -> Option<&str> {
    let first = raw.find(FENCE)?;
    let last = raw.rfind(FENCE)?;
    if last <= first {
        return None;
    }
    let inner = &raw[first + FENCE.len()..last];
    Some(inner.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
}

/// The span from the first `{` to the last `}`, if both exist in that order.
pub fn slice_braces(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
