//! Response chunking for length-limited chat transports.
//!
//! Chat networks cap message length, so long generated answers are split
//! into ordered segments. Breaks prefer whitespace; a run without any
//! whitespace inside the window is hard-cut at the limit.

/// Maximum characters per chat message.
pub const MAX_SEGMENT_CHARS: usize = 500;

/// Split `text` into segments of at most `limit` characters.
///
/// Whitespace at split points is dropped, so no segment starts or ends
/// with whitespace. Empty or whitespace-only input yields no segments.
/// Lengths are counted in Unicode scalar values, never splitting a
/// character.
#[must_use]
pub fn split_response(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut segments = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let Some((cut, _)) = rest.char_indices().nth(limit) else {
            segments.push(rest.trim_end().to_owned());
            break;
        };

        let window = &rest[..cut];
        let boundary_is_space = rest[cut..].starts_with(char::is_whitespace);
        let split = if boundary_is_space {
            cut
        } else {
            window
                .rfind(char::is_whitespace)
                .filter(|&at| at > 0)
                .unwrap_or(cut)
        };

        segments.push(rest[..split].trim_end().to_owned());
        rest = rest[split..].trim_start();
    }

    segments
}
