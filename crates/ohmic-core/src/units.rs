//! SPICE-style value parsing.

use crate::error::{Error, Result};

/// Parse a SPICE-style value with an optional scale suffix.
///
/// Recognized suffixes, case-insensitive: `meg` (1e6), `k` (1e3),
/// `m` (1e-3), `u` (1e-6), `n` (1e-9). `meg` is matched before the
/// single-character suffixes so that `1meg` is a mega, not a milli
/// followed by junk. A trailing character outside this set is not
/// treated as a suffix; the literal is parsed as a plain number and a
/// failure to parse reports the whole input.
pub fn parse_value(s: &str) -> Result<f64> {
    if s.is_empty() {
        return Err(Error::EmptyValue);
    }

    let lower = s.to_ascii_lowercase();
    let (num, multiplier) = if lower.len() > 3 && lower.ends_with("meg") {
        (&s[..s.len() - 3], 1e6)
    } else {
        match lower.as_bytes()[lower.len() - 1] {
            b'k' => (&s[..s.len() - 1], 1e3),
            b'm' => (&s[..s.len() - 1], 1e-3),
            b'u' => (&s[..s.len() - 1], 1e-6),
            b'n' => (&s[..s.len() - 1], 1e-9),
            _ => (s, 1.0),
        }
    };

    num.parse::<f64>()
        .map(|v| v * multiplier)
        .map_err(|_| Error::MalformedValue(s.to_string()))
}
