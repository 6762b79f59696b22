use std::sync::OnceLock;

use regex::Regex;

pub const PHONE_DIGITS: usize = 10;

/// Strips everything but ASCII digits and accepts the result only when it
/// is exactly [`PHONE_DIGITS`] long.
pub fn normalize_phone(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == PHONE_DIGITS {
        Some(digits)
    } else {
        None
    }
}

fn iso_date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("static pattern compiles"))
}

/// Syntactic `YYYY-MM-DD` check. Calendar validity is left to the server,
/// so `2020-13-40` passes. Only ASCII digits count; `\d` would also match
/// other Unicode decimal digits.
pub fn is_iso_date_shape(input: &str) -> bool {
    iso_date_pattern().is_match(input.trim())
}
