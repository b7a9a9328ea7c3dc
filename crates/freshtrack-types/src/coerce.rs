//! Normalization of caller-supplied values, with named outcomes.
//!
//! The external contract collapses every fallback to a silent default,
//! but each normalization returns an explicit outcome so the path taken
//! is observable in tests.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::types::EntryKind;

/// Maximum number of words kept in a thought.
pub const MAX_THOUGHT_WORDS: usize = 60;

/// Outcome of parsing a caller-supplied effective date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOutcome {
    /// The string parsed; the parsed instant is used.
    Parsed(OffsetDateTime),
    /// The string did not parse; the supplied "now" is used instead.
    DefaultedToNow(OffsetDateTime),
}

impl DateOutcome {
    /// The instant that will be stored, whichever path produced it.
    pub fn instant(self) -> OffsetDateTime {
        match self {
            DateOutcome::Parsed(ts) | DateOutcome::DefaultedToNow(ts) => ts,
        }
    }
}

/// Parse an effective date from an RFC 3339-like string.
///
/// Accepted forms, tried in order: full RFC 3339 (`2024-01-15T10:00:00Z`),
/// a date-time without offset (assumed UTC), and a bare date (midnight
/// UTC). Anything else falls back to `now`.
pub fn parse_effective_date(raw: &str, now: OffsetDateTime) -> DateOutcome {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return DateOutcome::Parsed(ts);
    }

    let naive = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    if let Ok(dt) = PrimitiveDateTime::parse(raw, naive) {
        return DateOutcome::Parsed(dt.assume_utc());
    }

    let date_only = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(raw, date_only) {
        return DateOutcome::Parsed(date.midnight().assume_utc());
    }

    DateOutcome::DefaultedToNow(now)
}

/// Outcome of interpreting a raw ledger-entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindOutcome {
    /// The label matched a known kind.
    Known(EntryKind),
    /// Unknown label, coerced to [`EntryKind::Entry`].
    CoercedToEntry,
}

impl KindOutcome {
    /// The kind that will be stored.
    pub fn kind(self) -> EntryKind {
        match self {
            KindOutcome::Known(kind) => kind,
            KindOutcome::CoercedToEntry => EntryKind::Entry,
        }
    }
}

/// Interpret a raw kind label. Unknown labels coerce to `entry`.
pub fn coerce_kind(raw: &str) -> KindOutcome {
    match raw {
        "entry" => KindOutcome::Known(EntryKind::Entry),
        "bonus" => KindOutcome::Known(EntryKind::Bonus),
        _ => KindOutcome::CoercedToEntry,
    }
}

/// Outcome of bounding a free-text note to a word limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipOutcome {
    /// The text was within the limit and is stored unchanged.
    Unchanged(String),
    /// The text exceeded the limit; only the leading words are stored.
    Truncated(String),
}

impl ClipOutcome {
    /// The text that will be stored.
    pub fn into_text(self) -> String {
        match self {
            ClipOutcome::Unchanged(text) | ClipOutcome::Truncated(text) => text,
        }
    }
}

/// Bound `text` to at most `max_words` whitespace-separated words.
///
/// Overflow is truncated, never rejected. Whitespace runs collapse to a
/// single space when the text is truncated.
pub fn clip_words(text: &str, max_words: usize) -> ClipOutcome {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        ClipOutcome::Unchanged(text.to_string())
    } else {
        ClipOutcome::Truncated(words[..max_words].join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-05-10 09:00:00 UTC);

    #[test]
    fn test_parse_effective_date_rfc3339() {
        let outcome = parse_effective_date("2024-01-15T10:00:00Z", NOW);
        assert_eq!(outcome, DateOutcome::Parsed(datetime!(2024-01-15 10:00:00 UTC)));
    }

    #[test]
    fn test_parse_effective_date_with_offset() {
        let outcome = parse_effective_date("2024-01-15T10:00:00+02:00", NOW);
        assert_eq!(
            outcome.instant(),
            datetime!(2024-01-15 10:00:00 +02:00)
        );
    }

    #[test]
    fn test_parse_effective_date_naive_assumes_utc() {
        let outcome = parse_effective_date("2024-01-15T10:00:00", NOW);
        assert_eq!(outcome, DateOutcome::Parsed(datetime!(2024-01-15 10:00:00 UTC)));
    }

    #[test]
    fn test_parse_effective_date_bare_date() {
        let outcome = parse_effective_date("2024-01-15", NOW);
        assert_eq!(outcome, DateOutcome::Parsed(datetime!(2024-01-15 00:00:00 UTC)));
    }

    #[test]
    fn test_parse_effective_date_falls_back_to_now() {
        let outcome = parse_effective_date("next tuesday", NOW);
        assert_eq!(outcome, DateOutcome::DefaultedToNow(NOW));
        assert_eq!(outcome.instant(), NOW);
    }

    #[test]
    fn test_coerce_kind_known() {
        assert_eq!(coerce_kind("entry"), KindOutcome::Known(EntryKind::Entry));
        assert_eq!(coerce_kind("bonus"), KindOutcome::Known(EntryKind::Bonus));
    }

    #[test]
    fn test_coerce_kind_unknown_becomes_entry() {
        let outcome = coerce_kind("refund");
        assert_eq!(outcome, KindOutcome::CoercedToEntry);
        assert_eq!(outcome.kind(), EntryKind::Entry);
    }

    #[test]
    fn test_clip_words_unchanged() {
        let outcome = clip_words("eat the leftovers", MAX_THOUGHT_WORDS);
        assert_eq!(outcome, ClipOutcome::Unchanged("eat the leftovers".to_string()));
    }

    #[test]
    fn test_clip_words_truncates_to_limit() {
        let long: Vec<String> = (0..75).map(|i| format!("w{i}")).collect();
        let outcome = clip_words(&long.join(" "), MAX_THOUGHT_WORDS);

        let ClipOutcome::Truncated(text) = outcome else {
            panic!("expected truncation");
        };
        assert_eq!(text.split_whitespace().count(), 60);
        assert!(text.starts_with("w0 w1"));
        assert!(text.ends_with("w59"));
    }
}
