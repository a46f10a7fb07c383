//! Scanning state machines for the context-sensitive grammar families.
//!
//! A handful of ambiguity patterns recur across MT fields. Each one is a
//! small state machine here so hooks share the boundary logic instead of
//! re-implementing it per field:
//!
//! - [`MarkerThenCode`]: a 1- or 2-character marker chosen by its first
//!   letter, followed by a letter code (statement line debit/credit mark).
//! - [`StackedNumeric`]: one run of digits split into fixed-width groups
//!   (date + optional entry date, date + time).
//! - [`SlashSplit`]: `QUAL/DSS/VALUE` vs `QUAL//VALUE`, and `REF//REF`.
//!
//! All scanners work on ASCII classes only (see the note in
//! [`super::tokens`]), so every offset they return is a char boundary.

// ─── Marker then code ───────────────────────────────────────────────────────

/// First letters that open a 2-character marker (`RC`, `RD`, `EC`, `ED`).
const TWO_CHAR_MARKERS: &[u8] = b"RE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkerState {
    /// Expecting the first marker letter.
    Start,
    /// First letter opened a 2-character marker; expecting the second.
    Second,
    /// Marker complete; consuming the code.
    Code,
}

/// Result of scanning a marker followed by a letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerThenCode<'a> {
    /// The marker (`"D"`, `"RC"`); empty when the input starts with a non-letter.
    pub marker: &'a str,
    /// Letters after the marker, up to the first digit, comma, or other non-letter.
    pub code: &'a str,
    /// Byte offset where the marker ends and the code starts.
    pub marker_end: usize,
    /// Byte offset where the code ends.
    pub end: usize,
}

impl<'a> MarkerThenCode<'a> {
    /// Scan `s` from its start.
    pub fn scan(s: &'a str) -> Self {
        let b = s.as_bytes();
        let mut state = MarkerState::Start;
        let mut marker_end = 0usize;
        let mut i = 0usize;

        while i < b.len() {
            let c = b[i];
            match state {
                MarkerState::Start => {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    i += 1;
                    if TWO_CHAR_MARKERS.contains(&c) {
                        state = MarkerState::Second;
                    } else {
                        marker_end = i;
                        state = MarkerState::Code;
                    }
                }
                MarkerState::Second => {
                    if c.is_ascii_alphabetic() {
                        i += 1;
                    }
                    marker_end = i;
                    state = MarkerState::Code;
                }
                MarkerState::Code => {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    i += 1;
                }
            }
        }
        if state == MarkerState::Second {
            marker_end = i;
        }

        Self {
            marker: &s[..marker_end],
            code: &s[marker_end..i],
            marker_end,
            end: i,
        }
    }
}

// ─── Stacked numeric groups ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum StackState {
    /// Filling group `index`, which started at byte `start`.
    Group { index: usize, start: usize },
    Done,
}

/// Result of splitting a leading digit run into fixed-width groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackedNumeric<'a> {
    /// Groups found, in order. Only the last one may be shorter than its width.
    pub groups: Vec<&'a str>,
    /// Byte offset where scanning stopped.
    pub end: usize,
}

impl<'a> StackedNumeric<'a> {
    /// Split the leading digits of `s` into groups of the given widths.
    ///
    /// A group closes when it reaches its width; the next group starts on the
    /// following digit. Scanning stops at the first non-digit or after the
    /// last group. `usize::MAX` makes a group take the rest of the run.
    pub fn scan(s: &'a str, widths: &[usize]) -> Self {
        let b = s.as_bytes();
        let mut groups = Vec::with_capacity(widths.len());
        let mut state = StackState::Group { index: 0, start: 0 };
        let mut i = 0usize;

        while let StackState::Group { index, start } = state {
            let Some(&width) = widths.get(index) else {
                state = StackState::Done;
                continue;
            };
            if i < b.len() && b[i].is_ascii_digit() && i - start < width {
                i += 1;
                if i - start == width {
                    groups.push(&s[start..i]);
                    state = StackState::Group {
                        index: index + 1,
                        start: i,
                    };
                }
                continue;
            }
            if i > start {
                groups.push(&s[start..i]);
            }
            state = StackState::Done;
        }

        Self { groups, end: i }
    }
}

// ─── Slash splits ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum SlashState {
    /// Inside the qualifier.
    Head,
    /// Just past the first `/`.
    FirstSlash,
    /// Inside the data source scheme, which started at the given byte.
    Scheme(usize),
}

/// Result of splitting a generic-field body `QUAL/DSS/VALUE` or `QUAL//VALUE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlashSplit<'a> {
    /// Everything before the first `/`.
    pub head: &'a str,
    /// The data source scheme between the first and second `/`, when present.
    pub scheme: Option<&'a str>,
    /// Everything after the second `/`; `None` when the second `/` never came.
    pub tail: Option<&'a str>,
    /// Byte offset of `tail` within the input (the input length when absent).
    pub tail_offset: usize,
}

impl<'a> SlashSplit<'a> {
    /// Split a qualified body (without its leading `:`).
    pub fn qualified(s: &'a str) -> Self {
        let b = s.as_bytes();
        let mut state = SlashState::Head;
        let mut head_end = s.len();

        for (i, &c) in b.iter().enumerate() {
            state = match (state, c) {
                (SlashState::Head, b'/') => {
                    head_end = i;
                    SlashState::FirstSlash
                }
                (SlashState::Head, _) => SlashState::Head,
                (SlashState::FirstSlash, b'/') => {
                    return Self::with_tail(s, head_end, None, i + 1);
                }
                (SlashState::FirstSlash, _) => SlashState::Scheme(i),
                (SlashState::Scheme(start), b'/') => {
                    return Self::with_tail(s, head_end, Some(&s[start..i]), i + 1);
                }
                (SlashState::Scheme(start), _) => SlashState::Scheme(start),
            };
        }

        let scheme = match state {
            SlashState::Scheme(start) => Some(&s[start..]),
            _ => None,
        };
        Self {
            head: &s[..head_end],
            scheme,
            tail: None,
            tail_offset: s.len(),
        }
    }

    fn with_tail(s: &'a str, head_end: usize, scheme: Option<&'a str>, tail_offset: usize) -> Self {
        Self {
            head: &s[..head_end],
            scheme,
            tail: Some(&s[tail_offset..]),
            tail_offset,
        }
    }

    /// Split a two-part identifier at the first `//`.
    pub fn double(s: &str) -> (&str, Option<&str>) {
        match s.find("//") {
            Some(i) => (&s[..i], Some(&s[i + 2..])),
            None => (s, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_two_chars_after_r_or_e() {
        let m = MarkerThenCode::scan("RC1000,");
        assert_eq!((m.marker, m.code, m.marker_end, m.end), ("RC", "", 2, 2));
        let m = MarkerThenCode::scan("EDR25,");
        assert_eq!((m.marker, m.code, m.end), ("ED", "R", 3));
    }

    #[test]
    fn marker_one_char_otherwise() {
        let m = MarkerThenCode::scan("D1000,");
        assert_eq!((m.marker, m.code, m.marker_end), ("D", "", 1));
        let m = MarkerThenCode::scan("CR1000,");
        assert_eq!((m.marker, m.code, m.end), ("C", "R", 2));
    }

    #[test]
    fn marker_edge_cases() {
        let m = MarkerThenCode::scan("");
        assert_eq!((m.marker, m.code, m.end), ("", "", 0));
        let m = MarkerThenCode::scan("123");
        assert_eq!((m.marker, m.end), ("", 0));
        // R followed by a digit closes the marker after one character.
        let m = MarkerThenCode::scan("R5");
        assert_eq!((m.marker, m.code, m.end), ("R", "", 1));
        let m = MarkerThenCode::scan("E");
        assert_eq!((m.marker, m.end), ("E", 1));
    }

    #[test]
    fn stacked_splits_date_and_entry_date() {
        let s = StackedNumeric::scan("2310151016C", &[6, 4]);
        assert_eq!(s.groups, vec!["231015", "1016"]);
        assert_eq!(s.end, 10);

        let s = StackedNumeric::scan("231015C", &[6, 4]);
        assert_eq!(s.groups, vec!["231015"]);
        assert_eq!(s.end, 6);
    }

    #[test]
    fn stacked_keeps_short_groups_and_stops_after_last() {
        let s = StackedNumeric::scan("2310", &[6, 4]);
        assert_eq!(s.groups, vec!["2310"]);
        let s = StackedNumeric::scan("231015101699", &[6, 4]);
        assert_eq!(s.groups, vec!["231015", "1016"]);
        assert_eq!(s.end, 10);
        let s = StackedNumeric::scan("ABC", &[6]);
        assert!(s.groups.is_empty());
        assert_eq!(s.end, 0);
    }

    #[test]
    fn stacked_unbounded_group_takes_rest_of_run() {
        let s = StackedNumeric::scan("20231015123456X", &[8, usize::MAX]);
        assert_eq!(s.groups, vec!["20231015", "123456"]);
        assert_eq!(s.end, 14);
    }

    #[test]
    fn slash_split_with_and_without_scheme() {
        let s = SlashSplit::qualified("TRAD//20231015");
        assert_eq!((s.head, s.scheme, s.tail), ("TRAD", None, Some("20231015")));
        assert_eq!(s.tail_offset, 6);

        let s = SlashSplit::qualified("ACCT/ABC/12345");
        assert_eq!((s.head, s.scheme, s.tail), ("ACCT", Some("ABC"), Some("12345")));
        assert_eq!(s.tail_offset, 9);
    }

    #[test]
    fn slash_split_incomplete_bodies() {
        let s = SlashSplit::qualified("TRAD");
        assert_eq!((s.head, s.scheme, s.tail), ("TRAD", None, None));
        let s = SlashSplit::qualified("TRAD/");
        assert_eq!((s.head, s.scheme, s.tail), ("TRAD", None, None));
        let s = SlashSplit::qualified("TRAD/X");
        assert_eq!((s.head, s.scheme, s.tail), ("TRAD", Some("X"), None));
        let s = SlashSplit::qualified("TRAD//");
        assert_eq!(s.tail, Some(""));
    }

    #[test]
    fn slash_split_tail_keeps_later_slashes() {
        let s = SlashSplit::qualified("SETT//FAMT/1000,");
        assert_eq!(s.tail, Some("FAMT/1000,"));
    }

    #[test]
    fn double_slash_split() {
        assert_eq!(SlashSplit::double("NONREF//8951234"), ("NONREF", Some("8951234")));
        assert_eq!(SlashSplit::double("NONREF"), ("NONREF", None));
        assert_eq!(SlashSplit::double("A/B//C//D"), ("A/B", Some("C//D")));
    }
}
