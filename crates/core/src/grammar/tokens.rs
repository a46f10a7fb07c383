//! Stateless scanning primitives shared by the strategies and hooks.
//!
//! Every function is pure and total: no input makes them panic, and "no
//! match" is expressed as `None` or as the whole input, never as an error.
//! Returned slices borrow from the input.
//!
//! # Safety of byte scanning
//!
//! Line breaks, delimiters, digits, and ASCII letters are all single-byte
//! ASCII values (0x00–0x7F). UTF-8 continuation bytes are in the range
//! 0x80–0xBF, so a byte-level match on any of them always lands on a char
//! boundary and slicing at that index is safe.

/// The wire line-break sequence.
pub const CRLF: &str = "\r\n";

/// Split a raw value into lines, each with the byte offset it starts at.
///
/// Lines are separated by CRLF; a lone LF is tolerated. A lone CR is kept as
/// line content. Empty input yields no lines; a trailing line break yields a
/// trailing empty line.
pub fn lines_indexed(raw: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    if raw.is_empty() {
        return out;
    }
    let b = raw.as_bytes();
    let mut start = 0usize;
    for (i, &byte) in b.iter().enumerate() {
        if byte == b'\n' {
            let end = if i > start && b[i - 1] == b'\r' { i - 1 } else { i };
            out.push((start, &raw[start..end]));
            start = i + 1;
        }
    }
    out.push((start, &raw[start..]));
    out
}

/// Split a raw value into lines (see [`lines_indexed`]).
pub fn lines(raw: &str) -> Vec<&str> {
    lines_indexed(raw).into_iter().map(|(_, l)| l).collect()
}

/// Substring before the first occurrence of `delim`; the whole string if absent.
pub fn first_token(s: &str, delim: char) -> &str {
    s.split_once(delim).map_or(s, |(head, _)| head)
}

/// Substring after the last occurrence of `delim`; the whole string if absent.
pub fn last_token(s: &str, delim: char) -> &str {
    s.rsplit_once(delim).map_or(s, |(_, tail)| tail)
}

/// Split at the first `delim`. The second half is `None` when `delim` is absent.
pub fn split_once_token(s: &str, delim: char) -> (&str, Option<&str>) {
    match s.split_once(delim) {
        Some((head, tail)) => (head, Some(tail)),
        None => (s, None),
    }
}

fn prefix_len(s: &str, pred: impl Fn(u8) -> bool) -> usize {
    s.bytes().take_while(|&b| pred(b)).count()
}

fn suffix_len(s: &str, pred: impl Fn(u8) -> bool) -> usize {
    s.bytes().rev().take_while(|&b| pred(b)).count()
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

/// Longest leading run of ASCII digits.
pub fn numeric_prefix(s: &str) -> Option<&str> {
    non_empty(&s[..prefix_len(s, |b| b.is_ascii_digit())])
}

/// Longest trailing run of ASCII digits.
pub fn numeric_suffix(s: &str) -> Option<&str> {
    non_empty(&s[s.len() - suffix_len(s, |b| b.is_ascii_digit())..])
}

/// Longest leading run of ASCII letters.
pub fn alpha_prefix(s: &str) -> Option<&str> {
    non_empty(&s[..prefix_len(s, |b| b.is_ascii_alphabetic())])
}

/// Longest trailing run of ASCII letters.
pub fn alpha_suffix(s: &str) -> Option<&str> {
    non_empty(&s[s.len() - suffix_len(s, |b| b.is_ascii_alphabetic())..])
}

/// Strip up to `max` leading occurrences of `ch`.
///
/// `drop_leading("//CH123", '/', 1)` is `"/CH123"`: only the account marker
/// goes, content that happens to start with the same character stays.
pub fn drop_leading(s: &str, ch: char, max: usize) -> &str {
    let mut rest = s;
    for _ in 0..max {
        match rest.strip_prefix(ch) {
            Some(r) => rest = r,
            None => break,
        }
    }
    rest
}

/// Split after the first `n` characters (not bytes).
pub fn take_chars(s: &str, n: usize) -> (&str, &str) {
    let at = s.char_indices().nth(n).map_or(s.len(), |(i, _)| i);
    s.split_at(at)
}

/// Smallest index >= `pos` that is a char boundary of `s`, clamped to `s.len()`.
pub fn next_char_boundary(s: &str, pos: usize) -> usize {
    let mut p = pos.min(s.len());
    while p < s.len() && !s.is_char_boundary(p) {
        p += 1;
    }
    p
}
