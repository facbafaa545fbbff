//! Completion-mention extractor for free-text work notes.
//!
//! Workers describe finished tables in Czech shorthand ("hotový stůl 28.1",
//! "stůl IT42-5 hotový", "dokončeno stul A-123", legacy "TR 36"). Each
//! pattern runs over the whole note; hits are merged in pattern order, then
//! left to right, with duplicates dropped.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// How a pattern's captured token is cleaned before it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    /// Any non-whitespace run; trailing sentence punctuation is stripped.
    Free,
    /// Digits with an optional single decimal place; taken verbatim.
    Numeric,
}

/// A single completion pattern with its compiled regex.
#[derive(Debug)]
struct CompletionPattern {
    /// Human-readable form, used in debug logs.
    name: &'static str,
    regex: Regex,
    kind: TokenKind,
}

static PATTERNS: LazyLock<Vec<CompletionPattern>> = LazyLock::new(|| {
    vec![
        // "hotový stůl 28.1"
        CompletionPattern {
            name: "hotový stůl X",
            regex: Regex::new(r"(?i)hotov[ýá]\s+st[ůu]l\s+(\S+)").unwrap(),
            kind: TokenKind::Free,
        },
        // "stůl IT42-5 hotový"
        CompletionPattern {
            name: "stůl X hotový",
            regex: Regex::new(r"(?i)st[ůu]l\s+(\S+)\s+hotov[ýá]").unwrap(),
            kind: TokenKind::Free,
        },
        // "dokončil 22", "dokončeno stul A-123"
        CompletionPattern {
            name: "dokončil [stůl] X",
            regex: Regex::new(r"(?i)dokonč(?:il|eno|en)\s+(?:st[ůu]l\s+)?(\S+)").unwrap(),
            kind: TokenKind::Free,
        },
        // "30 dokončeno", "stůl 42 dokončen"
        CompletionPattern {
            name: "[stůl] X dokončen",
            regex: Regex::new(r"(?i)(?:st[ůu]l\s+)?(\S+)\s+dokonč(?:eno|en)").unwrap(),
            kind: TokenKind::Free,
        },
        // Legacy "TR 36" / "TR36"
        CompletionPattern {
            name: "TR X",
            regex: Regex::new(r"(?i)TR\s*(\d+(?:\.\d)?)").unwrap(),
            kind: TokenKind::Numeric,
        },
    ]
});

/// The noun itself is never a table id ("dokončil stůl" with nothing after it).
static TABLE_NOUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^st[ůu]l$").unwrap());

/// Trailing characters removed from free-form tokens.
const TRAILING_PUNCTUATION: &[char] = &[',', ';', ':', '!', '?', '.', ')', '"', '\''];

/// Extract the ids of tables reported as finished in `description`.
///
/// Never fails: text without a recognizable mention yields an empty list.
/// Matching is case-insensitive but ids keep the casing of the input.
pub fn parse_table_completion_patterns(description: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    if description.is_empty() {
        return found;
    }

    for pattern in PATTERNS.iter() {
        for caps in pattern.regex.captures_iter(description) {
            let Some(raw) = caps.get(1) else {
                continue;
            };
            let Some(token) = clean_token(raw.as_str(), pattern.kind) else {
                continue;
            };
            if seen.insert(token.to_string()) {
                debug!(pattern = pattern.name, table = token, "Completion mention found");
                found.push(token.to_string());
            }
        }
    }

    found
}

fn clean_token(raw: &str, kind: TokenKind) -> Option<&str> {
    let token = match kind {
        TokenKind::Numeric => raw,
        TokenKind::Free => raw.trim_end_matches(TRAILING_PUNCTUATION),
    };
    if token.is_empty() || TABLE_NOUN.is_match(token) {
        return None;
    }
    Some(token)
}
