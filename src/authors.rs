//! Author name normalization.
//!
//! Google Scholar shows authors as free text ("JS Smith, A. Jones, ..."). This module
//! turns such a string into an ordered [`AuthorSet`] of lower-case [`AuthorToken`]s
//! that the [`matching`](crate::matching) module can compare.
//!
//! Normalization is pure and idempotent: feeding a token's text back through
//! [`AuthorToken::normalize`] yields the same token.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// "et al." in any case, with or without the periods. "et" and "al" must be
/// apart or joined by a period, so a surname like "Etal" survives.
static ET_AL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bet(?:\.\s*|\s+)al\b\.?").expect("valid et al regex"));

/// Truncation markers Scholar appends to long author lists.
static TRUNCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"…|\.{3,}").expect("valid truncation regex"));

/// Innermost parenthetical, e.g. an affiliation.
static PARENTHETICAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("valid parenthetical regex"));

static INITIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\p{L})\.").expect("valid initial regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// One normalized author identity.
///
/// Always lower-case, free of parentheticals and "et al.", with initials expanded
/// ("j.s. smith" becomes "j s smith") and whitespace collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AuthorToken(String);

impl AuthorToken {
    /// Normalize one raw author name. Returns `None` if nothing is left.
    pub fn normalize(raw: &str) -> Option<Self> {
        let mut current = raw.to_string();
        // Each pass only removes text or replaces periods, so this settles quickly.
        loop {
            let next = normalize_pass(&current);
            if next == current {
                break;
            }
            current = next;
        }

        if current.is_empty() {
            None
        } else {
            Some(Self(current))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whitespace-separated words of the name.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ')
    }

    pub fn word_count(&self) -> usize {
        self.words().count()
    }

    pub fn first_word(&self) -> &str {
        self.words().next().unwrap_or_default()
    }

    pub fn last_word(&self) -> &str {
        self.words().last().unwrap_or_default()
    }
}

impl fmt::Display for AuthorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AuthorToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn normalize_pass(input: &str) -> String {
    let text = strip_parentheticals(input).replace(['(', ')'], "");
    let text = ET_AL.replace_all(&text, "");
    let text = TRUNCATION.replace_all(&text, "");
    let text = text.to_lowercase();
    let text = INITIAL.replace_all(&text, "$1 ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Remove parenthesized text, innermost first, so nested groups go too.
fn strip_parentheticals(input: &str) -> String {
    let mut current = input.to_string();
    while PARENTHETICAL.is_match(&current) {
        current = PARENTHETICAL.replace_all(&current, "").into_owned();
    }
    current
}

/// Ordered author tokens parsed from one raw author field.
///
/// Order follows the source string and is kept for display only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorSet(Vec<AuthorToken>);

impl AuthorSet {
    /// Parse a raw, comma-separated author string.
    ///
    /// Empty input yields an empty set.
    pub fn parse(raw: &str) -> Self {
        // Affiliations may contain commas, so they go before the split.
        let without_affiliations = strip_parentheticals(raw);
        let without_markers = ET_AL.replace_all(&without_affiliations, "");
        let without_markers = TRUNCATION.replace_all(&without_markers, "");

        without_markers
            .split(',')
            .filter_map(AuthorToken::normalize)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AuthorToken> {
        self.0.iter()
    }

    /// Token texts in order.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(AuthorToken::as_str).collect()
    }
}

impl FromIterator<AuthorToken> for AuthorSet {
    fn from_iter<I: IntoIterator<Item = AuthorToken>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AuthorSet {
    type Item = &'a AuthorToken;
    type IntoIter = std::slice::Iter<'a, AuthorToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Extract and normalize the authors of a raw author string.
pub fn extract_authors(raw: &str) -> AuthorSet {
    AuthorSet::parse(raw)
}
