//! Author identity matching and the self-citation predicate.
//!
//! Matching is heuristic. Two tokens denote the same person when, in order:
//!
//! 1. they are equal;
//! 2. one is a bare surname and the other is a longer name ending in it;
//! 3. both are multi-word, share the last word, and their first words start
//!    with the same letter ("j smith" / "john smith").
//!
//! A looser "one name contains the other" rule was considered and rejected: it
//! matches unrelated people far too often.

use crate::authors::{AuthorSet, AuthorToken};

/// Whether two normalized tokens plausibly name the same person.
pub fn matches(a: &AuthorToken, b: &AuthorToken) -> bool {
    if a == b {
        return true;
    }

    let (a_words, b_words) = (a.word_count(), b.word_count());

    if a_words == 1 && b_words > 1 {
        return b.last_word() == a.as_str();
    }
    if b_words == 1 && a_words > 1 {
        return a.last_word() == b.as_str();
    }

    a_words > 1
        && b_words > 1
        && a.last_word() == b.last_word()
        && a.first_word().chars().next() == b.first_word().chars().next()
}

/// Whether any author in `a` matches any author in `b`.
///
/// Either set being empty means no overlap.
pub fn has_overlap(a: &AuthorSet, b: &AuthorSet) -> bool {
    a.iter().any(|x| b.iter().any(|y| matches(x, y)))
}
