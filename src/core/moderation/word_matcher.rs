// Denylist word matching for comment bodies.

use std::collections::{BTreeSet, HashSet};

/// Split text into lowercase words.
///
/// A word is a run of alphanumeric characters or underscores; everything else
/// is a boundary.
pub fn split_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Does `text` contain any word from the (lowercase) denylist?
pub fn contains_denied_word(denylist: &BTreeSet<String>, text: &str) -> bool {
    if denylist.is_empty() {
        return false;
    }

    split_words(text).iter().any(|w| denylist.contains(w))
}
