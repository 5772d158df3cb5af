//! IRC case-mapping functions and the case-insensitive directory.
//!
//! IRC uses a special case-insensitive comparison where some characters
//! are considered equivalent (e.g., `[` and `{`). This implements the
//! `rfc1459` case mapping which is the most common.

use std::collections::hash_map::{self, HashMap};

/// Convert a single character to IRC lowercase using RFC 1459 case mapping.
///
/// In addition to ASCII lowercase conversion, this maps:
/// - `[` → `{`
/// - `]` → `}`
/// - `\` → `|`
/// - `~` → `^`
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => (c as u8 + 32) as char,
        _ => c,
    }
}

/// Convert a string to IRC lowercase using RFC 1459 case mapping.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Compare two strings using IRC case-insensitive comparison.
pub fn irc_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.chars()
        .zip(b.chars())
        .all(|(ca, cb)| irc_lower_char(ca) == irc_lower_char(cb))
}

/// A map keyed by IRC identifiers (nicknames, channel names).
///
/// Every key is folded with [`irc_to_lower`] before insert, lookup,
/// membership test and removal, so `Foo`, `FOO` and `foo` address the
/// same entry. Inserting under a different casing overwrites the
/// previous value.
///
/// ```
/// use driftwood_proto::CaseMap;
///
/// let mut users = CaseMap::new();
/// users.insert("Nick[away]", 1);
/// assert_eq!(users.get("nick{AWAY}"), Some(&1));
/// assert_eq!(users.remove("NICK[AWAY]"), Some(1));
/// assert!(users.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseMap<V> {
    inner: HashMap<String, V>,
}

impl<V> Default for CaseMap<V> {
    fn default() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }
}

impl<V> CaseMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one previously stored under an
    /// equivalent key.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        self.inner.insert(irc_to_lower(key), value)
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.inner.get(&irc_to_lower(key))
    }

    /// Look up a value mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.inner.get_mut(&irc_to_lower(key))
    }

    /// Whether an equivalent key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(&irc_to_lower(key))
    }

    /// Remove and return the value stored under an equivalent key.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        self.inner.remove(&irc_to_lower(key))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Iterate over `(folded key, value)` pairs in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, String, V> {
        self.inner.iter()
    }

    /// Iterate over the folded keys.
    pub fn keys(&self) -> hash_map::Keys<'_, String, V> {
        self.inner.keys()
    }

    /// Iterate over the values.
    pub fn values(&self) -> hash_map::Values<'_, String, V> {
        self.inner.values()
    }
}

impl<'a, V> IntoIterator for &'a CaseMap<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = hash_map::Iter<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_irc_lower_char() {
        assert_eq!(irc_lower_char('A'), 'a');
        assert_eq!(irc_lower_char('Z'), 'z');

        assert_eq!(irc_lower_char('['), '{');
        assert_eq!(irc_lower_char(']'), '}');
        assert_eq!(irc_lower_char('\\'), '|');
        assert_eq!(irc_lower_char('~'), '^');

        assert_eq!(irc_lower_char('a'), 'a');
        assert_eq!(irc_lower_char('#'), '#');
    }

    #[test]
    fn test_irc_to_lower() {
        assert_eq!(irc_to_lower("HELLO"), "hello");
        assert_eq!(irc_to_lower("#Channel[1]"), "#channel{1}");
        assert_eq!(irc_to_lower("Nick\\Away"), "nick|away");
    }

    #[test]
    fn test_irc_eq() {
        assert!(irc_eq("hello", "HELLO"));
        assert!(irc_eq("#channel[1]", "#CHANNEL{1}"));
        assert!(!irc_eq("hello", "world"));
        assert!(!irc_eq("short", "longer"));
    }

    #[test]
    fn test_casemap_insert_lookup_delete() {
        let mut map = CaseMap::new();
        map.insert("Foo", 1);

        assert_eq!(map.get("foo"), Some(&1));
        assert!(map.contains_key("FOO"));
        assert_eq!(map.remove("FOO"), Some(1));
        assert!(!map.contains_key("foo"));
    }

    #[test]
    fn test_casemap_last_writer_wins() {
        let mut map = CaseMap::new();
        assert_eq!(map.insert("#Rust", "first"), None);
        assert_eq!(map.insert("#RUST", "second"), Some("first"));

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("#rust"), Some(&"second"));
    }

    #[test]
    fn test_casemap_get_mut() {
        let mut map = CaseMap::new();
        map.insert("Nick", 1);
        if let Some(v) = map.get_mut("NICK") {
            *v += 1;
        }
        assert_eq!(map.get("nick"), Some(&2));
    }
}
