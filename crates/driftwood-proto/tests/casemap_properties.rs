//! Property-based tests for case folding and the case-insensitive map.

use driftwood_proto::{irc_eq, irc_to_lower, CaseMap};
use proptest::prelude::*;

fn identifier_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[#&]?[a-zA-Z\\[\\]\\\\~^{}|_0-9-]{1,16}").expect("valid regex")
}

/// Randomly flip case-mapped characters to their counterparts.
fn recase(s: &str, flips: &[bool]) -> String {
    s.chars()
        .zip(flips.iter().cycle())
        .map(|(c, &flip)| {
            if !flip {
                return c;
            }
            match c {
                '[' => '{',
                '{' => '[',
                ']' => '}',
                '}' => ']',
                '\\' => '|',
                '|' => '\\',
                '~' => '^',
                '^' => '~',
                c if c.is_ascii_lowercase() => c.to_ascii_uppercase(),
                c => c.to_ascii_lowercase(),
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn folding_is_idempotent(s in identifier_strategy()) {
        let once = irc_to_lower(&s);
        prop_assert_eq!(irc_to_lower(&once), once);
    }

    #[test]
    fn recased_keys_address_the_same_entry(
        s in identifier_strategy(),
        flips in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let other = recase(&s, &flips);
        prop_assert!(irc_eq(&s, &other));

        let mut map = CaseMap::new();
        map.insert(&s, 1);
        prop_assert!(map.contains_key(&other));
        prop_assert_eq!(map.insert(&other, 2), Some(1));
        prop_assert_eq!(map.len(), 1);
        prop_assert_eq!(map.remove(&s), Some(2));
        prop_assert!(map.is_empty());
    }
}
