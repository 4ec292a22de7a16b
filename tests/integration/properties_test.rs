//! Property tests for substitution and profile merging.

use http_cli::profile::{merge_profiles, Profile};
use http_cli::variables::replace_variables;
use proptest::collection::{btree_map, hash_map, vec};
use proptest::prelude::*;
use std::collections::HashMap;

fn variable_map() -> impl Strategy<Value = HashMap<String, String>> {
    // Values never contain braces, so one pass resolves every known name.
    hash_map("[a-z]{1,6}", "[a-zA-Z0-9 ./:-]{0,12}", 0..8)
}

fn template() -> impl Strategy<Value = String> {
    vec(
        prop_oneof![
            "[a-zA-Z0-9 /?=&.-]{0,10}",
            "[a-z]{1,6}".prop_map(|name| format!("{{{}}}", name)),
            "[a-z]{1,6}:[a-z]{1,4}".prop_map(|name| format!("{{{}}}", name)),
        ],
        0..8,
    )
    .prop_map(|parts| parts.concat())
}

fn profile() -> impl Strategy<Value = Profile> {
    (
        prop_oneof![Just(String::new()), "http://[a-z]{1,8}\\.test"],
        btree_map("X-[A-Z][a-z]{0,4}", vec("[a-z0-9]{1,4}", 1..3), 0..4),
        hash_map("[a-z]{1,4}", "[a-z0-9]{0,4}", 0..4),
        any::<bool>(),
    )
        .prop_map(|(base_url, headers, variables, allow_insecure)| Profile {
            base_url,
            headers,
            variables,
            allow_insecure,
            ..Profile::default()
        })
}

proptest! {
    #[test]
    fn prop_text_without_braces_is_unchanged(
        text in "[^{}]{0,64}",
        variables in variable_map(),
    ) {
        prop_assert_eq!(replace_variables(&text, &variables), text);
    }

    #[test]
    fn prop_substitution_is_idempotent(text in template(), variables in variable_map()) {
        let once = replace_variables(&text, &variables);
        let twice = replace_variables(&once, &variables);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_merge_is_associative(a in profile(), b in profile(), c in profile()) {
        let flat = merge_profiles(&[a.clone(), b.clone(), c.clone()]);
        let nested = merge_profiles(&[a, merge_profiles(&[b, c])]);

        prop_assert_eq!(&flat.headers, &nested.headers);
        prop_assert_eq!(&flat.base_url, &nested.base_url);
        prop_assert_eq!(&flat.variables, &nested.variables);
        prop_assert_eq!(flat.allow_insecure, nested.allow_insecure);
    }
}
