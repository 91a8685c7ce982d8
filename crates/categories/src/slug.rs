/// Derive the URL slug of a display name.
///
/// Lowercases the name, turns every run of characters outside ASCII `[a-z0-9]`
/// into a single hyphen and strips hyphens from both ends. The result may be
/// empty (e.g. a name made only of punctuation); callers decide whether that is
/// acceptable.
pub fn derive_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators_and_trims() {
        assert_eq!(derive_slug("Men's Shoes & Boots"), "men-s-shoes-boots");
        assert_eq!(derive_slug("  --Home__Garden--  "), "home-garden");
        assert_eq!(derive_slug("TV 4K"), "tv-4k");
    }

    #[test]
    fn non_ascii_letters_are_separators() {
        assert_eq!(derive_slug("Café Crème"), "caf-cr-me");
        assert_eq!(derive_slug("日本"), "");
    }

    #[test]
    fn punctuation_only_yields_empty() {
        assert_eq!(derive_slug("!!!"), "");
        assert_eq!(derive_slug(""), "");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

            #[test]
            fn slug_is_lowercase_alnum_and_single_hyphens(name in any::<String>()) {
                let slug = derive_slug(&name);

                prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
                prop_assert!(!slug.starts_with('-'));
                prop_assert!(!slug.ends_with('-'));
                prop_assert!(!slug.contains("--"));
            }

            #[test]
            fn slug_is_idempotent(name in "[ -~]{0,64}") {
                let once = derive_slug(&name);
                prop_assert_eq!(derive_slug(&once), once);
            }
        }
    }
}
