//! String helpers: case conversion, interpolation and masking.

use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"));

static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Split an identifier into lowercase words.
///
/// Word boundaries are separators (`_`, `-`, whitespace, `.`), a
/// lowercase-to-uppercase transition, and the last capital of an acronym
/// followed by a lowercase letter (`HTTPServer` -> `http`, `server`).
fn words(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                out.push(std::mem::take(&mut current));
            }
        }

        current.extend(c.to_lowercase());
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Uppercase the first character, leave the rest untouched.
#[must_use]
pub fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `user_id` / `user-id` / `UserId` -> `userId`
#[must_use]
pub fn to_camel_case(input: &str) -> String {
    words(input)
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.clone() } else { capitalize(w) })
        .collect()
}

/// `userId` -> `UserId`
#[must_use]
pub fn to_pascal_case(input: &str) -> String {
    words(input).iter().map(|w| capitalize(w)).collect()
}

/// `userId` -> `user_id`
#[must_use]
pub fn to_snake_case(input: &str) -> String {
    words(input).join("_")
}

/// `USER_NOT_FOUND` -> `user-not-found`
#[must_use]
pub fn to_kebab_case(input: &str) -> String {
    words(input).join("-")
}

/// Lowercase URL-safe slug; runs of non-alphanumerics collapse into `-`.
#[must_use]
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    NON_SLUG.replace_all(&lowered, "-").trim_matches('-').to_string()
}

/// Truncate to at most `max` characters, ending with `...` when cut.
#[must_use]
pub fn truncate(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    if max <= 3 {
        return input.chars().take(max).collect();
    }
    let kept: String = input.chars().take(max - 3).collect();
    format!("{kept}...")
}

/// Mask a secret, keeping at most `visible` trailing characters.
///
/// Secrets shorter than twice `visible` are masked entirely so short
/// values never leak most of their content.
#[must_use]
pub fn mask(secret: &str, visible: usize) -> String {
    let len = secret.chars().count();
    if len == 0 {
        return String::new();
    }
    if len < visible * 2 {
        return "*".repeat(len);
    }
    let tail: String = secret.chars().skip(len - visible).collect();
    format!("{}{}", "*".repeat(len - visible), tail)
}

/// Substitute `{key}` placeholders from `params`.
///
/// Only the first occurrence of each placeholder is replaced; placeholders
/// with no matching parameter are left verbatim. Substituted values are not
/// rescanned.
///
/// ```
/// use std::collections::HashMap;
/// use utils::interpolate;
///
/// let params = HashMap::from([("userId".to_string(), "u-1".to_string())]);
/// assert_eq!(interpolate("does not exist: {userId}", &params), "does not exist: u-1");
/// ```
#[must_use]
pub fn interpolate(template: &str, params: &HashMap<String, String>) -> String {
    let mut used = HashSet::new();
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let key = &caps[1];
            match params.get(key) {
                Some(value) if used.insert(key.to_string()) => value.clone(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Placeholder names present in a template, in order of appearance.
#[must_use]
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_camel_case("user_id"), "userId");
        assert_eq!(to_camel_case("User-Id"), "userId");
        assert_eq!(to_pascal_case("user_id"), "UserId");
        assert_eq!(to_snake_case("userId"), "user_id");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_kebab_case("USER_NOT_FOUND"), "user-not-found");
        assert_eq!(to_kebab_case("NotFound"), "not-found");
    }

    #[test]
    fn test_case_conversion_empty() {
        assert_eq!(to_camel_case(""), "");
        assert_eq!(to_snake_case("__"), "");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("hello"), "Hello");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer sentence", 8), "a lon...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("supersecretvalue", 4), "************alue");
        assert_eq!(mask("abc", 4), "***");
        assert_eq!(mask("", 4), "");
    }

    #[test]
    fn test_interpolate_replaces_known_params() {
        let params = HashMap::from([("userId".to_string(), "u-1".to_string())]);
        assert_eq!(
            interpolate("does not exist: {userId}", &params),
            "does not exist: u-1"
        );
    }

    #[test]
    fn test_interpolate_does_not_expand_substituted_values() {
        let params = HashMap::from([
            ("name".to_string(), "{id}".to_string()),
            ("id".to_string(), "42".to_string()),
        ]);
        for _ in 0..50 {
            assert_eq!(interpolate("user {name}", &params), "user {id}");
        }
    }

    #[test]
    fn test_interpolate_leaves_unmatched_placeholders() {
        let params = HashMap::from([("userId".to_string(), "u-1".to_string())]);
        assert_eq!(
            interpolate("{userId} missing in {tenant}", &params),
            "u-1 missing in {tenant}"
        );
    }

    #[test]
    fn test_interpolate_first_occurrence_only() {
        let params = HashMap::from([("id".to_string(), "7".to_string())]);
        assert_eq!(interpolate("{id} and {id}", &params), "7 and {id}");
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders("{a} then {b_2} and {a}"), vec!["a", "b_2", "a"]);
        assert!(placeholders("no params").is_empty());
    }
}
