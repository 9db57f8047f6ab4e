//! Fuzzy contact name matching using strsim.
//!
//! Used as the last lookup tier, after exact and substring matches found
//! nothing. Misspelled or reordered names still resolve.
//!
//! CHANGELOG:
//! - 02/02/2026 - Initial implementation

use strsim::{jaro_winkler, levenshtein, sorensen_dice};

/// Default threshold for fuzzy matching (0.0 - 1.0).
pub const DEFAULT_THRESHOLD: f64 = 0.85;

/// Best score over all strategies, and which strategy produced it.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatch {
    pub score: f64,
    pub strategy: &'static str,
}

/// Score a query against a contact name.
///
/// Strategies:
/// - jaro_winkler: typos near the end of a name
/// - sorensen_dice: bigram overlap
/// - levenshtein ratio: edit distance over the longer string
/// - token sort: "Doe Jane" against "Jane Doe"
pub fn multi_match(query: &str, name: &str) -> FuzzyMatch {
    let query = query.trim().to_lowercase();
    let name = name.trim().to_lowercase();

    let candidates = [
        ("jaro_winkler", jaro_winkler(&query, &name)),
        ("sorensen_dice", sorensen_dice(&query, &name)),
        ("levenshtein", levenshtein_ratio(&query, &name)),
        ("token_sort", token_sort_ratio(&query, &name)),
    ];

    candidates
        .into_iter()
        .fold(FuzzyMatch { score: 0.0, strategy: "none" }, |best, (strategy, score)| {
            if score > best.score {
                FuzzyMatch { score, strategy }
            } else {
                best
            }
        })
}

fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein(a, b) as f64 / max_len as f64)
}

fn token_sort_ratio(a: &str, b: &str) -> f64 {
    fn sorted(s: &str) -> String {
        let mut tokens: Vec<&str> = s.split_whitespace().collect();
        tokens.sort_unstable();
        tokens.join(" ")
    }
    jaro_winkler(&sorted(a), &sorted(b))
}

/// Check if a match reaches the threshold.
pub fn is_match(query: &str, name: &str, threshold: f64) -> bool {
    multi_match(query, name).score >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(multi_match("Jane Doe", "Jane Doe").score > 0.99);
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert!(multi_match("  jane doe ", "Jane Doe").score > 0.99);
    }

    #[test]
    fn test_word_order() {
        let result = multi_match("Doe Jane", "Jane Doe");
        assert!(result.score > 0.99, "Score was {}", result.score);
        assert_eq!(result.strategy, "token_sort");
    }

    #[test]
    fn test_typo_matches() {
        assert!(is_match("Jane Deo", "Jane Doe", DEFAULT_THRESHOLD));
    }

    #[test]
    fn test_unrelated_names_do_not_match() {
        assert!(!is_match("ACME Bank", "Jane Doe", DEFAULT_THRESHOLD));
    }
}
