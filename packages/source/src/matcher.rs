//! Name-verification gate for search candidates.
//!
//! MusicBrainz full-text search happily returns "Billie Holiday" for the
//! query "Keli Holiday" with a high score. The gate is strict for
//! single-word queries (exact equality only) and lenient for multi-word
//! queries, where word order and articles move around ("The Beatles" vs.
//! "Beatles, The").

/// Fraction of query words allowed to be absent from the candidate name.
const MAX_MISSING_WORD_RATIO: f64 = 0.4;

/// Case-insensitive, whitespace-trimmed equality.
#[must_use]
pub fn is_exact_match(query: &str, candidate: &str) -> bool {
    query.trim().to_lowercase() == candidate.trim().to_lowercase()
}

/// Decides whether a search candidate's name plausibly matches the query.
///
/// Single-word queries require an exact match. Multi-word queries are
/// tokenized on whitespace; a token counts as present when it (or the
/// token minus its last two characters, tolerating plural and possessive
/// variants) appears as a substring of the candidate. The candidate is
/// accepted when at most 40% of the tokens are missing.
#[must_use]
pub fn verify_artist_match(query: &str, candidate: &str) -> bool {
    let tokens: Vec<&str> = query.split_whitespace().collect();
    if tokens.len() <= 1 {
        return is_exact_match(query, candidate);
    }

    let haystack = candidate.to_lowercase();
    let missing = tokens
        .iter()
        .filter(|token| {
            let token = token.to_lowercase();
            let stem: String = {
                let chars = token.chars().count();
                token.chars().take(chars.saturating_sub(2)).collect()
            };
            !haystack.contains(&token) && !haystack.contains(&stem)
        })
        .count();

    #[allow(clippy::cast_precision_loss)]
    let ratio = missing as f64 / tokens.len() as f64;
    ratio <= MAX_MISSING_WORD_RATIO
}
