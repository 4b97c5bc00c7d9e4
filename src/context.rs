//! Feature extraction from the text surrounding an edit point.
//!
//! The window sizes are the caller's policy; [`DEFAULT_TOKENS_BEFORE`] and
//! [`DEFAULT_TOKENS_AFTER`] are the defaults the engine was tuned with.

use crate::ranker::Feature;

/// Default number of tokens taken before the caret.
pub const DEFAULT_TOKENS_BEFORE: usize = 3;

/// Default number of tokens taken after the caret.
pub const DEFAULT_TOKENS_AFTER: usize = 2;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Extract environment-token features from a window around the caret.
///
/// Splits the text on non-word characters (word characters are
/// alphanumerics and `_`), then takes up to `before` non-empty tokens
/// preceding the caret (nearest first) and up to `after` non-empty tokens
/// following it. A caret outside the text or inside a multi-byte character
/// is clamped to the nearest valid boundary.
///
/// # Examples
///
/// ```
/// use contextual_ranker::context::extract_features;
/// use contextual_ranker::ranker::Feature;
///
/// let text = "the bright galaxy near the orbit";
/// let caret = text.find("near").unwrap();
///
/// let features = extract_features(text, caret, 2, 1);
/// assert_eq!(
///     features,
///     vec![
///         Feature::token("galaxy"),
///         Feature::token("bright"),
///         Feature::token("near"),
///     ]
/// );
/// ```
pub fn extract_features(text: &str, caret: usize, before: usize, after: usize) -> Vec<Feature> {
    let mut caret = caret.min(text.len());
    while !text.is_char_boundary(caret) {
        caret -= 1;
    }
    let (front, behind) = text.split_at(caret);

    let front_tokens: Vec<&str> = front
        .split(|c: char| !is_word_char(c))
        .filter(|t| !t.is_empty())
        .collect();

    let mut features: Vec<Feature> = front_tokens
        .iter()
        .rev()
        .take(before)
        .map(|t| Feature::token(*t))
        .collect();

    features.extend(
        behind
            .split(|c: char| !is_word_char(c))
            .filter(|t| !t.is_empty())
            .take(after)
            .map(Feature::token),
    );

    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_around_caret() {
        let text = "alpha beta gamma delta";
        let caret = text.find("gamma").unwrap();
        let features = extract_features(text, caret, 1, 1);
        assert_eq!(
            features,
            vec![Feature::token("beta"), Feature::token("gamma")]
        );
    }

    #[test]
    fn test_nearest_tokens_come_first() {
        let text = "one two three ";
        let features = extract_features(text, text.len(), 3, 0);
        assert_eq!(
            features,
            vec![
                Feature::token("three"),
                Feature::token("two"),
                Feature::token("one"),
            ]
        );
    }

    #[test]
    fn test_window_smaller_than_requested() {
        let text = "lonely";
        let features = extract_features(text, text.len(), 5, 5);
        assert_eq!(features, vec![Feature::token("lonely")]);
    }

    #[test]
    fn test_separators_are_skipped() {
        let text = "a.b(c, d);e";
        let caret = text.find(';').unwrap();
        let features = extract_features(text, caret, 2, 1);
        assert_eq!(
            features,
            vec![
                Feature::token("d"),
                Feature::token("c"),
                Feature::token("e"),
            ]
        );
    }

    #[test]
    fn test_caret_out_of_range_clamps() {
        let text = "alpha beta";
        let features = extract_features(text, 1_000, 1, 1);
        assert_eq!(features, vec![Feature::token("beta")]);
    }

    #[test]
    fn test_caret_inside_multibyte_char_clamps() {
        let text = "héllo wörld";
        // Byte 2 is inside 'é'; must not panic.
        let features = extract_features(text, 2, 1, 1);
        assert_eq!(
            features,
            vec![Feature::token("h"), Feature::token("éllo")]
        );
    }

    #[test]
    fn test_empty_text() {
        assert!(extract_features("", 0, 3, 2).is_empty());
    }

    #[test]
    fn test_underscores_are_word_chars() {
        let text = "my_var other";
        let features = extract_features(text, text.len(), 2, 0);
        assert_eq!(
            features,
            vec![Feature::token("other"), Feature::token("my_var")]
        );
    }
}
