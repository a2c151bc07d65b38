//! Yes/no recognition
//!
//! The first affirmative or negative word in the utterance decides.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

static AFFIRMATIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "yes",
        "y",
        "yeah",
        "yep",
        "yup",
        "ya",
        "sure",
        "ok",
        "okay",
        "correct",
        "right",
        "true",
        "affirmative",
        "absolutely",
        "definitely",
        "confirm",
        "confirmed",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "no",
        "n",
        "nope",
        "nah",
        "not",
        "negative",
        "incorrect",
        "wrong",
        "false",
    ]
    .into_iter()
    .collect()
});

/// Interpret `text` as a yes/no answer
///
/// Returns `None` when the utterance contains neither.
pub fn recognize_boolean(text: &str) -> Option<bool> {
    let lowered = text.to_lowercase();
    for word in lowered.unicode_words() {
        if NEGATIVE.contains(word) {
            return Some(false);
        }
        if AFFIRMATIVE.contains(word) {
            return Some(true);
        }
    }
    None
}
