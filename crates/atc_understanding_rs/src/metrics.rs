//! String similarity metrics used by the fuzzy matching layers.
//!
//! Jaro-Winkler comes from `strsim`, Double Metaphone from `rphonetic`.
//! Everything here is case-insensitive.

use rphonetic::DoubleMetaphone;
use std::sync::LazyLock;

use crate::lexicon::Lexicon;

static METAPHONE: LazyLock<DoubleMetaphone> = LazyLock::new(DoubleMetaphone::default);

/// Jaro-Winkler similarity in [0, 1], case-insensitive.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(&a.to_lowercase(), &b.to_lowercase())
}

/// Primary and alternate Double Metaphone codes.
pub fn double_metaphone(word: &str) -> (String, String) {
    let result = METAPHONE.double_metaphone(&word.to_lowercase());
    (result.primary().to_string(), result.alternate().to_string())
}

/// Phonetic equality: the primary code of either word equals any code of the
/// other, and the pair is not on the lexicon's phonetic blocklist. The
/// blocklist is directional: `a` is the heard word, `b` the target keyword.
pub fn phonetic_match(lexicon: &Lexicon, a: &str, b: &str) -> bool {
    if lexicon.phonetic_blocklisted(a, b) {
        return false;
    }
    let (a_primary, a_alternate) = double_metaphone(a);
    let (b_primary, b_alternate) = double_metaphone(b);
    if a_primary.is_empty() || b_primary.is_empty() {
        return false;
    }
    a_primary == b_primary || a_primary == b_alternate || b_primary == a_alternate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaro_winkler_is_case_insensitive() {
        assert_eq!(jaro_winkler("American", "american"), 1.0);
        assert!(jaro_winkler("jetblue", "jetblu") > 0.9);
        assert!(jaro_winkler("delta", "united") < 0.6);
    }

    #[test]
    fn metaphone_codes_match_homophones() {
        let lexicon = Lexicon::global();
        assert!(phonetic_match(lexicon, "wright", "right"));
        assert!(phonetic_match(lexicon, "dissend", "descend"));
        assert!(!phonetic_match(lexicon, "speed", "heading"));
    }

    #[test]
    fn blocklist_suppresses_false_positives() {
        let lexicon = Lexicon::global();
        // "flight" and "right" collide phonetically but must never match.
        assert!(!phonetic_match(lexicon, "flight", "right"));
        assert!(!phonetic_match(lexicon, "continue", "maintain"));
    }
}
