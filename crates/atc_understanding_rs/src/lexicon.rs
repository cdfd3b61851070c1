//! Static vocabulary tables driving normalization and matching.
//!
//! Everything the rewrite rules need to know about ATC speech lives here as
//! data: digit and number word forms, the NATO alphabet, command keyword
//! canonicalization, filler words, merged-word split tables and the
//! blocklists that encode observed false positives. The table contents are
//! the behavior; the algorithms in `normalizer`/`callsign`/`command` only
//! consult them.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Words the controller uses for single digits, including ATC variants
/// ("niner", "tree") and STT homophones ("won", "ate").
const DIGIT_WORDS: &[(&str, &str)] = &[
    ("zero", "0"),
    ("zeri", "0"),
    ("oh", "0"),
    ("one", "1"),
    ("won", "1"),
    ("two", "2"),
    ("too", "2"),
    ("three", "3"),
    ("tree", "3"),
    ("four", "4"),
    ("fower", "4"),
    ("five", "5"),
    ("fife", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("ate", "8"),
    ("nine", "9"),
    ("niner", "9"),
];

/// Multi-digit number words. "hundred" is deliberately absent: the
/// tokenizer needs it verbatim to recognize altitude phrases.
const NUMBER_WORDS: &[(&str, &str)] = &[
    ("ten", "10"),
    ("eleven", "11"),
    ("twelve", "12"),
    ("thirteen", "13"),
    ("fourteen", "14"),
    ("fifteen", "15"),
    ("sixteen", "16"),
    ("seventeen", "17"),
    ("eighteen", "18"),
    ("nineteen", "19"),
    ("twenty", "20"),
    ("thirty", "30"),
    ("forty", "40"),
    ("fifty", "50"),
    ("sixty", "60"),
    ("seventy", "70"),
    ("eighty", "80"),
    ("ninety", "90"),
    // STT garbles seen in recordings
    ("toser", "20"),
    ("twenzo", "210"),
];

const NATO_ALPHABET: &[(&str, char)] = &[
    ("alpha", 'a'),
    ("alfa", 'a'),
    ("bravo", 'b'),
    ("charlie", 'c'),
    ("delta", 'd'),
    ("echo", 'e'),
    ("foxtrot", 'f'),
    ("golf", 'g'),
    ("hotel", 'h'),
    ("india", 'i'),
    ("juliet", 'j'),
    ("juliett", 'j'),
    ("kilo", 'k'),
    ("lima", 'l'),
    ("mike", 'm'),
    ("november", 'n'),
    ("oscar", 'o'),
    ("papa", 'p'),
    ("quebec", 'q'),
    ("romeo", 'r'),
    ("sierra", 's'),
    ("tango", 't'),
    ("uniform", 'u'),
    ("victor", 'v'),
    ("whiskey", 'w'),
    ("whisky", 'w'),
    ("xray", 'x'),
    ("yankee", 'y'),
    ("zulu", 'z'),
];

/// Variant or inflected form to canonical command keyword. Canonical forms
/// map to themselves so membership and canonicalization share one table.
const COMMAND_KEYWORDS: &[(&str, &str)] = &[
    ("turn", "turn"),
    ("turns", "turn"),
    ("turning", "turn"),
    ("climb", "climb"),
    ("climbing", "climb"),
    ("climin", "climb"),
    ("climbed", "climb"),
    ("descend", "descend"),
    ("descending", "descend"),
    ("descends", "descend"),
    ("descent", "descend"),
    ("maintain", "maintain"),
    ("maintaining", "maintain"),
    ("cleared", "cleared"),
    ("clear", "cleared"),
    ("claired", "cleared"),
    ("direct", "direct"),
    ("directed", "direct"),
    ("contact", "contact"),
    ("contacting", "contact"),
    ("expect", "expect"),
    ("expects", "expect"),
    ("expecting", "expect"),
    ("fly", "fly"),
    ("heading", "heading"),
    ("headings", "heading"),
    ("reduce", "reduce"),
    ("reducing", "reduce"),
    ("slow", "reduce"),
    ("increase", "increase"),
    ("increasing", "increase"),
    ("speed", "speed"),
    ("squawk", "squawk"),
    ("squawking", "squawk"),
    ("squak", "squawk"),
    ("ident", "ident"),
    ("intercept", "intercept"),
    ("intercepting", "intercept"),
    ("localizer", "localizer"),
    ("localize", "localizer"),
    ("localizers", "localizer"),
    ("tower", "tower"),
    ("tarot", "tower"),
    ("ground", "ground"),
    ("approach", "approach"),
    ("approaches", "approach"),
    ("departure", "departure"),
    ("arrival", "arrival"),
    ("center", "center"),
    ("centre", "center"),
    ("runway", "runway"),
    ("runways", "runway"),
    ("visual", "visual"),
    ("ils", "ils"),
    ("rnav", "rnav"),
    ("hold", "hold"),
    ("holding", "hold"),
    ("traffic", "traffic"),
    ("information", "information"),
    ("frequency", "frequency"),
    ("change", "change"),
    ("via", "via"),
    ("knots", "knots"),
    ("knot", "knots"),
    ("until", "until"),
    ("final", "final"),
    ("mile", "mile"),
    ("miles", "mile"),
    ("degrees", "degrees"),
    ("degree", "degrees"),
    ("left", "left"),
    ("right", "right"),
    ("proceed", "proceed"),
    ("proceeding", "proceed"),
    ("cancel", "cancel"),
    ("cancelled", "cancel"),
    ("go", "go"),
    ("around", "around"),
    ("present", "present"),
    ("resume", "resume"),
    ("radar", "radar"),
    ("vfr", "vfr"),
    ("flight", "flight"),
    ("level", "level"),
    ("then", "then"),
    ("colonel", "kernel"),
    ("kernel", "kernel"),
];

/// Single token expanded into several.
const PHRASE_EXPANSIONS: &[(&str, &[&str])] = &[
    ("flighting", &["fly", "heading"]),
    ("fl", &["flight", "level"]),
    ("goaround", &["go", "around"]),
    ("radarcontact", &["radar", "contact"]),
];

/// N-gram to replacement n-gram, applied longest first on the raw word
/// stream and again after normalization.
const MULTI_TOKEN_REPLACEMENTS: &[(&[&str], &[&str])] = &[
    (&["i", "l", "s"], &["ils"]),
    (&["x", "ray"], &["xray"]),
    (&["fly", "level"], &["flight", "level"]),
    (&["flight", "lever"], &["flight", "level"]),
    (&["time", "riding"], &["turn", "right"]),
    (&["turn", "lift"], &["turn", "left"]),
];

/// Words carrying no command meaning. "heavy"/"super" are fillers for the
/// command engine's slack but must survive normalization: the callsign
/// matcher consumes them as weight-class suffixes.
const FILLER_WORDS: &[&str] = &[
    "and", "or", "the", "a", "an", "uh", "um", "ah", "er", "please", "heavy", "super", "to",
    "of", "off", "at", "is", "you", "sir", "good", "day", "morning", "okay", "ok", "alright",
    "now", "just",
];

const WEIGHT_CLASS_WORDS: &[&str] = &["heavy", "super"];

/// Command-initiating keywords the slack window must never search across.
const COMMAND_BOUNDARY_KEYWORDS: &[&str] = &[
    "turn", "climb", "descend", "maintain", "cleared", "contact", "expect", "fly", "reduce",
    "increase", "squawk", "direct", "intercept", "hold", "proceed", "cancel", "go", "resume",
];

/// The only keywords eligible for phonetic fallback when exact lookup fails.
const PHONETIC_COMMAND_KEYWORDS: &[&str] = &[
    "descend",
    "climb",
    "maintain",
    "cleared",
    "contact",
    "direct",
    "heading",
    "tower",
    "approach",
    "squawk",
    "turn",
    "expect",
    "reduce",
    "localizer",
    "intercept",
    "ident",
];

/// Observed false positives: heard word to keywords it must never match,
/// fuzzily or phonetically.
const MATCH_BLOCKLIST: &[(&str, &[&str])] = &[
    ("continue", &["maintain"]),
    ("flight", &["right"]),
    ("light", &["right"]),
    ("affirm", &["turn"]),
];

const MERGED_COMMAND_PREFIXES: &[&str] = &["turn", "climb", "descend", "cleared", "expect", "fly"];

const CANONICAL_SUFFIXES: &[&str] = &["left", "right", "maintain", "direct", "ils", "heading"];

/// Suffix fragments STT reliably produces for known command words.
const GARBLED_SUFFIXES: &[(&str, &str)] = &[
    ("dered", "direct"),
    ("derek", "direct"),
    ("rect", "direct"),
    ("rected", "direct"),
    ("wright", "right"),
    ("riding", "right"),
    ("ridin", "right"),
    ("rite", "right"),
    ("eft", "left"),
    ("lefted", "left"),
    ("aining", "maintain"),
    ("taining", "maintain"),
    ("tained", "maintain"),
    ("ading", "heading"),
    ("eading", "heading"),
    ("adding", "heading"),
    ("edding", "heading"),
    ("ls", "ils"),
    ("ills", "ils"),
    ("els", "ils"),
];

/// Which canonical suffixes each merged prefix may pair with. Prefixes not
/// listed accept any canonical suffix.
const PREFIX_SUFFIX_COMPATIBILITY: &[(&str, &[&str])] = &[
    ("cleared", &["direct", "ils"]),
    ("expect", &["heading", "ils"]),
    ("turn", &["left", "right", "heading"]),
    ("fly", &["heading"]),
    ("climb", &["maintain"]),
    ("descend", &["maintain"]),
];

/// Leading fragments of "localizer" garbles ("zap the lokalizer", ...).
const LOCALIZER_PREFIXES: &[&str] = &["zap", "sap", "loc", "lok", "lawk", "lach", "slok"];

/// Airbus type numbers a controller may speak right before an altitude
/// ("A320, four thousand"), which suppresses tens+units combining.
const AIRBUS_TYPE_NUMBERS: &[u32] = &[319, 320, 321, 330, 340, 350, 380];

pub struct Lexicon {
    digit_words: HashMap<&'static str, &'static str>,
    number_words: HashMap<&'static str, &'static str>,
    nato: HashMap<&'static str, char>,
    keywords: HashMap<&'static str, &'static str>,
    expansions: HashMap<&'static str, &'static [&'static str]>,
    multi_token: Vec<(&'static [&'static str], &'static [&'static str])>,
    fillers: HashSet<&'static str>,
    boundaries: HashSet<&'static str>,
    garbled_suffixes: HashMap<&'static str, &'static str>,
    compatibility: HashMap<&'static str, &'static [&'static str]>,
    blocklist: HashMap<&'static str, Vec<&'static str>>,
}

static LEXICON: LazyLock<Lexicon> = LazyLock::new(Lexicon::new);

impl Lexicon {
    /// Process-wide instance, built once on first use.
    pub fn global() -> &'static Lexicon {
        &LEXICON
    }

    pub fn new() -> Self {
        let mut blocklist: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        for &(word, targets) in MATCH_BLOCKLIST {
            blocklist.entry(word).or_default().extend_from_slice(targets);
        }
        // NATO letter words are callsign material, never command words.
        for &(word, _) in NATO_ALPHABET {
            blocklist
                .entry(word)
                .or_default()
                .extend_from_slice(PHONETIC_COMMAND_KEYWORDS);
        }

        let mut multi_token: Vec<_> = MULTI_TOKEN_REPLACEMENTS.to_vec();
        multi_token.sort_by_key(|(pattern, _)| std::cmp::Reverse(pattern.len()));

        Self {
            digit_words: DIGIT_WORDS.iter().copied().collect(),
            number_words: NUMBER_WORDS.iter().copied().collect(),
            nato: NATO_ALPHABET.iter().copied().collect(),
            keywords: COMMAND_KEYWORDS.iter().copied().collect(),
            expansions: PHRASE_EXPANSIONS.iter().copied().collect(),
            multi_token,
            fillers: FILLER_WORDS.iter().copied().collect(),
            boundaries: COMMAND_BOUNDARY_KEYWORDS.iter().copied().collect(),
            garbled_suffixes: GARBLED_SUFFIXES.iter().copied().collect(),
            compatibility: PREFIX_SUFFIX_COMPATIBILITY.iter().copied().collect(),
            blocklist,
        }
    }

    pub fn digit(&self, word: &str) -> Option<&'static str> {
        self.digit_words.get(word).copied()
    }

    pub fn number(&self, word: &str) -> Option<&'static str> {
        self.number_words.get(word).copied()
    }

    pub fn nato_letter(&self, word: &str) -> Option<char> {
        self.nato.get(word).copied()
    }

    pub fn is_nato(&self, word: &str) -> bool {
        self.nato.contains_key(word)
    }

    pub fn nato_words(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.nato.keys().copied()
    }

    pub fn canonical_keyword(&self, word: &str) -> Option<&'static str> {
        self.keywords.get(word).copied()
    }

    pub fn is_command_keyword(&self, word: &str) -> bool {
        self.keywords.contains_key(word)
    }

    pub fn expansion(&self, word: &str) -> Option<&'static [&'static str]> {
        self.expansions.get(word).copied()
    }

    /// Longest multi-token replacement whose pattern is a prefix of `words`.
    pub fn multi_token_at<S: AsRef<str>>(
        &self,
        words: &[S],
    ) -> Option<(usize, &'static [&'static str])> {
        self.multi_token
            .iter()
            .find(|(pattern, _)| {
                pattern.len() <= words.len()
                    && pattern.iter().zip(words).all(|(p, w)| *p == w.as_ref())
            })
            .map(|(pattern, replacement)| (pattern.len(), *replacement))
    }

    pub fn is_filler(&self, word: &str) -> bool {
        self.fillers.contains(word)
    }

    /// Fillers the normalizer deletes outright; weight-class words survive
    /// for the callsign matcher.
    pub fn is_droppable_filler(&self, word: &str) -> bool {
        self.fillers.contains(word) && !Self::is_weight_class(word)
    }

    pub fn is_weight_class(word: &str) -> bool {
        WEIGHT_CLASS_WORDS.contains(&word)
    }

    pub fn is_boundary_keyword(&self, word: &str) -> bool {
        self.boundaries.contains(word)
    }

    pub fn phonetic_keywords(&self) -> &'static [&'static str] {
        PHONETIC_COMMAND_KEYWORDS
    }

    pub fn phonetic_blocklisted(&self, word: &str, target: &str) -> bool {
        self.blocklist
            .get(word)
            .is_some_and(|targets| targets.contains(&target))
    }

    pub fn merged_prefixes(&self) -> &'static [&'static str] {
        MERGED_COMMAND_PREFIXES
    }

    pub fn canonical_suffixes(&self) -> &'static [&'static str] {
        CANONICAL_SUFFIXES
    }

    pub fn garbled_suffix(&self, suffix: &str) -> Option<&'static str> {
        self.garbled_suffixes.get(suffix).copied()
    }

    pub fn prefix_accepts_suffix(&self, prefix: &str, suffix: &str) -> bool {
        match self.compatibility.get(prefix) {
            Some(allowed) => allowed.contains(&suffix),
            None => true,
        }
    }

    pub fn is_localizer_garble(&self, word: &str) -> bool {
        (word.contains("lok") || word.contains("lawk"))
            && LOCALIZER_PREFIXES.iter().any(|p| word.starts_with(p))
    }

    pub fn is_airbus_type_number(&self, n: u32) -> bool {
        AIRBUS_TYPE_NUMBERS.contains(&n)
    }

    /// A token that is, or normalizes to, a digit string.
    pub fn is_digit_like(&self, word: &str) -> bool {
        (!word.is_empty() && word.chars().all(|c| c.is_ascii_digit()))
            || self.digit_words.contains_key(word)
            || self.number_words.contains_key(word)
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fillers_never_shadow_command_keywords() {
        let lexicon = Lexicon::new();
        for word in FILLER_WORDS {
            assert!(
                !lexicon.is_command_keyword(word),
                "filler {word:?} is also a command keyword"
            );
        }
    }

    #[test]
    fn boundary_keywords_are_command_keywords() {
        let lexicon = Lexicon::new();
        for word in COMMAND_BOUNDARY_KEYWORDS {
            assert!(lexicon.is_command_keyword(word), "{word:?} not a keyword");
        }
    }

    #[test]
    fn hundred_is_deliberately_unmapped() {
        let lexicon = Lexicon::new();
        assert_eq!(lexicon.number("hundred"), None);
        assert_eq!(lexicon.number("ninety"), Some("90"));
        assert_eq!(lexicon.number("twenzo"), Some("210"));
    }

    #[test]
    fn nato_words_are_blocked_from_command_matches() {
        let lexicon = Lexicon::new();
        assert!(lexicon.phonetic_blocklisted("delta", "direct"));
        assert!(lexicon.phonetic_blocklisted("tango", "turn"));
        assert!(!lexicon.phonetic_blocklisted("dissend", "descend"));
    }

    #[test]
    fn longest_multi_token_replacement_wins() {
        let lexicon = Lexicon::new();
        let (len, replacement) = lexicon.multi_token_at(&["i", "l", "s"]).unwrap();
        assert_eq!(len, 3);
        assert_eq!(replacement, &["ils"]);
        assert!(lexicon.multi_token_at(&["i", "l"]).is_none());
    }
}
