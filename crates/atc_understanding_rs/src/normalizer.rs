//! Transcript normalizer
//!
//! Repairs speech-to-text artifacts into a clean word stream the tokenizer
//! can type: digit words become digits, keyword variants collapse to their
//! canonical form, merged words ("turnwright", "cleardered") are split, and
//! context rules fix the usual "or"/"and" mis-hearings. NATO alphabet words
//! are NOT converted here; "delta" may be an airline and only the callsign
//! matchers know whether a token sits in a callsign region.

use regex::Regex;
use std::sync::LazyLock;

use crate::lexicon::Lexicon;
use crate::metrics::{jaro_winkler, phonetic_match};

static LETTER_DIGIT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]{2,})(\d+)$").unwrap());
static RUNWAY_DESIGNATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})([lrc])$").unwrap());

/// Normalize a raw transcript with the process-wide lexicon.
pub fn normalize(transcript: &str) -> Vec<String> {
    normalize_with(Lexicon::global(), transcript)
}

pub fn normalize_with(lexicon: &Lexicon, transcript: &str) -> Vec<String> {
    let (raw_words, mut words) = prepare(transcript);
    let mut out: Vec<String> = Vec::with_capacity(words.len());

    let mut i = 0;
    while i < words.len() {
        let word = words[i].clone();
        if word.is_empty() {
            i += 1;
            continue;
        }

        // Multi-token replacements run on the raw stream, before any
        // per-word rewriting.
        if let Some((len, replacement)) = lexicon.multi_token_at(&words[i..]) {
            out.extend(replacement.iter().map(|w| (*w).to_string()));
            i += len;
            continue;
        }

        if word == "or" && handle_or(lexicon, &mut words, i, &out) {
            i += 1;
            continue;
        }
        if word == "and"
            && let Some(emit_one) = handle_and(lexicon, &words, i, &out)
        {
            if emit_one {
                out.push("1".to_string());
            }
            i += 1;
            continue;
        }

        // "alaska8383" style letter/digit merges split into two tokens.
        if let Some(caps) = LETTER_DIGIT_SPLIT.captures(&word) {
            let split = caps[1].len();
            let raw = raw_words[i].as_str();
            process_word(lexicon, &caps[1], &raw[..split.min(raw.len())], &mut out);
            process_word(lexicon, &caps[2], "", &mut out);
            i += 1;
            continue;
        }

        process_word(lexicon, &word, &raw_words[i], &mut out);
        i += 1;
    }

    post_process(lexicon, out)
}

/// Lowercased, punctuation-free words plus the raw-cased parallel stream
/// (needed to preserve STT-capitalized fix names).
fn prepare(transcript: &str) -> (Vec<String>, Vec<String>) {
    let mut raw = String::with_capacity(transcript.len());
    let mut clean = String::with_capacity(transcript.len());
    for c in transcript.chars() {
        if c == '\'' {
            continue;
        }
        if c.is_ascii_alphanumeric() {
            raw.push(c);
            clean.push(c.to_ascii_lowercase());
        } else {
            raw.push(' ');
            clean.push(' ');
        }
    }
    let raw_words = raw.split_whitespace().map(str::to_string).collect();
    let clean_words = clean.split_whitespace().map(str::to_string).collect();
    (raw_words, clean_words)
}

/// Context-sensitive "or": usually a mis-transcribed "niner" between digits
/// or noise between "turn" and a direction. Returns true when the token is
/// consumed.
fn handle_or(lexicon: &Lexicon, words: &mut [String], i: usize, out: &[String]) -> bool {
    let next = words.get(i + 1).map(|s| s.as_str()).unwrap_or("");
    if out.last().is_some_and(|p| p == "turn") && matches!(next, "left" | "right") {
        return true;
    }
    let prev_is_digit = out.last().is_some_and(|p| is_digit_string(p));
    if !prev_is_digit {
        return false;
    }
    if next == "1000" {
        words[i + 1] = "thousand".to_string();
        return true;
    }
    lexicon.is_digit_like(next)
}

/// Context-sensitive "and" between digits: dropped inside a long digit run,
/// read as "one" between exactly two digits. `Some(true)` emits "1",
/// `Some(false)` drops the token, `None` leaves it for the filler pass.
fn handle_and(lexicon: &Lexicon, words: &[String], i: usize, out: &[String]) -> Option<bool> {
    let prev_is_digit = out.last().is_some_and(|p| is_digit_string(p));
    let next_is_digit = words
        .get(i + 1)
        .is_some_and(|n| lexicon.is_digit_like(n));
    if !prev_is_digit || !next_is_digit {
        return None;
    }
    let before = out.iter().rev().take_while(|w| is_digit_string(w)).count();
    let after = words[i + 1..]
        .iter()
        .take_while(|w| lexicon.is_digit_like(w))
        .count();
    Some(before + after < 3)
}

/// The per-word rewrite chain; first rule that fires wins.
fn process_word(lexicon: &Lexicon, word: &str, raw: &str, out: &mut Vec<String>) {
    if let Some(digit) = lexicon.digit(word) {
        out.push(digit.to_string());
        return;
    }
    if let Some(number) = lexicon.number(word) {
        out.push(number.to_string());
        return;
    }
    if let Some(keyword) = lexicon.canonical_keyword(word) {
        out.push(keyword.to_string());
        return;
    }
    if let Some(expansion) = lexicon.expansion(word) {
        out.extend(expansion.iter().map(|w| (*w).to_string()));
        return;
    }
    if let Some((a, b)) = merged_nato_split(lexicon, word) {
        out.push(a);
        out.push(b);
        return;
    }
    if let Some((prefix, suffix)) = merged_command_split(lexicon, word) {
        out.push(prefix);
        out.push(suffix);
        return;
    }
    if let Some(keyword) = phonetic_command(lexicon, word) {
        out.push(keyword.to_string());
        return;
    }
    if lexicon.is_localizer_garble(word) {
        out.push("intercept".to_string());
        out.push("localizer".to_string());
        return;
    }
    // STT emits recognized fix/waypoint identifiers in caps; keep them.
    if raw.len() >= 2 && raw.chars().all(|c| c.is_ascii_uppercase()) {
        out.push(raw.to_string());
        return;
    }
    out.push(word.to_string());
}

/// Two NATO words merged into one STT token ("alphabravo").
fn merged_nato_split(lexicon: &Lexicon, word: &str) -> Option<(String, String)> {
    if word.len() < 8
        || lexicon.is_nato(word)
        || !word.chars().all(|c| c.is_ascii_alphabetic())
    {
        return None;
    }
    let mut best: Option<(f64, &str, &str)> = None;
    let mut prefixes: Vec<&str> = lexicon.nato_words().collect();
    prefixes.sort_unstable();
    for prefix in &prefixes {
        for split in prefix.len().saturating_sub(1)..=prefix.len() + 1 {
            if split < 1 || split >= word.len() {
                continue;
            }
            let (pre, suf) = word.split_at(split);
            let pre_score = jaro_winkler(pre, prefix);
            if pre_score < 0.85 {
                continue;
            }
            for suffix in &prefixes {
                let suf_score = jaro_winkler(suf, suffix);
                if suf_score < 0.80 {
                    continue;
                }
                let combined = pre_score + suf_score;
                let better = match &best {
                    None => true,
                    Some((score, p, s)) => {
                        combined > *score
                            || (combined == *score && (*prefix, *suffix) < (*p, *s))
                    }
                };
                if better {
                    best = Some((combined, prefix, suffix));
                }
            }
        }
    }
    best.map(|(_, a, b)| (a.to_string(), b.to_string()))
}

/// A command keyword merged with its argument word ("turnwright",
/// "cleardered"). Candidate splits are ranked by prefix score plus suffix
/// score with a length bonus; the garbled-suffix table outranks fuzzy
/// canonical-suffix matching.
fn merged_command_split(lexicon: &Lexicon, word: &str) -> Option<(String, String)> {
    if word.len() < 7
        || lexicon.is_command_keyword(word)
        || !word.chars().all(|c| c.is_ascii_alphabetic())
    {
        return None;
    }
    let mut best: Option<(f64, &str, &str)> = None;
    let mut consider = |score: f64, prefix: &'static str, suffix: &'static str| {
        let better = match &best {
            None => true,
            Some((s, p, q)) => score > *s || (score == *s && (prefix, suffix) < (*p, *q)),
        };
        if better {
            best = Some((score, prefix, suffix));
        }
    };
    for &prefix_kw in lexicon.merged_prefixes() {
        let lo = prefix_kw.len().saturating_sub(2).max(2);
        let hi = (prefix_kw.len() + 2).min(word.len().saturating_sub(2));
        for split in lo..=hi {
            let (pre, suf) = word.split_at(split);
            let pre_jw = jaro_winkler(pre, prefix_kw);
            let pre_phonetic = phonetic_match(lexicon, pre, prefix_kw);
            if pre_jw < 0.85 && !pre_phonetic {
                continue;
            }
            let pre_score = if pre_phonetic { pre_jw.max(0.85) } else { pre_jw };
            let len_bonus = split as f64 * 0.01;
            if let Some(canonical) = lexicon.garbled_suffix(suf) {
                if lexicon.prefix_accepts_suffix(prefix_kw, canonical) {
                    consider(pre_score + 1.0 + len_bonus, prefix_kw, canonical);
                }
            } else {
                for &canonical in lexicon.canonical_suffixes() {
                    if !lexicon.prefix_accepts_suffix(prefix_kw, canonical) {
                        continue;
                    }
                    let suf_jw = jaro_winkler(suf, canonical);
                    if phonetic_match(lexicon, suf, canonical) {
                        consider(
                            pre_score + 0.9 + suf_jw * 0.1 + len_bonus,
                            prefix_kw,
                            canonical,
                        );
                    } else if suf_jw >= 0.85 {
                        consider(pre_score + suf_jw + len_bonus, prefix_kw, canonical);
                    }
                }
            }
        }
    }
    best.map(|(_, p, s)| (p.to_string(), s.to_string()))
}

fn phonetic_command(lexicon: &Lexicon, word: &str) -> Option<&'static str> {
    if word.len() < 3 {
        return None;
    }
    lexicon
        .phonetic_keywords()
        .iter()
        .copied()
        .find(|keyword| phonetic_match(lexicon, word, keyword))
}

fn post_process(lexicon: &Lexicon, words: Vec<String>) -> Vec<String> {
    let words = combine_tens_units(lexicon, words);
    let words = apply_multi_token(lexicon, words);
    let words = rewrite_turn_to(words);
    let words = split_runway_designators(words);
    let words = insert_turn_before_degrees(words);
    words
        .into_iter()
        .filter(|w| !lexicon.is_droppable_filler(w))
        .collect()
}

/// "30 2" -> "32" for tens 20..=90 and units 1..=9, except in the
/// "A320, four thousand" shape where the leading type digit plus tens names
/// an Airbus type and the unit is the altitude.
fn combine_tens_units(lexicon: &Lexicon, words: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        let tens = words[i].as_str();
        let is_tens = tens.len() == 2
            && tens.ends_with('0')
            && tens.chars().all(|c| c.is_ascii_digit())
            && tens.as_bytes()[0] >= b'2';
        let unit = words
            .get(i + 1)
            .map(|u| u.as_str())
            .filter(|u| u.len() == 1 && matches!(u.as_bytes()[0], b'1'..=b'9'));
        if let (true, Some(unit)) = (is_tens, unit) {
            let prev_type_digit = out
                .last()
                .filter(|p| p.len() == 1 && matches!(p.as_bytes()[0], b'1'..=b'9'))
                .and_then(|p| p.parse::<u32>().ok());
            let thousand_follows = matches!(
                words.get(i + 2).map(|w| w.as_str()),
                Some("thousand") | Some("thousandth")
            );
            let tens_value: u32 = tens.parse().unwrap_or(0);
            let is_type = prev_type_digit
                .is_some_and(|d| lexicon.is_airbus_type_number(d * 100 + tens_value));
            if !(thousand_follows && is_type) {
                out.push(format!("{}{}", &tens[..1], unit));
                i += 2;
                continue;
            }
        }
        out.push(words[i].clone());
        i += 1;
    }
    out
}

fn apply_multi_token(lexicon: &Lexicon, words: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        if let Some((len, replacement)) = lexicon.multi_token_at(&words[i..]) {
            out.extend(replacement.iter().map(|w| (*w).to_string()));
            i += len;
        } else {
            out.push(words[i].clone());
            i += 1;
        }
    }
    out
}

/// "turn <garble> to 20" is almost always "turn two twenty": rewrite to
/// "turn heading 220" when the result is a legal heading.
fn rewrite_turn_to(words: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    let mut i = 0;
    'outer: while i < words.len() {
        if words[i] == "turn" {
            for to_idx in [i + 1, i + 2] {
                if words.get(to_idx).map(|w| w.as_str()) != Some("to") {
                    continue;
                }
                if to_idx == i + 2 {
                    let between = words[i + 1].as_str();
                    if matches!(between, "left" | "right" | "heading")
                        || is_digit_string(between)
                    {
                        break;
                    }
                }
                let Some(n) = words
                    .get(to_idx + 1)
                    .filter(|w| w.len() <= 2 && is_digit_string(w))
                    .and_then(|w| w.parse::<u32>().ok())
                else {
                    break;
                };
                let heading = 200 + n;
                if heading <= 360 {
                    out.push("turn".to_string());
                    out.push("heading".to_string());
                    out.push(heading.to_string());
                    i = to_idx + 2;
                    continue 'outer;
                }
                break;
            }
        }
        out.push(words[i].clone());
        i += 1;
    }
    out
}

/// "13l" -> "13 left", "22r" -> "22 right", "9c" -> "9 center".
fn split_runway_designators(words: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    for word in words {
        if let Some(caps) = RUNWAY_DESIGNATOR.captures(&word) {
            out.push(caps[1].to_string());
            out.push(
                match &caps[2] {
                    "l" => "left",
                    "r" => "right",
                    _ => "center",
                }
                .to_string(),
            );
        } else {
            out.push(word);
        }
    }
    out
}

/// "10 degrees ... left" implies a turn; insert the verb when the
/// controller's "turn" was swallowed.
fn insert_turn_before_degrees(words: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        let degrees_next = words.get(i + 1).map(|w| w.as_str()) == Some("degrees");
        let small_number = word
            .parse::<u32>()
            .ok()
            .filter(|n| (1..=45).contains(n))
            .is_some();
        if degrees_next && small_number && is_digit_string(word) {
            let direction_near = words[i + 2..]
                .iter()
                .take(4)
                .any(|w| w == "left" || w == "right");
            let turn_before = i > 0 && words[i - 1] == "turn";
            if direction_near && !turn_before {
                out.push("turn".to_string());
            }
        }
        out.push(word.clone());
    }
    out
}

fn is_digit_string(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(text: &str) -> Vec<String> {
        normalize(text)
    }

    #[test]
    fn digits_and_fillers() {
        assert_eq!(
            norm("descend and maintain one zero thousand"),
            ["descend", "maintain", "1", "0", "thousand"]
        );
    }

    #[test]
    fn keyword_variants_collapse() {
        assert_eq!(norm("descending two four zero"), ["descend", "2", "4", "0"]);
        assert_eq!(norm("contact tarot"), ["contact", "tower"]);
    }

    #[test]
    fn merged_command_words_split() {
        assert_eq!(
            norm("turnwright zero nine zero"),
            ["turn", "right", "0", "9", "0"]
        );
        assert_eq!(norm("cleardered KILEY"), ["cleared", "direct", "KILEY"]);
    }

    #[test]
    fn letter_digit_merges_split() {
        assert_eq!(norm("alaska8383 climb"), ["alaska", "8383", "climb"]);
    }

    #[test]
    fn tens_and_units_combine() {
        assert_eq!(norm("southwest seven ninety five"), ["southwest", "7", "95"]);
    }

    #[test]
    fn airbus_type_keeps_units_separate() {
        // "A320, four thousand": the 4 is the altitude, not 324.
        assert_eq!(
            norm("three twenty four thousand"),
            ["3", "20", "4", "thousand"]
        );
        // No type digit in front: combine as usual.
        assert_eq!(norm("twenty four thousand"), ["24", "thousand"]);
    }

    #[test]
    fn or_between_digits_is_dropped() {
        assert_eq!(norm("one or two five"), ["1", "2", "5"]);
        assert_eq!(norm("turn or right heading"), ["turn", "right", "heading"]);
    }

    #[test]
    fn and_inside_digit_runs() {
        // Long run: noise. Exactly two digits: a swallowed "one".
        assert_eq!(norm("nine two and two victor"), ["9", "2", "2", "victor"]);
        assert_eq!(norm("five and two"), ["5", "1", "2"]);
    }

    #[test]
    fn multi_token_replacements() {
        assert_eq!(norm("i l s runway"), ["ils", "runway"]);
        assert_eq!(norm("fly level three five zero"), ["flight", "level", "3", "5", "0"]);
        assert_eq!(norm("time riding two seven zero"), ["turn", "right", "2", "7", "0"]);
    }

    #[test]
    fn turn_to_small_number_becomes_heading() {
        assert_eq!(norm("turn to 20"), ["turn", "heading", "220"]);
        assert_eq!(norm("turn um to 45"), ["turn", "heading", "245"]);
        // Three-digit arguments are already headings, leave them alone.
        assert_eq!(norm("turn right to 090"), ["turn", "right", "090"]);
    }

    #[test]
    fn runway_designators_split() {
        assert_eq!(norm("runway 13l"), ["runway", "13", "left"]);
        assert_eq!(norm("runway 22r"), ["runway", "22", "right"]);
        assert_eq!(norm("runway 9c"), ["runway", "9", "center"]);
    }

    #[test]
    fn turn_inserted_before_degrees() {
        assert_eq!(
            norm("ten degrees left"),
            ["turn", "10", "degrees", "left"]
        );
        assert_eq!(
            norm("turn ten degrees right"),
            ["turn", "10", "degrees", "right"]
        );
    }

    #[test]
    fn weight_class_words_survive() {
        assert_eq!(norm("united heavy climb"), ["united", "heavy", "climb"]);
    }

    #[test]
    fn uppercase_fix_names_survive() {
        assert_eq!(norm("cleared direct KILEY"), ["cleared", "direct", "KILEY"]);
    }

    #[test]
    fn nato_words_are_not_converted() {
        assert_eq!(
            norm("november nine two two victor romeo"),
            ["november", "9", "2", "2", "victor", "romeo"]
        );
    }

    #[test]
    fn localizer_garbles_recognized() {
        assert_eq!(norm("zaplokalizer"), ["intercept", "localizer"]);
    }

    #[test]
    fn normalization_is_idempotent_on_normalized_output() {
        let once = norm("JetBlue 98 turnwright zero nine zero");
        let again = normalize(&once.join(" "));
        assert_eq!(once, again);
    }

    #[test]
    fn no_punctuation_or_droppable_fillers_in_output() {
        let words = norm("uh, JetBlue 98, turn right please -- heading 090!");
        for w in &words {
            assert!(w.chars().all(|c| c.is_ascii_alphanumeric()), "{w:?}");
            assert!(!Lexicon::global().is_droppable_filler(w), "{w:?}");
        }
    }
}
