//! Callsign pattern engine
//!
//! Resolves the leading tokens of a transmission against the aircraft on
//! frequency. Patterns are small matcher pipelines parsed from a text DSL
//! ("{skip:2}{airline}{flight}") and evaluated in priority order; candidate
//! producers (exact phrase, airline, ...) seed the candidate set and filter
//! matchers (flight number) refine it. Every stage works on the sorted
//! context so ties break deterministically.

use aviation_helper_rs::aircraft::{Aircraft, AircraftContext, AddressingForm};
use serde::Serialize;
use std::sync::LazyLock;

use crate::lexicon::Lexicon;
use crate::metrics::{jaro_winkler, phonetic_match};
use crate::tokenizer::Token;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallsignMatch {
    /// ICAO callsign of the addressed aircraft.
    pub callsign: String,
    /// Context key the match was made under.
    pub spoken_key: String,
    pub confidence: f64,
    /// Tokens consumed from the start of the input.
    pub consumed: usize,
    pub addressing_form: AddressingForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatcherKind {
    Skip(usize),
    ExactPhrase,
    SuffixPhrase,
    Airline,
    Flight,
    GaNovember,
    FlightOnly,
}

pub type ConditionFn = fn(&Aircraft) -> bool;
/// May rewrite candidate scores. Returns the pattern confidence, or `None`
/// to reject the candidate and skip the pattern.
pub type ScoringFn = fn(&mut Candidate) -> Option<f64>;

/// One aircraft still in the running for the current pattern.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub spoken_key: String,
    pub callsign: String,
    pub addressing_form: AddressingForm,
    pub airline_score: f64,
    pub flight_score: f64,
    pub consumed: usize,
}

pub struct CallsignPattern {
    name: &'static str,
    priority: i32,
    matchers: Vec<MatcherKind>,
    max_skip: usize,
    min_score: f64,
    fixed_confidence: f64,
    scoring: Option<ScoringFn>,
    condition: Option<ConditionFn>,
    require_unique: bool,
}

impl CallsignPattern {
    /// Parse a matcher template. Panics on malformed templates; patterns are
    /// registered at startup and a bad template is a developer error.
    pub fn parse(name: &'static str, template: &str, priority: i32) -> Self {
        let mut matchers = Vec::new();
        let mut max_skip = 0;
        let mut rest = template.trim();
        while !rest.is_empty() {
            let inner_end = match (rest.starts_with('{'), rest.find('}')) {
                (true, Some(end)) => end,
                _ => panic!("malformed callsign template {template:?} in pattern {name}"),
            };
            let inner = &rest[1..inner_end];
            let matcher = if let Some(n) = inner.strip_prefix("skip:") {
                let n = n
                    .parse()
                    .unwrap_or_else(|_| panic!("bad skip count in pattern {name}: {inner:?}"));
                max_skip = n;
                MatcherKind::Skip(n)
            } else {
                match inner {
                    "exact_phrase" => MatcherKind::ExactPhrase,
                    "suffix_phrase" => MatcherKind::SuffixPhrase,
                    "airline" => MatcherKind::Airline,
                    "flight" => MatcherKind::Flight,
                    "ga_november" => MatcherKind::GaNovember,
                    "flight_only" => MatcherKind::FlightOnly,
                    _ => panic!("unknown matcher {inner:?} in pattern {name}"),
                }
            };
            matchers.push(matcher);
            rest = &rest[inner_end + 1..];
        }
        Self {
            name,
            priority,
            matchers,
            max_skip,
            min_score: 0.0,
            fixed_confidence: 0.0,
            scoring: None,
            condition: None,
            require_unique: false,
        }
    }

    pub fn min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn fixed_confidence(mut self, confidence: f64) -> Self {
        self.fixed_confidence = confidence;
        self
    }

    pub fn scoring(mut self, scoring: ScoringFn) -> Self {
        self.scoring = Some(scoring);
        self
    }

    pub fn condition(mut self, condition: ConditionFn) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn require_unique(mut self) -> Self {
        self.require_unique = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn is_exact(&self) -> bool {
        self.matchers.contains(&MatcherKind::ExactPhrase)
    }

    fn evaluate(
        &self,
        lexicon: &Lexicon,
        tokens: &[Token],
        context: &AircraftContext,
    ) -> Option<PatternMatch> {
        let entries: Vec<(&String, &Aircraft)> = context
            .iter()
            .filter(|(_, aircraft)| self.condition.is_none_or(|c| c(aircraft)))
            .collect();
        if entries.is_empty() {
            return None;
        }
        for skip in 0..=self.max_skip {
            if skip >= tokens.len() {
                break;
            }
            // Never search for a callsign across a command keyword unless
            // the pattern matches exactly.
            if skip > 0
                && !self.is_exact()
                && lexicon.is_boundary_keyword(&tokens[skip - 1].text)
            {
                break;
            }
            let sub = &tokens[skip..];
            let mut candidates: Vec<Candidate> = Vec::new();
            for matcher in &self.matchers {
                match matcher {
                    MatcherKind::Skip(_) => {}
                    MatcherKind::ExactPhrase => candidates = exact_phrase(sub, &entries),
                    MatcherKind::SuffixPhrase => candidates = suffix_phrase(sub, &entries),
                    MatcherKind::Airline => candidates = airline(lexicon, sub, &entries),
                    MatcherKind::GaNovember => candidates = ga_november(lexicon, sub, &entries),
                    MatcherKind::FlightOnly => candidates = flight_only(lexicon, sub, &entries),
                    MatcherKind::Flight => candidates = flight_refine(lexicon, sub, candidates),
                }
                if candidates.is_empty() && !matches!(matcher, MatcherKind::Skip(_)) {
                    break;
                }
            }
            if candidates.is_empty() {
                continue;
            }
            let Some(mut candidate) = self.select(sub, candidates) else {
                return None;
            };
            let confidence_override = match self.scoring {
                Some(scoring) => match scoring(&mut candidate) {
                    Some(confidence) => Some(confidence),
                    None => return None,
                },
                None => None,
            };
            if candidate.airline_score + candidate.flight_score < self.min_score {
                return None;
            }
            let mut confidence = if self.fixed_confidence > 0.0 {
                self.fixed_confidence
            } else if let Some(confidence) = confidence_override {
                confidence
            } else {
                0.6 + 0.4 * ((candidate.airline_score + candidate.flight_score) / 2.0)
            };
            confidence *= 1.0 - 0.1 * skip as f64;
            let mut consumed = (skip + candidate.consumed).min(tokens.len());
            if tokens
                .get(consumed)
                .is_some_and(|t| Lexicon::is_weight_class(&t.text.to_lowercase()))
            {
                consumed += 1;
            }
            log::debug!(
                "callsign pattern {} admitted {} (confidence {:.3}, skip {skip})",
                self.name,
                candidate.callsign,
                confidence
            );
            return Some(PatternMatch {
                candidate,
                confidence: confidence.clamp(0.0, 1.0),
                priority: self.priority,
                skip,
                consumed,
            });
        }
        None
    }

    /// Pick one candidate: exact spoken-key disambiguation, then the flight
    /// hint, then total score with deterministic tie-breaking. `None`
    /// rejects the whole pattern (ambiguity under `require_unique`).
    fn select(&self, tokens: &[Token], mut candidates: Vec<Candidate>) -> Option<Candidate> {
        if candidates.len() == 1 {
            return candidates.pop();
        }
        let exact: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                phrase(tokens, c.consumed.min(tokens.len())) == c.spoken_key.to_lowercase()
            })
            .map(|(i, _)| i)
            .collect();
        if self.require_unique {
            return match exact.as_slice() {
                [only] => Some(candidates.swap_remove(*only)),
                _ => None,
            };
        }
        if let [only] = exact.as_slice() {
            return Some(candidates.swap_remove(*only));
        }
        if let Some(candidate) = flight_hint_disambiguation(tokens, &candidates) {
            return Some(candidate);
        }
        candidates.sort_by(|a, b| {
            let ta = a.airline_score + a.flight_score;
            let tb = b.airline_score + b.flight_score;
            tb.partial_cmp(&ta)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.addressing_form.cmp(&b.addressing_form))
                .then(a.callsign.cmp(&b.callsign))
        });
        candidates.into_iter().next()
    }
}

struct PatternMatch {
    candidate: Candidate,
    confidence: f64,
    priority: i32,
    skip: usize,
    consumed: usize,
}

pub struct CallsignRegistry {
    patterns: Vec<CallsignPattern>,
}

static REGISTRY: LazyLock<CallsignRegistry> =
    LazyLock::new(crate::registry::standard_callsign_patterns);

impl CallsignRegistry {
    /// Process-wide registry, built once and sealed.
    pub fn global() -> &'static CallsignRegistry {
        &REGISTRY
    }

    pub fn new() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn register(&mut self, pattern: CallsignPattern) {
        self.patterns.push(pattern);
        self.patterns
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.name.cmp(b.name)));
    }

    pub fn run(
        &self,
        lexicon: &Lexicon,
        tokens: &[Token],
        context: &AircraftContext,
    ) -> Option<CallsignMatch> {
        if tokens.is_empty() || context.is_empty() {
            return None;
        }

        // Weight-class prefilter: "... heavy" narrows the field before any
        // pattern runs, but only to a strict, non-empty subset.
        let scan = tokens.len().min(7);
        if let Some(idx) = tokens[..scan]
            .iter()
            .position(|t| Lexicon::is_weight_class(&t.text.to_lowercase()))
        {
            let weight = tokens[idx].text.to_lowercase();
            let filtered: AircraftContext = context
                .iter()
                .filter(|(key, _)| key.to_lowercase().ends_with(&weight))
                .map(|(key, aircraft)| (key.clone(), aircraft.clone()))
                .collect();
            if !filtered.is_empty() && filtered.len() < context.len() {
                if let Some(mut matched) = self.run(lexicon, &tokens[..=idx], &filtered) {
                    matched.consumed = idx + 1;
                    return Some(matched);
                }
            }
        }

        let mut admitted: Vec<PatternMatch> = self
            .patterns
            .iter()
            .filter_map(|pattern| pattern.evaluate(lexicon, tokens, context))
            .collect();
        admitted.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.priority.cmp(&a.priority))
                .then(a.skip.cmp(&b.skip))
                .then(b.consumed.cmp(&a.consumed))
        });
        let best = admitted.into_iter().next()?;
        Some(CallsignMatch {
            callsign: best.candidate.callsign,
            spoken_key: best.candidate.spoken_key,
            confidence: best.confidence,
            consumed: best.consumed,
            addressing_form: best.candidate.addressing_form,
        })
    }
}

impl Default for CallsignRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Match with the process-wide registry and lexicon. Returns the match (if
/// any) and the unconsumed tail.
pub fn match_callsign<'t>(
    tokens: &'t [Token],
    context: &AircraftContext,
) -> (Option<CallsignMatch>, &'t [Token]) {
    match_callsign_with(CallsignRegistry::global(), Lexicon::global(), tokens, context)
}

pub fn match_callsign_with<'t>(
    registry: &CallsignRegistry,
    lexicon: &Lexicon,
    tokens: &'t [Token],
    context: &AircraftContext,
) -> (Option<CallsignMatch>, &'t [Token]) {
    match registry.run(lexicon, tokens, context) {
        Some(matched) => {
            let tail = &tokens[matched.consumed..];
            (Some(matched), tail)
        }
        None => (None, tokens),
    }
}

/// Flight-number portion of an ICAO callsign: first digit onward.
fn flight_portion(callsign: &str) -> &str {
    match callsign.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => &callsign[idx..],
        None => "",
    }
}

fn phrase(tokens: &[Token], k: usize) -> String {
    tokens[..k]
        .iter()
        .map(|t| t.text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

fn candidate_for(key: &str, aircraft: &Aircraft, score: f64, consumed: usize) -> Candidate {
    Candidate {
        spoken_key: key.to_string(),
        callsign: aircraft.callsign.clone(),
        addressing_form: aircraft.addressing_form,
        airline_score: score,
        flight_score: score,
        consumed,
    }
}

/// Longest phrase of leading tokens equal to a spoken key.
fn exact_phrase(tokens: &[Token], entries: &[(&String, &Aircraft)]) -> Vec<Candidate> {
    for k in (1..=tokens.len().min(8)).rev() {
        let joined = phrase(tokens, k);
        let hits: Vec<Candidate> = entries
            .iter()
            .filter(|(key, _)| key.to_lowercase() == joined)
            .map(|(key, aircraft)| candidate_for(key, aircraft, 1.0, k))
            .collect();
        if !hits.is_empty() {
            return hits;
        }
    }
    Vec::new()
}

/// Abbreviated GA addressing: the tokens form a suffix of the spoken key.
fn suffix_phrase(tokens: &[Token], entries: &[(&String, &Aircraft)]) -> Vec<Candidate> {
    for k in (3..=tokens.len().min(8)).rev() {
        let joined = phrase(tokens, k);
        let hits: Vec<Candidate> = entries
            .iter()
            .filter(|(_, aircraft)| aircraft.callsign.starts_with('N'))
            .filter(|(key, _)| {
                let key = key.to_lowercase();
                key == joined || key.ends_with(&format!(" {joined}"))
            })
            .map(|(key, aircraft)| candidate_for(key, aircraft, 1.0, k))
            .collect();
        if !hits.is_empty() {
            return hits;
        }
    }
    Vec::new()
}

/// Airline words of a spoken key: everything before the first numeric part
/// or weight-class suffix.
fn airline_words(key: &str) -> Vec<String> {
    key.to_lowercase()
        .split_whitespace()
        .take_while(|w| {
            !w.chars().any(|c| c.is_ascii_digit()) && !Lexicon::is_weight_class(w)
        })
        .map(str::to_string)
        .collect()
}

/// Airline-name matcher. All strategies are tried and the best-scoring one
/// wins, so "jet blue" can prefer the two-token concatenation over a weak
/// first-word hit.
fn airline(lexicon: &Lexicon, tokens: &[Token], entries: &[(&String, &Aircraft)]) -> Vec<Candidate> {
    let Some(first) = tokens.first().filter(|t| t.is_word()) else {
        return Vec::new();
    };
    let t0 = first.text.to_lowercase();
    let mut out = Vec::new();
    for (key, aircraft) in entries {
        let words = airline_words(key);
        if words.is_empty() {
            continue;
        }
        let mut strategies: Vec<(f64, usize)> = Vec::new();
        // (i) single word, exact or fuzzy (minimum 0.35)
        if words.len() == 1 {
            if t0 == words[0] {
                strategies.push((1.0, 1));
            } else {
                let jw = jaro_winkler(&t0, &words[0]);
                if phonetic_match(lexicon, &t0, &words[0]) {
                    strategies.push((jw.max(0.85), 1));
                } else if jw >= 0.35 {
                    strategies.push((jw, 1));
                }
            }
        }
        // (ii) all parts over consecutive tokens (per word 0.85, avg 0.85)
        if words.len() >= 2 && tokens.len() >= words.len() {
            let mut total = 0.0;
            let mut ok = true;
            for (j, word) in words.iter().enumerate() {
                let token = &tokens[j];
                if !token.is_word() {
                    ok = false;
                    break;
                }
                let text = token.text.to_lowercase();
                let jw = jaro_winkler(&text, word);
                if phonetic_match(lexicon, &text, word) {
                    total += jw.max(0.85);
                } else if jw >= 0.85 {
                    total += jw;
                } else {
                    ok = false;
                    break;
                }
            }
            let avg = total / words.len() as f64;
            if ok && avg >= 0.85 {
                strategies.push((avg, words.len()));
            }
        }
        let concat = words.concat();
        // (iii) concatenated form ("airfrance")
        if words.len() >= 2 {
            let jw = jaro_winkler(&t0, &concat);
            if jw >= 0.85 {
                strategies.push((jw, 1));
            }
        }
        // (iv) first word only
        let jw_first = jaro_winkler(&t0, &words[0]);
        if jw_first >= 0.40 {
            strategies.push((jw_first, 1));
        }
        // (v) two leading tokens concatenated ("jet blue" -> "jetblue")
        if let Some(second) = tokens.get(1).filter(|t| t.is_word()) {
            let two = format!("{t0}{}", second.text.to_lowercase());
            let jw = jaro_winkler(&two, &concat);
            if jw >= 0.85 {
                strategies.push((jw, 2));
            }
        }
        let best = strategies.into_iter().max_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        if let Some((score, consumed)) = best {
            out.push(Candidate {
                spoken_key: key.to_string(),
                callsign: aircraft.callsign.clone(),
                addressing_form: aircraft.addressing_form,
                airline_score: score,
                flight_score: 0.0,
                consumed,
            });
        }
    }
    out
}

/// Concatenate the flight-number region: digit tokens, NATO letters, single
/// letters and mixed alphanumerics. Stops at the first token of any other
/// shape.
fn build_flight_string(lexicon: &Lexicon, tokens: &[Token]) -> Option<(String, usize)> {
    let mut built = String::new();
    let mut used = 0;
    for token in tokens {
        if token.is_number() {
            built.push_str(&token.text);
        } else if let Some(letter) = token.letter() {
            built.push(letter);
        } else if token.is_word() && lexicon.is_nato(&token.text.to_lowercase()) {
            built.push(lexicon.nato_letter(&token.text.to_lowercase()).unwrap_or('?'));
        } else if token.is_word()
            && token.text.chars().any(|c| c.is_ascii_digit())
            && token.text.chars().all(|c| c.is_ascii_alphanumeric())
        {
            built.push_str(&token.text.to_lowercase());
        } else {
            break;
        }
        used += 1;
    }
    if built.is_empty() { None } else { Some((built, used)) }
}

fn flight_number_score(built: &str, expected: &str) -> f64 {
    if built == expected {
        return 1.0;
    }
    if expected.ends_with(built) {
        return 0.85;
    }
    if built.ends_with(expected) {
        return 0.80;
    }
    let jw = jaro_winkler(built, expected);
    if jw >= 0.7 {
        return jw;
    }
    if built.len() == 2
        && expected.len() == 2
        && built.as_bytes().last() == expected.as_bytes().last()
    {
        return 0.7;
    }
    0.0
}

/// Filter matcher: score the flight-number region against each surviving
/// candidate's expected flight number.
fn flight_refine(lexicon: &Lexicon, tokens: &[Token], candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut out = Vec::new();
    for mut candidate in candidates {
        let start = candidate.consumed.min(tokens.len());
        let Some((built, used)) = build_flight_string(lexicon, &tokens[start..]) else {
            continue;
        };
        let expected = flight_portion(&candidate.callsign).to_lowercase();
        if expected.is_empty() {
            continue;
        }
        let score = flight_number_score(&built, &expected);
        if score == 0.0 {
            continue;
        }
        candidate.flight_score = score;
        candidate.consumed += used;
        out.push(candidate);
    }
    out
}

/// "november" plus a number, matched against GA flight digits.
fn ga_november(
    lexicon: &Lexicon,
    tokens: &[Token],
    entries: &[(&String, &Aircraft)],
) -> Vec<Candidate> {
    if !tokens.first().is_some_and(|t| t.is("november")) {
        return Vec::new();
    }
    if !tokens.get(1).is_some_and(Token::is_number) {
        return Vec::new();
    }
    let mut digits = String::new();
    let mut used = 1;
    while let Some(token) = tokens.get(used).filter(|t| t.is_number()) {
        digits.push_str(&token.text);
        used += 1;
    }
    // Trailing registration letters belong to the callsign region too.
    while tokens.get(used).is_some_and(|t| {
        t.letter().is_some() || (t.is_word() && lexicon.is_nato(&t.text.to_lowercase()))
    }) {
        used += 1;
    }
    let mut out = Vec::new();
    for (key, aircraft) in entries {
        if !aircraft.callsign.starts_with('N') {
            continue;
        }
        let expected = aircraft.flight_digits();
        if expected.is_empty() {
            continue;
        }
        let score = if digits == expected {
            1.0
        } else if expected.ends_with(&digits) {
            0.85
        } else if expected.contains(&digits) {
            0.75
        } else {
            let jw = jaro_winkler(&digits, &expected);
            if jw >= 0.65 { jw * 0.9 } else { 0.0 }
        };
        if score > 0.0 {
            out.push(candidate_for(key, aircraft, score, used));
        }
    }
    out
}

/// Bare flight number somewhere in the first three positions.
fn flight_only(
    lexicon: &Lexicon,
    tokens: &[Token],
    entries: &[(&String, &Aircraft)],
) -> Vec<Candidate> {
    for start in 0..tokens.len().min(3) {
        if !tokens[start].is_number() {
            continue;
        }
        let Some((built, used)) = build_flight_string(lexicon, &tokens[start..]) else {
            continue;
        };
        let mut out = Vec::new();
        for (key, aircraft) in entries {
            let expected = aircraft.flight_number().to_lowercase();
            if expected.is_empty() {
                continue;
            }
            let score = if built == expected {
                1.0
            } else if expected.ends_with(&built) {
                0.75
            } else if expected.contains(&built) {
                0.65
            } else {
                let jw = jaro_winkler(&built, &expected);
                if jw >= 0.80 { jw } else { 0.0 }
            };
            if score > 0.0 {
                let mut candidate = candidate_for(key, aircraft, score, start + used);
                candidate.airline_score = 0.0;
                out.push(candidate);
            }
        }
        if !out.is_empty() {
            return out;
        }
    }
    Vec::new()
}

/// Numeric tokens spoken after the callsign region often repeat the flight
/// number; prefer the candidate they agree with.
fn flight_hint_disambiguation(tokens: &[Token], candidates: &[Candidate]) -> Option<Candidate> {
    let mut scored: Vec<(f64, &Candidate)> = Vec::new();
    for candidate in candidates {
        let start = candidate.consumed.min(tokens.len());
        let hint: String = tokens[start..]
            .iter()
            .filter(|t| t.is_number())
            .take(5)
            .map(|t| t.text.as_str())
            .collect();
        if hint.is_empty() {
            continue;
        }
        let flight: String = flight_portion(&candidate.callsign)
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if flight.is_empty() {
            continue;
        }
        let score = if hint == flight {
            1.0
        } else if hint.ends_with(&flight) {
            0.90
        } else if hint.contains(&flight) {
            0.85
        } else {
            0.0
        };
        if score >= 0.85 {
            scored.push((score, candidate));
        }
    }
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    match scored.as_slice() {
        [] => None,
        [(_, only)] => Some((*only).clone()),
        [(first, c), (second, _), ..] if first > second => Some((*c).clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::tokenizer::tokenize;
    use aviation_helper_rs::aircraft::Aircraft;

    fn entry(key: &str, callsign: &str) -> (String, Aircraft) {
        (key.to_string(), Aircraft::new(callsign))
    }

    fn context(entries: &[(&str, &str)]) -> AircraftContext {
        entries
            .iter()
            .map(|(key, callsign)| entry(key, callsign))
            .collect()
    }

    fn run(text: &str, ctx: &AircraftContext) -> Option<CallsignMatch> {
        let tokens = tokenize(&normalize(text));
        CallsignRegistry::global().run(Lexicon::global(), &tokens, ctx)
    }

    #[test]
    fn exact_spoken_key_matches_with_full_confidence() {
        let ctx = context(&[("jetblue 98", "JBU98"), ("american 5936", "AAL5936")]);
        let m = run("jetblue 98 turn right heading two seven zero", &ctx).unwrap();
        assert_eq!(m.callsign, "JBU98");
        assert_eq!(m.consumed, 2);
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn airline_and_split_flight_number() {
        let ctx = context(&[("american 5936", "AAL5936"), ("jetblue 98", "JBU98")]);
        let m = run("american 59 36 descend and maintain one zero thousand", &ctx).unwrap();
        assert_eq!(m.callsign, "AAL5936");
        assert_eq!(m.consumed, 3);
        assert!(m.confidence >= 0.90, "confidence {}", m.confidence);
    }

    #[test]
    fn ga_full_phrase_and_suffix() {
        let ctx = context(&[("november 9 2 2 victor romeo", "N922VR")]);
        let m = run("november 9 2 2 victor romeo cleared direct KILEY", &ctx).unwrap();
        assert_eq!(m.callsign, "N922VR");
        assert_eq!(m.consumed, 6);

        let m = run("2 victor romeo climb", &ctx).unwrap();
        assert_eq!(m.callsign, "N922VR");
        assert_eq!(m.confidence, 0.95);
    }

    #[test]
    fn november_with_digits_matches_ga() {
        let ctx = context(&[
            ("november 9 2 2 victor romeo", "N922VR"),
            ("jetblue 98", "JBU98"),
        ]);
        let m = run("november 9 2 2 descend", &ctx).unwrap();
        assert_eq!(m.callsign, "N922VR");
    }

    #[test]
    fn weight_class_prefilter_narrows_but_never_widens() {
        let ctx = context(&[
            ("united 5 heavy", "UAL5"),
            ("united 52", "UAL52"),
        ]);
        let m = run("united 5 heavy climb and maintain flight level three five zero", &ctx)
            .unwrap();
        assert_eq!(m.callsign, "UAL5");
        assert_eq!(m.consumed, 3, "weight suffix is part of the callsign");

        // All aircraft end in "heavy": the filter would not narrow, so the
        // normal flow decides.
        let all_heavy = context(&[("united 5 heavy", "UAL5")]);
        let m = run("united 5 heavy climb", &all_heavy).unwrap();
        assert_eq!(m.callsign, "UAL5");
    }

    #[test]
    fn skip_tolerates_leading_garbage_with_a_penalty() {
        let ctx = context(&[("jetblue 98", "JBU98")]);
        let clean = run("jetblue 98 climb", &ctx).unwrap();
        let noisy = run("kay jetblue 98 climb", &ctx).unwrap();
        assert_eq!(noisy.callsign, "JBU98");
        assert!(noisy.confidence < clean.confidence);
        assert_eq!(noisy.consumed, 3);
    }

    #[test]
    fn flight_hint_disambiguates_same_airline() {
        let ctx = context(&[("jetblue 98", "JBU98"), ("jetblue 371", "JBU371")]);
        let m = run("jetblue 371 descend", &ctx).unwrap();
        assert_eq!(m.callsign, "JBU371");
    }

    #[test]
    fn ambiguous_airline_only_falls_through() {
        let ctx = context(&[("jetblue 98", "JBU98"), ("jetblue 371", "JBU371")]);
        // No flight number at all: nothing can disambiguate, no match.
        let tokens = tokenize(&normalize("jetblue climb and maintain five thousand"));
        let result = CallsignRegistry::global().run(Lexicon::global(), &tokens, &ctx);
        assert!(result.is_none());
    }

    #[test]
    fn tie_break_is_deterministic() {
        // Two aircraft with identical flight numbers: lexicographically
        // smaller callsign wins on equal scores.
        let ctx = context(&[("delta 100", "DAL100"), ("jetblue 100", "JBU100")]);
        let m = run("100 climb", &ctx).unwrap();
        assert_eq!(m.callsign, "DAL100");
        assert_eq!(m.confidence, 0.70);
    }

    #[test]
    fn no_callsign_leaves_all_tokens() {
        let ctx = context(&[("delta 123", "DAL123")]);
        let tokens = tokenize(&normalize("cleardered KILEY"));
        let (matched, tail) =
            match_callsign_with(CallsignRegistry::global(), Lexicon::global(), &tokens, &ctx);
        assert!(matched.is_none());
        assert_eq!(tail.len(), tokens.len());
    }

    #[test]
    fn match_bounds_hold() {
        let ctx = context(&[("american 5936", "AAL5936")]);
        let tokens = tokenize(&normalize("american 5936 descend"));
        let (matched, tail) =
            match_callsign_with(CallsignRegistry::global(), Lexicon::global(), &tokens, &ctx);
        let m = matched.unwrap();
        assert!(m.consumed >= 1 && m.consumed <= tokens.len());
        assert!(m.confidence > 0.0 && m.confidence <= 1.0);
        assert_eq!(m.consumed + tail.len(), tokens.len());
    }
}
