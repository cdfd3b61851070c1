//! Typed parameter parsers for command templates.
//!
//! Each `{type}` placeholder in a template resolves through one of these
//! parsers. A parser sees the tokens at the current position plus the
//! addressed aircraft (for context like known fixes and candidate
//! approaches) and returns the parsed value with the token count consumed,
//! or nothing on failure.

use aviation_helper_rs::aircraft::Aircraft;

use crate::lexicon::Lexicon;
use crate::metrics::jaro_winkler;
use crate::tokenizer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactFacility {
    Tower,
    Ground,
    Approach,
    Departure,
    Center,
}

impl ContactFacility {
    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "tower" => Self::Tower,
            "ground" => Self::Ground,
            "approach" => Self::Approach,
            "departure" => Self::Departure,
            "center" => Self::Center,
            _ => return None,
        })
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Tower => "TO",
            Self::Ground => "GC",
            Self::Approach => "CA",
            Self::Departure => "CD",
            Self::Center => "CC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Feet.
    Altitude(u32),
    Heading(u32),
    /// Knots.
    Speed(u32),
    Fix(String),
    /// Canonical approach code, e.g. "I27R".
    Approach(String),
    Squawk(String),
    Degrees(u32),
    Number(u32),
    Letter(char),
    Text(String),
    /// Speed-restriction suffix, e.g. "U5MF".
    Until(String),
    Contact {
        facility: ContactFacility,
        frequency: Option<String>,
    },
}

impl ParamValue {
    pub fn altitude(&self) -> Option<u32> {
        match self {
            ParamValue::Altitude(feet) => Some(*feet),
            _ => None,
        }
    }

    pub fn heading(&self) -> Option<u32> {
        match self {
            ParamValue::Heading(h) => Some(*h),
            _ => None,
        }
    }

    pub fn speed(&self) -> Option<u32> {
        match self {
            ParamValue::Speed(s) => Some(*s),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<u32> {
        match self {
            ParamValue::Number(n) | ParamValue::Degrees(n) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ParamValue::Fix(s)
            | ParamValue::Approach(s)
            | ParamValue::Squawk(s)
            | ParamValue::Text(s)
            | ParamValue::Until(s) => Some(s),
            _ => None,
        }
    }

    pub fn letter(&self) -> Option<char> {
        match self {
            ParamValue::Letter(c) => Some(*c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Altitude,
    StandaloneAltitude,
    Heading,
    Speed,
    SpeedUntil,
    Fix,
    Approach,
    ApproachLahso,
    Squawk,
    Degrees,
    Sid,
    Star,
    Num { min: u32, max: u32 },
    AtisLetter,
    Hold,
    Traffic,
    ContactFrequency,
    GarbledWord,
    Text,
}

impl ParamKind {
    /// Resolve a placeholder name from the template DSL.
    pub fn parse_name(name: &str) -> Option<ParamKind> {
        if let Some(range) = name.strip_prefix("num:") {
            let (min, max) = range.split_once('-')?;
            return Some(ParamKind::Num {
                min: min.parse().ok()?,
                max: max.parse().ok()?,
            });
        }
        Some(match name {
            "altitude" => ParamKind::Altitude,
            "standalone_altitude" => ParamKind::StandaloneAltitude,
            "heading" => ParamKind::Heading,
            "speed" => ParamKind::Speed,
            "speed_until" => ParamKind::SpeedUntil,
            "fix" => ParamKind::Fix,
            "approach" => ParamKind::Approach,
            "approach_lahso" => ParamKind::ApproachLahso,
            "squawk" => ParamKind::Squawk,
            "degrees" => ParamKind::Degrees,
            "sid" => ParamKind::Sid,
            "star" => ParamKind::Star,
            "atis_letter" => ParamKind::AtisLetter,
            "hold" => ParamKind::Hold,
            "traffic" => ParamKind::Traffic,
            "contact_frequency" => ParamKind::ContactFrequency,
            "garbled_word" => ParamKind::GarbledWord,
            "text" => ParamKind::Text,
            _ => return None,
        })
    }
}

/// Run the parser for `kind` at the head of `tokens`.
pub fn parse_param(
    kind: ParamKind,
    lexicon: &Lexicon,
    tokens: &[Token],
    aircraft: &Aircraft,
) -> Option<(ParamValue, usize)> {
    match kind {
        ParamKind::Altitude => parse_altitude(tokens),
        ParamKind::StandaloneAltitude => {
            let feet = tokens.first()?.altitude()?;
            Some((ParamValue::Altitude(feet), 1))
        }
        ParamKind::Heading => parse_heading(tokens),
        ParamKind::Speed => parse_speed(tokens),
        ParamKind::SpeedUntil => parse_speed_until(tokens, aircraft),
        ParamKind::Fix => {
            parse_fix(tokens, aircraft).map(|(fix, used)| (ParamValue::Fix(fix), used))
        }
        ParamKind::Approach => parse_approach(lexicon, tokens, aircraft, false),
        ParamKind::ApproachLahso => parse_approach(lexicon, tokens, aircraft, true),
        ParamKind::Squawk => parse_squawk(tokens),
        ParamKind::Degrees => {
            let n = tokens.first()?.number().filter(|n| (1..=45).contains(n))?;
            Some((ParamValue::Degrees(n), 1))
        }
        ParamKind::Sid => parse_procedure(tokens, aircraft.sid.as_ref()),
        ParamKind::Star => parse_procedure(tokens, aircraft.star.as_ref()),
        ParamKind::Num { min, max } => {
            let n = tokens.first()?.number().filter(|n| (min..=max).contains(n))?;
            Some((ParamValue::Number(n), 1))
        }
        ParamKind::AtisLetter => parse_atis_letter(lexicon, tokens),
        ParamKind::Hold => parse_hold(tokens, aircraft),
        ParamKind::Traffic => parse_traffic(lexicon, tokens),
        ParamKind::ContactFrequency => parse_contact(tokens),
        ParamKind::GarbledWord => {
            let token = tokens.first().filter(|t| t.is_word())?;
            Some((ParamValue::Text(token.text.clone()), 1))
        }
        ParamKind::Text => {
            let token = tokens.first()?;
            Some((ParamValue::Text(token.text.clone()), 1))
        }
    }
}

/// Contiguous digit tokens concatenated, capped at `max_len` characters.
fn digit_run(tokens: &[Token], max_len: usize) -> Option<(String, usize)> {
    let mut digits = String::new();
    let mut used = 0;
    for token in tokens {
        if !token.is_number() || digits.len() + token.text.len() > max_len {
            break;
        }
        digits.push_str(&token.text);
        used += 1;
    }
    if digits.is_empty() { None } else { Some((digits, used)) }
}

fn parse_altitude(tokens: &[Token]) -> Option<(ParamValue, usize)> {
    if let Some(feet) = tokens.first().and_then(Token::altitude) {
        return Some((ParamValue::Altitude(feet), 1));
    }
    let (digits, used) = digit_run(tokens, 5)?;
    let value: u32 = digits.parse().ok()?;
    if digits.len() >= 4 && (1000..=60000).contains(&value) && value % 100 == 0 {
        return Some((ParamValue::Altitude(value), used));
    }
    // Three digits read as a flight level ("descend two four zero").
    if digits.len() == 3 && (10..=600).contains(&value) {
        return Some((ParamValue::Altitude(value * 100), used));
    }
    None
}

fn parse_heading(tokens: &[Token]) -> Option<(ParamValue, usize)> {
    let mut digits = String::new();
    let mut used = 0;
    for token in tokens {
        if !token.is_number() || digits.len() >= 3 || digits.len() + token.text.len() > 3 {
            break;
        }
        digits.push_str(&token.text);
        used += 1;
    }
    if digits.is_empty() {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    if (1..=360).contains(&value) {
        Some((ParamValue::Heading(value), used))
    } else {
        None
    }
}

fn parse_speed(tokens: &[Token]) -> Option<(ParamValue, usize)> {
    let (digits, used) = digit_run(tokens, 3)?;
    let value: u32 = digits.parse().ok()?;
    if (60..=400).contains(&value) {
        Some((ParamValue::Speed(value), used))
    } else {
        None
    }
}

/// Resolve a spoken fix against the aircraft's known fixes. Strict: an
/// unknown name fails rather than inventing a fix.
fn parse_fix(tokens: &[Token], aircraft: &Aircraft) -> Option<(String, usize)> {
    for k in (1..=tokens.len().min(3)).rev() {
        let joined = tokens[..k]
            .iter()
            .map(|t| t.text.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        let mut best: Option<(f64, &String)> = None;
        for (spoken, id) in aircraft.fixes.iter().chain(aircraft.approach_fixes.iter()) {
            if spoken.to_lowercase() == joined || id.to_lowercase() == joined {
                return Some((id.clone(), k));
            }
            let jw = jaro_winkler(&joined, spoken);
            if jw >= 0.80 && best.as_ref().is_none_or(|(score, _)| jw > *score) {
                best = Some((jw, id));
            }
        }
        if let Some((_, id)) = best {
            return Some((id.clone(), k));
        }
    }
    None
}

/// Join adjacent digit words so "2 7" compares equal to "27".
fn squash_digits(words: &[String]) -> String {
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    for word in words {
        let digits = !word.is_empty() && word.chars().all(|c| c.is_ascii_digit());
        if digits
            && let Some(last) = out.last_mut()
            && last.chars().all(|c| c.is_ascii_digit())
            && last.len() + word.len() <= 2
        {
            last.push_str(word);
        } else {
            out.push(word.clone());
        }
    }
    out.join(" ")
}

/// Resolve a spoken approach name against `candidate_approaches`, consuming
/// through the trailing "approach" word when present. With `lahso` the
/// approach runway must be in the aircraft's LAHSO set.
fn parse_approach(
    lexicon: &Lexicon,
    tokens: &[Token],
    aircraft: &Aircraft,
    lahso: bool,
) -> Option<(ParamValue, usize)> {
    let mut words: Vec<String> = Vec::new();
    let mut used = 0;
    while used < tokens.len().min(8) {
        let token = &tokens[used];
        if token.is("approach") {
            used += 1;
            break;
        }
        if used > 0 && lexicon.is_boundary_keyword(&token.text.to_lowercase()) {
            break;
        }
        let word = token.text.to_lowercase();
        if word != "runway" {
            words.push(word);
        }
        used += 1;
    }
    if words.is_empty() {
        return None;
    }
    let phrase = squash_digits(&words);
    let mut best: Option<(f64, &String)> = None;
    for (spoken, code) in &aircraft.candidate_approaches {
        let key_words: Vec<String> = spoken
            .to_lowercase()
            .split_whitespace()
            .filter(|w| *w != "runway")
            .map(str::to_string)
            .collect();
        let key = squash_digits(&key_words);
        if key == phrase {
            best = Some((2.0, code));
            break;
        }
        let jw = jaro_winkler(&phrase, &key);
        if jw >= 0.75 && best.as_ref().is_none_or(|(score, _)| jw > *score) {
            best = Some((jw, code));
        }
    }
    let (_, code) = best?;
    if lahso && !lahso_allows(aircraft, code) {
        return None;
    }
    Some((ParamValue::Approach(code.clone()), used))
}

fn lahso_allows(aircraft: &Aircraft, approach_code: &str) -> bool {
    let runway: String = match approach_code.find(|c: char| c.is_ascii_digit()) {
        Some(idx) => approach_code[idx..].to_string(),
        None => return false,
    };
    aircraft
        .lahso_runways
        .iter()
        .any(|r| r.eq_ignore_ascii_case(&runway))
}

fn parse_squawk(tokens: &[Token]) -> Option<(ParamValue, usize)> {
    let beacon_digit =
        |t: &Token| t.is_number() && t.text.len() == 1 && matches!(t.text.as_bytes()[0], b'0'..=b'7');
    if tokens.len() >= 4 && tokens[..4].iter().all(beacon_digit) {
        let code: String = tokens[..4].iter().map(|t| t.text.as_str()).collect();
        return Some((ParamValue::Squawk(code), 4));
    }
    let t0 = tokens.first()?;
    if t0.is_number()
        && t0.text.len() == 4
        && t0.text.bytes().all(|b| (b'0'..=b'7').contains(&b))
    {
        return Some((ParamValue::Squawk(t0.text.clone()), 1));
    }
    None
}

fn parse_procedure(tokens: &[Token], name: Option<&String>) -> Option<(ParamValue, usize)> {
    let name = name?;
    let target = name.to_lowercase();
    for k in (1..=tokens.len().min(3)).rev() {
        let joined = tokens[..k]
            .iter()
            .map(|t| t.text.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        if joined == target || jaro_winkler(&joined, &target) >= 0.70 {
            return Some((ParamValue::Text(name.clone()), k));
        }
    }
    None
}

fn parse_atis_letter(lexicon: &Lexicon, tokens: &[Token]) -> Option<(ParamValue, usize)> {
    let t0 = tokens.first()?;
    if let Some(letter) = t0.letter() {
        return Some((ParamValue::Letter(letter), 1));
    }
    let letter = lexicon.nato_letter(&t0.text.to_lowercase())?;
    Some((ParamValue::Letter(letter), 1))
}

fn parse_hold(tokens: &[Token], aircraft: &Aircraft) -> Option<(ParamValue, usize)> {
    let (fix, mut used) = parse_fix(tokens, aircraft)?;
    if tokens.get(used).is_some_and(|t| t.is("as"))
        && tokens.get(used + 1).is_some_and(|t| t.is("published"))
    {
        used += 2;
    }
    Some((ParamValue::Fix(fix), used))
}

/// Clock-position traffic callout: "traffic two oclock five miles ...".
fn parse_traffic(lexicon: &Lexicon, tokens: &[Token]) -> Option<(ParamValue, usize)> {
    let clock = tokens.first()?.number().filter(|n| (1..=12).contains(n))?;
    if !tokens.get(1).is_some_and(|t| t.is("oclock")) {
        return None;
    }
    let mut used = 2;
    if tokens.get(used).is_some_and(Token::is_number)
        && tokens.get(used + 1).is_some_and(|t| t.is("mile"))
    {
        used += 2;
    }
    while used < tokens.len().min(8) {
        let token = &tokens[used];
        if !token.is_word() || lexicon.is_boundary_keyword(&token.text.to_lowercase()) {
            break;
        }
        used += 1;
    }
    Some((ParamValue::Text(format!("{clock} oclock")), used))
}

fn parse_speed_until(tokens: &[Token], aircraft: &Aircraft) -> Option<(ParamValue, usize)> {
    if !tokens.first().is_some_and(|t| t.is("until")) {
        return None;
    }
    if let Some(n) = tokens.get(1).and_then(Token::number)
        && tokens.get(2).is_some_and(|t| t.is("mile"))
        && tokens.get(3).is_some_and(|t| t.is("final"))
    {
        return Some((ParamValue::Until(format!("U{n}MF")), 4));
    }
    if let Some((fix, used)) = parse_fix(&tokens[1..], aircraft) {
        return Some((ParamValue::Until(format!("U{fix}")), 1 + used));
    }
    None
}

fn parse_contact(tokens: &[Token]) -> Option<(ParamValue, usize)> {
    let facility = ContactFacility::from_word(&tokens.first()?.text.to_lowercase())?;
    let mut digits = String::new();
    let mut used = 1;
    while let Some(token) = tokens.get(used) {
        if token.is_number() {
            digits.push_str(&token.text);
            used += 1;
        } else if token.is("point") && !digits.is_empty() && !digits.contains('.') {
            digits.push('.');
            used += 1;
        } else {
            break;
        }
    }
    let frequency = digits
        .split('.')
        .next()
        .and_then(|whole| whole.parse::<u32>().ok())
        .filter(|mhz| (118..=136).contains(mhz))
        .map(|_| digits.clone());
    if frequency.is_none() {
        // The digits were not a frequency; leave them for the next command.
        used = 1;
    }
    Some((ParamValue::Contact { facility, frequency }, used))
}
