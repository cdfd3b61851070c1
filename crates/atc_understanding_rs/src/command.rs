//! Command template engine
//!
//! Templates are parsed from a small DSL at registration time: literals,
//! `a|b|c` alternatives, `[...]` optional groups and `{type}` placeholders
//! wired to the typed parsers in `params`. Evaluation walks the
//! post-callsign tail left to right; at every position all templates are
//! tried in priority order and the best attempt emits its handler's
//! canonical code. Literal matching tolerates a bounded slack of noise
//! tokens but never searches across a command-boundary keyword.

use aviation_helper_rs::aircraft::Aircraft;
use std::sync::LazyLock;

use crate::errors::Error;
use crate::lexicon::Lexicon;
use crate::metrics::{jaro_winkler, phonetic_match};
use crate::params::{ParamKind, ParamValue, parse_param};
use crate::tokenizer::Token;

/// Noise tokens a literal may scan past.
const LITERAL_SLACK: usize = 2;

#[derive(Debug, Clone)]
enum Element {
    Literal(Vec<String>),
    Param(ParamKind),
    Optional(Vec<Element>),
}

/// Handler set as a tagged variant: one variant per arity the registered
/// command table actually uses. Optional-group parameters arrive as `None`.
#[derive(Clone, Copy)]
pub enum Handler {
    Nullary(fn(&Aircraft) -> Option<String>),
    Unary(fn(&Aircraft, Option<&ParamValue>) -> Option<String>),
    Binary(fn(&Aircraft, Option<&ParamValue>, Option<&ParamValue>) -> Option<String>),
}

impl Handler {
    fn arity(self) -> usize {
        match self {
            Handler::Nullary(_) => 0,
            Handler::Unary(_) => 1,
            Handler::Binary(_) => 2,
        }
    }

    fn call(self, aircraft: &Aircraft, args: &[Option<ParamValue>]) -> Option<String> {
        match self {
            Handler::Nullary(f) => f(aircraft),
            Handler::Unary(f) => f(aircraft, args.first().and_then(Option::as_ref)),
            Handler::Binary(f) => f(
                aircraft,
                args.first().and_then(Option::as_ref),
                args.get(1).and_then(Option::as_ref),
            ),
        }
    }
}

pub struct CommandTemplate {
    name: &'static str,
    priority: i32,
    elements: Vec<Element>,
    say_again: Option<&'static str>,
    handler: Handler,
    then_handler: Option<Handler>,
}

impl CommandTemplate {
    /// Parse and validate a template. Panics on a malformed template or an
    /// arity mismatch with the handler; registration is startup-time and
    /// these are developer errors.
    pub fn new(name: &'static str, template: &str, priority: i32, handler: Handler) -> Self {
        let elements = parse_template(name, template);
        let arity = count_params(&elements);
        if arity != handler.arity() {
            panic!(
                "template {name}: {arity} typed placeholders but handler takes {}",
                handler.arity()
            );
        }
        Self {
            name,
            priority,
            elements,
            say_again: None,
            handler,
            then_handler: None,
        }
    }

    /// Emit "SAYAGAIN/<what>" instead of discarding when the literals
    /// matched but a typed parser failed.
    pub fn say_again(mut self, what: &'static str) -> Self {
        self.say_again = Some(what);
        self
    }

    /// Alternate handler for commands sequenced after a "then" token.
    pub fn then(mut self, handler: Handler) -> Self {
        if handler.arity() != self.handler.arity() {
            panic!("template {}: then-handler arity mismatch", self.name);
        }
        self.then_handler = Some(handler);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn try_match(&self, lexicon: &Lexicon, tokens: &[Token], aircraft: &Aircraft) -> MatchOutcome {
        match match_sequence(&self.elements, lexicon, tokens, aircraft, 0) {
            Ok(state) if state.pos > 0 => MatchOutcome::Matched(Attempt {
                consumed: state.pos,
                args: state.args,
                slack: state.slack,
            }),
            Ok(_) => MatchOutcome::NoMatch,
            Err(Fail::Param { literals }) if literals > 0 => MatchOutcome::ParamFailed,
            Err(_) => MatchOutcome::NoMatch,
        }
    }
}

struct Attempt {
    consumed: usize,
    args: Vec<Option<ParamValue>>,
    slack: usize,
}

enum MatchOutcome {
    Matched(Attempt),
    /// Literal portion matched, a typed parser did not.
    ParamFailed,
    NoMatch,
}

struct SequenceState {
    pos: usize,
    args: Vec<Option<ParamValue>>,
    literals: usize,
    slack: usize,
}

enum Fail {
    Literal,
    Param { literals: usize },
}

fn parse_template(name: &str, template: &str) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut group: Option<Vec<Element>> = None;
    for part in template.split_whitespace() {
        let mut part = part;
        let opens = part.starts_with('[');
        if opens {
            if group.is_some() {
                panic!("template {name}: nested optional groups");
            }
            group = Some(Vec::new());
            part = &part[1..];
        }
        let closes = part.ends_with(']');
        if closes {
            part = &part[..part.len() - 1];
        }
        let element = if let Some(inner) = part.strip_prefix('{') {
            let inner = inner
                .strip_suffix('}')
                .unwrap_or_else(|| panic!("template {name}: malformed placeholder {part:?}"));
            let kind = ParamKind::parse_name(inner)
                .unwrap_or_else(|| panic!("template {name}: unknown parameter type {inner:?}"));
            Element::Param(kind)
        } else if part.is_empty() {
            panic!("template {name}: empty element");
        } else {
            Element::Literal(part.split('|').map(str::to_lowercase).collect())
        };
        match group.as_mut() {
            Some(inner) => inner.push(element),
            None => elements.push(element),
        }
        if closes {
            let inner = group
                .take()
                .unwrap_or_else(|| panic!("template {name}: unmatched ']'"));
            elements.push(Element::Optional(inner));
        }
    }
    if group.is_some() {
        panic!("template {name}: unterminated optional group");
    }
    if elements.is_empty() {
        panic!("template {name}: empty template");
    }
    elements
}

fn count_params(elements: &[Element]) -> usize {
    elements
        .iter()
        .map(|e| match e {
            Element::Param(_) => 1,
            Element::Optional(inner) => count_params(inner),
            Element::Literal(_) => 0,
        })
        .sum()
}

/// Find a literal within the slack window. Slack stops at command-boundary
/// keywords (unless the boundary word is the literal itself) and at end of
/// input. Returns the position after the match and the slack used.
fn match_literal(
    lexicon: &Lexicon,
    tokens: &[Token],
    pos: usize,
    alternatives: &[String],
) -> Option<(usize, usize)> {
    for j in pos..tokens.len().min(pos + LITERAL_SLACK + 1) {
        let text = tokens[j].text.to_lowercase();
        let hit = tokens[j].is_word()
            && alternatives.iter().any(|alt| {
                text == *alt
                    || jaro_winkler(&text, alt) >= 0.85
                    || phonetic_match(lexicon, &text, alt)
            });
        if hit {
            return Some((j + 1, j - pos));
        }
        if lexicon.is_boundary_keyword(&text) {
            return None;
        }
    }
    None
}

fn match_sequence(
    elements: &[Element],
    lexicon: &Lexicon,
    tokens: &[Token],
    aircraft: &Aircraft,
    start: usize,
) -> Result<SequenceState, Fail> {
    let mut state = SequenceState {
        pos: start,
        args: Vec::new(),
        literals: 0,
        slack: 0,
    };
    for element in elements {
        match element {
            Element::Literal(alternatives) => {
                match match_literal(lexicon, tokens, state.pos, alternatives) {
                    Some((pos, slack)) => {
                        state.pos = pos;
                        state.slack += slack;
                        state.literals += 1;
                    }
                    None => return Err(Fail::Literal),
                }
            }
            Element::Param(kind) => {
                match parse_param(*kind, lexicon, &tokens[state.pos.min(tokens.len())..], aircraft)
                {
                    Some((value, used)) => {
                        state.args.push(Some(value));
                        state.pos += used;
                    }
                    None => {
                        return Err(Fail::Param {
                            literals: state.literals,
                        });
                    }
                }
            }
            Element::Optional(inner) => {
                match match_sequence(inner, lexicon, tokens, aircraft, state.pos) {
                    Ok(matched) => {
                        state.pos = matched.pos;
                        state.args.extend(matched.args);
                        state.literals += matched.literals;
                        state.slack += matched.slack;
                    }
                    // Absent group: all of its parameters bind to null.
                    Err(_) => state.args.extend(vec![None; count_params(inner)]),
                }
            }
        }
    }
    Ok(state)
}

pub struct CommandRegistry {
    templates: Vec<CommandTemplate>,
}

static REGISTRY: LazyLock<CommandRegistry> =
    LazyLock::new(crate::registry::standard_command_templates);

impl CommandRegistry {
    /// Process-wide registry, built once and sealed.
    pub fn global() -> &'static CommandRegistry {
        &REGISTRY
    }

    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
        }
    }

    pub fn register(&mut self, template: CommandTemplate) {
        self.templates.push(template);
        self.templates
            .sort_by(|a, b| b.priority.cmp(&a.priority).then(a.name.cmp(b.name)));
    }

    pub fn templates(&self) -> impl Iterator<Item = &CommandTemplate> {
        self.templates.iter()
    }

    /// Resolve the tail into a sequence of canonical command codes.
    pub fn run(
        &self,
        lexicon: &Lexicon,
        tail: &[Token],
        aircraft: &Aircraft,
    ) -> Result<Vec<String>, Error> {
        let mut codes = Vec::new();
        let mut matched_any = false;
        let mut sequenced = false;
        let mut pos = 0;
        while pos < tail.len() {
            let token = &tail[pos];
            if token.is("then") {
                sequenced = true;
                pos += 1;
                continue;
            }
            if token.is_word() && lexicon.is_filler(&token.text.to_lowercase()) {
                pos += 1;
                continue;
            }

            let mut best: Option<(&CommandTemplate, Attempt)> = None;
            let mut say_again: Option<&'static str> = None;
            for template in &self.templates {
                match template.try_match(lexicon, &tail[pos..], aircraft) {
                    MatchOutcome::Matched(attempt) => {
                        let better = match &best {
                            None => true,
                            // Registration order is priority-descending, so
                            // a later template only wins on equal priority
                            // by consuming more with less slack.
                            Some((current, held)) => {
                                template.priority == current.priority
                                    && (attempt.consumed > held.consumed
                                        || (attempt.consumed == held.consumed
                                            && attempt.slack < held.slack))
                            }
                        };
                        if better {
                            best = Some((template, attempt));
                        }
                    }
                    MatchOutcome::ParamFailed => {
                        if say_again.is_none()
                            && let Some(what) = template.say_again
                        {
                            say_again = Some(what);
                        }
                    }
                    MatchOutcome::NoMatch => {}
                }
            }

            if let Some((template, attempt)) = best {
                matched_any = true;
                let handler = if sequenced {
                    template.then_handler.unwrap_or(template.handler)
                } else {
                    template.handler
                };
                match handler.call(aircraft, &attempt.args) {
                    // An empty code is a recognized no-op ("radar contact").
                    Some(code) if code.is_empty() => {}
                    Some(code) => {
                        log::debug!("command {} -> {code}", template.name);
                        codes.push(code);
                    }
                    None => {
                        if let Some(what) = template.say_again {
                            codes.push(format!("SAYAGAIN/{what}"));
                        }
                    }
                }
                pos += attempt.consumed.max(1);
                sequenced = false;
            } else if let Some(what) = say_again {
                matched_any = true;
                codes.push(format!("SAYAGAIN/{what}"));
                // Swallow the garbled region up to the next command start.
                pos += 1;
                while pos < tail.len()
                    && !lexicon.is_boundary_keyword(&tail[pos].text.to_lowercase())
                {
                    pos += 1;
                }
                sequenced = false;
            } else {
                pos += 1;
            }
        }
        if !matched_any {
            return Err(Error::NoCommand);
        }
        Ok(codes)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the post-callsign tail with the process-wide registry.
pub fn parse_commands(tail: &[Token], aircraft: &Aircraft) -> Result<Vec<String>, Error> {
    parse_commands_with(CommandRegistry::global(), Lexicon::global(), tail, aircraft)
}

pub fn parse_commands_with(
    registry: &CommandRegistry,
    lexicon: &Lexicon,
    tail: &[Token],
    aircraft: &Aircraft,
) -> Result<Vec<String>, Error> {
    registry.run(lexicon, tail, aircraft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::tokenizer::tokenize;

    fn aircraft() -> Aircraft {
        let mut ac = Aircraft::new("AAL5936");
        ac.altitude = 12000;
        ac.fixes.insert("kiley".to_string(), "KILEY".to_string());
        ac.fixes.insert("kennedy".to_string(), "KJFK".to_string());
        ac.candidate_approaches
            .insert("ils runway 27 right".to_string(), "I27R".to_string());
        ac.candidate_approaches
            .insert("visual runway 22 left".to_string(), "V22L".to_string());
        ac.sid = Some("SERFR".to_string());
        ac.star = Some("KORRY".to_string());
        ac
    }

    fn run(text: &str) -> Result<Vec<String>, Error> {
        let tokens = tokenize(&normalize(text));
        parse_commands(&tokens, &aircraft())
    }

    #[test]
    fn altitude_commands() {
        assert_eq!(run("descend and maintain one zero thousand").unwrap(), ["D10000"]);
        assert_eq!(run("climb maintain flight level three five zero").unwrap(), ["C35000"]);
        // Plain "maintain" picks the direction from the current altitude.
        assert_eq!(run("maintain one zero thousand").unwrap(), ["D10000"]);
        assert_eq!(run("maintain flight level one eight zero").unwrap(), ["C18000"]);
    }

    #[test]
    fn heading_commands() {
        assert_eq!(run("turn right heading two seven zero").unwrap(), ["R270"]);
        assert_eq!(run("turn left heading zero nine zero").unwrap(), ["L090"]);
        assert_eq!(run("fly heading one eight zero").unwrap(), ["H180"]);
        assert_eq!(run("turn left ten degrees").unwrap(), ["T10L"]);
        assert_eq!(run("ten degrees right").unwrap(), ["T10R"]);
    }

    #[test]
    fn direct_and_approach_commands() {
        assert_eq!(run("cleared direct KILEY").unwrap(), ["DKILEY"]);
        assert_eq!(run("proceed direct kennedy").unwrap(), ["DKJFK"]);
        assert_eq!(
            run("cleared i l s runway two seven right approach").unwrap(),
            ["CI27R"]
        );
        assert_eq!(
            run("expect the ILS runway two seven right approach").unwrap(),
            ["EI27R"]
        );
    }

    #[test]
    fn unresolvable_approach_asks_for_a_repeat() {
        let mut ac = aircraft();
        ac.candidate_approaches.clear();
        let tokens = tokenize(&normalize("expect the ILS runway two seven right approach"));
        assert_eq!(
            parse_commands(&tokens, &ac).unwrap(),
            ["SAYAGAIN/APPROACH"]
        );
    }

    #[test]
    fn speed_commands() {
        assert_eq!(run("reduce speed one eight zero").unwrap(), ["S180"]);
        assert_eq!(
            run("reduce speed to one eight zero knots until five mile final").unwrap(),
            ["S180/U5MF"]
        );
        assert_eq!(run("maintain two five zero knots").unwrap(), ["S250"]);
    }

    #[test]
    fn transponder_and_frequency_commands() {
        assert_eq!(run("squawk one two three four").unwrap(), ["SQ1234"]);
        assert_eq!(run("squawk vfr").unwrap(), Vec::<String>::new());
        assert_eq!(run("ident").unwrap(), ["ID"]);
        assert_eq!(run("contact tower").unwrap(), ["TO"]);
        assert_eq!(
            run("contact departure one two four point three").unwrap(),
            ["CD"]
        );
        assert_eq!(run("frequency change approved").unwrap(), ["FC"]);
    }

    #[test]
    fn no_op_commands_are_dropped_not_errors() {
        assert_eq!(run("radar contact").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn procedure_commands() {
        assert_eq!(run("climb via the SERFR departure").unwrap(), ["CVS"]);
        assert_eq!(run("descend via the KORRY arrival").unwrap(), ["DVS"]);
        assert_eq!(run("go around").unwrap(), ["GA"]);
        assert_eq!(run("cancel approach clearance").unwrap(), ["CAC"]);
        assert_eq!(run("intercept localizer").unwrap(), ["IL"]);
    }

    #[test]
    fn atis_and_hold() {
        assert_eq!(run("information alpha").unwrap(), ["ATIS/A"]);
        assert_eq!(run("hold KILEY as published").unwrap(), ["HOLD/KILEY"]);
    }

    #[test]
    fn sequenced_commands_share_one_addressing() {
        assert_eq!(
            run("climb maintain flight level three five zero then turn right heading two seven zero")
                .unwrap(),
            ["C35000", "H270"]
        );
    }

    #[test]
    fn multiple_commands_resolve_in_order() {
        assert_eq!(
            run("turn right heading two seven zero descend and maintain one zero thousand")
                .unwrap(),
            ["R270", "D10000"]
        );
    }

    #[test]
    fn gibberish_is_no_command() {
        assert_eq!(run("good morning big jet"), Err(Error::NoCommand));
    }

    #[test]
    fn consumed_regions_never_overlap() {
        // Two commands over one tail: each code's region is disjoint, so
        // re-running on the remainder after the first match yields the rest.
        let tokens = tokenize(&normalize(
            "turn left heading zero nine zero reduce speed one eight zero",
        ));
        let codes = parse_commands(&tokens, &aircraft()).unwrap();
        assert_eq!(codes, ["L090", "S180"]);
    }
}
