//! Promotes normalized words to typed tokens.
//!
//! Digit strings become numbers, numeric altitude phrases collapse into a
//! single token carrying feet, uppercase identifiers become ICAO tokens and
//! single letters keep their letter. Everything else stays a plain word.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    Word,
    Number(u32),
    /// Altitude in feet.
    Altitude(u32),
    Icao,
    Letter(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn word(text: impl Into<String>) -> Self {
        Token {
            text: text.into(),
            kind: TokenKind::Word,
        }
    }

    pub fn number(&self) -> Option<u32> {
        match self.kind {
            TokenKind::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn altitude(&self) -> Option<u32> {
        match self.kind {
            TokenKind::Altitude(feet) => Some(feet),
            _ => None,
        }
    }

    pub fn letter(&self) -> Option<char> {
        match self.kind {
            TokenKind::Letter(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self.kind, TokenKind::Number(_))
    }

    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Word)
    }

    /// Case-insensitive text comparison.
    pub fn is(&self, word: &str) -> bool {
        self.text.eq_ignore_ascii_case(word)
    }
}

pub fn tokenize(words: &[String]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        let word = words[i].as_str();

        // "flight level 350" / "flight level 3 5 0"
        if word == "flight" && words.get(i + 1).map(String::as_str) == Some("level") {
            let mut digits = String::new();
            let mut used = 0;
            while digits.len() < 3 {
                match words.get(i + 2 + used) {
                    Some(w) if is_digit_string(w) => {
                        digits.push_str(w);
                        used += 1;
                    }
                    _ => break,
                }
            }
            if let Ok(level) = digits.parse::<u32>()
                && used > 0
                && (10..=600).contains(&level)
            {
                let feet = level * 100;
                tokens.push(Token {
                    text: feet.to_string(),
                    kind: TokenKind::Altitude(feet),
                });
                i += 2 + used;
                continue;
            }
        }

        if is_digit_string(word) {
            if let Some(consumed) = collapse_thousands(words, i, &mut tokens) {
                i = consumed;
                continue;
            }
            let value = word.parse::<u32>().unwrap_or(u32::MAX);
            tokens.push(Token {
                text: word.to_string(),
                kind: TokenKind::Number(value),
            });
            i += 1;
            continue;
        }

        let kind = if word.len() == 1 && word.chars().all(|c| c.is_ascii_alphabetic()) {
            TokenKind::Letter(word.chars().next().unwrap().to_ascii_lowercase())
        } else if word.len() >= 2 && word.chars().all(|c| c.is_ascii_uppercase()) {
            TokenKind::Icao
        } else {
            TokenKind::Word
        };
        tokens.push(Token {
            text: word.to_string(),
            kind,
        });
        i += 1;
    }
    tokens
}

/// "<digits> thousand [<digit> hundred]" starting at `i`. Only the maximal
/// digit-run suffix that still reads as a sane thousands count (1..=60)
/// joins the altitude; leading digits stay numbers ("3 20 4 thousand" keeps
/// the A320 type mention intact). Returns the index after the consumed
/// region, pushing tokens as it goes.
fn collapse_thousands(words: &[String], i: usize, tokens: &mut Vec<Token>) -> Option<usize> {
    let mut run_end = i;
    while run_end < words.len() && is_digit_string(&words[run_end]) {
        run_end += 1;
    }
    if !matches!(
        words.get(run_end).map(String::as_str),
        Some("thousand") | Some("thousandth")
    ) {
        return None;
    }
    let mut chosen = None;
    for start in i..run_end {
        let concat: String = words[start..run_end].concat();
        if concat.len() <= 2
            && let Ok(n) = concat.parse::<u32>()
            && (1..=60).contains(&n)
        {
            chosen = Some((start, n));
            break;
        }
    }
    let (start, thousands) = chosen?;
    for leading in &words[i..start] {
        tokens.push(Token {
            text: leading.clone(),
            kind: TokenKind::Number(leading.parse().unwrap_or(u32::MAX)),
        });
    }
    let mut feet = thousands * 1000;
    let mut next = run_end + 1;
    // "... 5 hundred"
    if let Some(h) = words.get(next).filter(|w| is_digit_string(w))
        && let Ok(hundreds) = h.parse::<u32>()
        && (1..=9).contains(&hundreds)
        && words.get(next + 1).map(String::as_str) == Some("hundred")
    {
        feet += hundreds * 100;
        next += 2;
    }
    tokens.push(Token {
        text: feet.to_string(),
        kind: TokenKind::Altitude(feet),
    });
    Some(next)
}

fn is_digit_string(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<Token> {
        tokenize(&words.iter().map(|w| w.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn digit_runs_before_thousand_collapse() {
        let tokens = toks(&["descend", "maintain", "1", "0", "thousand"]);
        assert_eq!(tokens[2].kind, TokenKind::Altitude(10000));
        assert_eq!(tokens[2].text, "10000");
    }

    #[test]
    fn thousand_and_hundred_combine() {
        let tokens = toks(&["4", "thousand", "5", "hundred"]);
        assert_eq!(tokens, vec![Token {
            text: "4500".to_string(),
            kind: TokenKind::Altitude(4500),
        }]);
    }

    #[test]
    fn flight_level_collapses() {
        let tokens = toks(&["flight", "level", "3", "5", "0"]);
        assert_eq!(tokens[0].kind, TokenKind::Altitude(35000));
        let tokens = toks(&["flight", "level", "240"]);
        assert_eq!(tokens[0].kind, TokenKind::Altitude(24000));
    }

    #[test]
    fn type_mention_stays_out_of_the_altitude() {
        let tokens = toks(&["3", "20", "4", "thousand"]);
        assert_eq!(tokens[0].kind, TokenKind::Number(3));
        assert_eq!(tokens[1].kind, TokenKind::Number(20));
        assert_eq!(tokens[2].kind, TokenKind::Altitude(4000));
    }

    #[test]
    fn words_letters_and_icao() {
        let tokens = toks(&["cleared", "direct", "KILEY", "n"]);
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[2].kind, TokenKind::Icao);
        assert_eq!(tokens[3].kind, TokenKind::Letter('n'));
    }

    #[test]
    fn plain_numbers_keep_their_value() {
        let tokens = toks(&["2", "7", "0"]);
        assert_eq!(
            tokens.iter().map(|t| t.number().unwrap()).collect::<Vec<_>>(),
            [2, 7, 0]
        );
        assert_eq!(tokens[2].text, "0");
    }
}
