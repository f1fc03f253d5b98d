//! Grapheme-to-phoneme engines.
//!
//! Engines return the raw symbol stream: each word's ARPAbet phonemes, a `" "`
//! token between words, and punctuation marks as their own tokens. Filtering
//! happens in [`converter`](crate::phoneme::converter).

use crate::config::G2pConfig;
use crate::error::{PhonoscopeError, Result};
use crate::phoneme::lexicon::{Lexicon, ensure_lexicon};
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for text to phoneme conversion.
pub trait GraphemeToPhoneme: Send + Sync {
    /// Convert text to an unfiltered symbol stream.
    fn phonemize(&self, text: &str) -> Result<Vec<String>>;

    /// Short engine name for log events.
    fn name(&self) -> &str;
}

impl<T: GraphemeToPhoneme + ?Sized> GraphemeToPhoneme for Arc<T> {
    fn phonemize(&self, text: &str) -> Result<Vec<String>> {
        (**self).phonemize(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Punctuation kept as tokens by the tokenizer.
const PUNCTUATION: [char; 4] = ['.', ',', '?', '!'];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Mark(char),
}

/// Dictionary-backed engine with a letter-rule fallback for unknown words.
#[derive(Debug, Clone)]
pub struct LexiconG2p {
    lexicon: Lexicon,
}

impl LexiconG2p {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Fetch the dictionary if needed, then load it.
    pub fn from_config(config: &G2pConfig) -> Result<Self> {
        let path = ensure_lexicon(config, false)?;
        Ok(Self::new(Lexicon::load(&path)?))
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn pronounce(&self, word: &str) -> Vec<String> {
        if let Some(phonemes) = self.lexicon.lookup(word) {
            return phonemes.to_vec();
        }

        // Hyphenated compounds are tried piecewise before falling back.
        if word.contains('-') {
            let parts: Vec<&str> = word.split('-').filter(|p| !p.is_empty()).collect();
            if parts.len() > 1 && parts.iter().all(|p| self.lexicon.lookup(p).is_some()) {
                return parts
                    .iter()
                    .flat_map(|p| self.lexicon.lookup(p).unwrap_or_default().to_vec())
                    .collect();
            }
        }

        tracing::warn!(word, "word not in lexicon, using letter rules");
        letter_to_sound(word)
    }
}

impl GraphemeToPhoneme for LexiconG2p {
    fn phonemize(&self, text: &str) -> Result<Vec<String>> {
        let tokens = tokenize(text);
        let mut symbols = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                symbols.push(" ".to_string());
            }
            match token {
                Token::Word(word) => symbols.extend(self.pronounce(word)),
                Token::Mark(mark) => symbols.push(mark.to_string()),
            }
        }

        Ok(symbols)
    }

    fn name(&self) -> &str {
        "cmudict"
    }
}

/// Lowercase, spell out digits, drop unsupported characters and split into
/// words and punctuation marks.
fn tokenize(text: &str) -> Vec<Token> {
    let expanded = spell_numbers(&text.to_lowercase());

    let mut tokens = Vec::new();
    let mut word = String::new();

    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        let trimmed = word.trim_matches(|c: char| c == '-' || c == '\'');
        if trimmed.chars().any(|c| c.is_ascii_lowercase()) {
            tokens.push(Token::Word(trimmed.to_string()));
        }
        word.clear();
    };

    for c in expanded.chars() {
        match c {
            'a'..='z' | '\'' | '-' => word.push(c),
            c if PUNCTUATION.contains(&c) => {
                flush(&mut word, &mut tokens);
                tokens.push(Token::Mark(c));
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            _ => {}
        }
    }
    flush(&mut word, &mut tokens);

    tokens
}

/// Replace every run of ASCII digits with its English words.
fn spell_numbers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut digits = String::new();

    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if !digits.is_empty() {
            match digits.parse::<u64>() {
                Ok(n) => {
                    out.push(' ');
                    out.push_str(&number_to_words(n));
                    out.push(' ');
                }
                // Too long to be a quantity; read digit by digit.
                Err(_) => {
                    for d in digits.chars() {
                        out.push(' ');
                        out.push_str(ONES[d as usize - '0' as usize]);
                    }
                    out.push(' ');
                }
            }
            digits.clear();
        }
        out.push(c);
    }
    out.pop();
    out
}

const ONES: [&str; 20] = [
    "zero",
    "one",
    "two",
    "three",
    "four",
    "five",
    "six",
    "seven",
    "eight",
    "nine",
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];

const TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const SCALES: [(u64, &str); 4] = [
    (1_000_000_000_000, "trillion"),
    (1_000_000_000, "billion"),
    (1_000_000, "million"),
    (1_000, "thousand"),
];

fn number_to_words(n: u64) -> String {
    if n < 20 {
        return ONES[n as usize].to_string();
    }
    if n < 100 {
        let tens = TENS[(n / 10) as usize];
        return match n % 10 {
            0 => tens.to_string(),
            ones => format!("{tens} {}", ONES[ones as usize]),
        };
    }
    if n < 1000 {
        let head = format!("{} hundred", ONES[(n / 100) as usize]);
        return match n % 100 {
            0 => head,
            rest => format!("{head} {}", number_to_words(rest)),
        };
    }
    for (scale, name) in SCALES {
        if n >= scale {
            let head = format!("{} {name}", number_to_words(n / scale));
            return match n % scale {
                0 => head,
                rest => format!("{head} {}", number_to_words(rest)),
            };
        }
    }
    // Values at or above 1000 always match a scale above.
    n.to_string()
}

/// Grapheme rules, longest spellings first.
const LETTER_RULES: &[(&str, &[&str])] = &[
    ("tch", &["CH"]),
    ("igh", &["AY"]),
    ("ch", &["CH"]),
    ("sh", &["SH"]),
    ("th", &["TH"]),
    ("ph", &["F"]),
    ("wh", &["W"]),
    ("ck", &["K"]),
    ("ng", &["NG"]),
    ("qu", &["K", "W"]),
    ("ee", &["IY"]),
    ("ea", &["IY"]),
    ("oo", &["UW"]),
    ("ai", &["EY"]),
    ("ay", &["EY"]),
    ("oa", &["OW"]),
    ("ow", &["OW"]),
    ("ou", &["AW"]),
    ("oi", &["OY"]),
    ("oy", &["OY"]),
    ("au", &["AO"]),
    ("aw", &["AO"]),
    ("er", &["ER"]),
    ("a", &["AE"]),
    ("b", &["B"]),
    ("c", &["K"]),
    ("d", &["D"]),
    ("e", &["EH"]),
    ("f", &["F"]),
    ("g", &["G"]),
    ("h", &["HH"]),
    ("i", &["IH"]),
    ("j", &["JH"]),
    ("k", &["K"]),
    ("l", &["L"]),
    ("m", &["M"]),
    ("n", &["N"]),
    ("o", &["AA"]),
    ("p", &["P"]),
    ("q", &["K"]),
    ("r", &["R"]),
    ("s", &["S"]),
    ("t", &["T"]),
    ("u", &["AH"]),
    ("v", &["V"]),
    ("w", &["W"]),
    ("x", &["K", "S"]),
    ("y", &["IY"]),
    ("z", &["Z"]),
];

const VOWELS: [&str; 15] = [
    "AA", "AE", "AH", "AO", "AW", "AY", "EH", "ER", "EY", "IH", "IY", "OW", "OY", "UH", "UW",
];

fn is_vowel_letter(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u')
}

/// Approximate pronunciation of a word from its spelling.
///
/// Deterministic: the first vowel carries primary stress, later vowels none.
pub fn letter_to_sound(word: &str) -> Vec<String> {
    let letters: Vec<u8> = word
        .bytes()
        .filter(|b| b.is_ascii_lowercase())
        .collect();
    let mut phonemes: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < letters.len() {
        let c = letters[i];

        if c == b'y' && i == 0 {
            phonemes.push("Y");
            i += 1;
            continue;
        }
        // Silent final e after a consonant.
        if c == b'e'
            && i == letters.len() - 1
            && letters.len() > 2
            && !is_vowel_letter(letters[i - 1])
        {
            break;
        }
        // Doubled consonants sound once.
        if i > 0 && letters[i - 1] == c && !is_vowel_letter(c) {
            i += 1;
            continue;
        }

        let rest = &letters[i..];
        let rule = LETTER_RULES
            .iter()
            .find(|(spelling, _)| rest.starts_with(spelling.as_bytes()));
        match rule {
            Some((spelling, sounds)) => {
                phonemes.extend_from_slice(sounds);
                i += spelling.len();
            }
            None => i += 1,
        }
    }

    let mut stressed = false;
    phonemes
        .into_iter()
        .map(|p| {
            if VOWELS.contains(&p) {
                let stress = if stressed { "0" } else { "1" };
                stressed = true;
                format!("{p}{stress}")
            } else {
                p.to_string()
            }
        })
        .collect()
}

/// Mock engine for testing.
///
/// Returns scripted output for known texts. Other text is split on
/// whitespace and each word becomes one upper-case symbol, with `" "`
/// between words.
#[derive(Debug, Clone, Default)]
pub struct MockG2p {
    responses: HashMap<String, Vec<String>>,
    should_fail: bool,
}

impl MockG2p {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the symbols returned for `text`.
    pub fn with_response(mut self, text: &str, symbols: &[&str]) -> Self {
        self.responses.insert(
            text.to_string(),
            symbols.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Configure the mock to fail on every call
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl GraphemeToPhoneme for MockG2p {
    fn phonemize(&self, text: &str) -> Result<Vec<String>> {
        if self.should_fail {
            return Err(PhonoscopeError::conversion("mock conversion failure"));
        }
        if let Some(symbols) = self.responses.get(text) {
            return Ok(symbols.clone());
        }

        let mut symbols = Vec::new();
        for (i, word) in text.split_whitespace().enumerate() {
            if i > 0 {
                symbols.push(" ".to_string());
            }
            symbols.push(word.to_uppercase());
        }
        Ok(symbols)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> LexiconG2p {
        LexiconG2p::new(Lexicon::parse(
            "cat K AE1 T\nsat S AE1 T\nthe DH AH0\nwell W EH1 L\nknown N OW1 N\n\
             two T UW1\nhundred HH AH1 N D R AH0 D\nforty F AO1 R T IY0\n",
        ))
    }

    #[test]
    fn phonemize_separates_words_with_space_token() {
        let symbols = engine().phonemize("cat sat").unwrap();
        assert_eq!(symbols, ["K", "AE1", "T", " ", "S", "AE1", "T"]);
    }

    #[test]
    fn phonemize_keeps_punctuation_tokens() {
        let symbols = engine().phonemize("The cat, sat!").unwrap();
        assert_eq!(
            symbols,
            ["DH", "AH0", " ", "K", "AE1", "T", " ", ",", " ", "S", "AE1", "T", " ", "!"]
        );
    }

    #[test]
    fn phonemize_drops_unsupported_characters() {
        let symbols = engine().phonemize("\"cat\" (sat);").unwrap();
        assert_eq!(symbols, ["K", "AE1", "T", " ", "S", "AE1", "T"]);
    }

    #[test]
    fn phonemize_hyphenated_compound() {
        let symbols = engine().phonemize("well-known").unwrap();
        assert_eq!(symbols, ["W", "EH1", "L", "N", "OW1", "N"]);
    }

    #[test]
    fn phonemize_spells_numbers() {
        let symbols = engine().phonemize("242").unwrap();
        assert_eq!(
            symbols,
            [
                "T", "UW1", " ", "HH", "AH1", "N", "D", "R", "AH0", "D", " ", "F", "AO1", "R",
                "T", "IY0", " ", "T", "UW1"
            ]
        );
    }

    #[test]
    fn phonemize_empty_text() {
        assert!(engine().phonemize("").unwrap().is_empty());
        assert!(engine().phonemize("  ;; ").unwrap().is_empty());
    }

    #[test]
    fn unknown_word_uses_letter_rules() {
        let symbols = engine().phonemize("blick").unwrap();
        assert_eq!(symbols, ["B", "L", "IH1", "K"]);
    }

    #[test]
    fn letter_rules_examples() {
        assert_eq!(letter_to_sound("ship"), ["SH", "IH1", "P"]);
        assert_eq!(letter_to_sound("made"), ["M", "AE1", "D"]);
        assert_eq!(letter_to_sound("yell"), ["Y", "EH1", "L"]);
        assert_eq!(letter_to_sound("night"), ["N", "AY1", "T"]);
        assert_eq!(letter_to_sound("taxi"), ["T", "AE1", "K", "S", "IH0"]);
        assert!(letter_to_sound("").is_empty());
    }

    #[test]
    fn number_words() {
        assert_eq!(number_to_words(0), "zero");
        assert_eq!(number_to_words(15), "fifteen");
        assert_eq!(number_to_words(40), "forty");
        assert_eq!(number_to_words(101), "one hundred one");
        assert_eq!(number_to_words(2024), "two thousand twenty four");
        assert_eq!(number_to_words(3_000_000), "three million");
    }

    #[test]
    fn mock_scripted_and_default_output() {
        let mock = MockG2p::new().with_response("hi", &["HH", "AY1"]);

        assert_eq!(mock.phonemize("hi").unwrap(), ["HH", "AY1"]);
        assert_eq!(mock.phonemize("a b").unwrap(), ["A", " ", "B"]);
    }

    #[test]
    fn mock_failure_is_conversion_error() {
        let result = MockG2p::new().with_failure().phonemize("anything");
        assert!(matches!(result, Err(PhonoscopeError::Conversion { .. })));
    }

    #[test]
    fn engine_is_object_safe() {
        let shared: Arc<dyn GraphemeToPhoneme> = Arc::new(engine());
        assert_eq!(shared.name(), "cmudict");
        assert_eq!(shared.phonemize("cat").unwrap(), ["K", "AE1", "T"]);
    }
}
