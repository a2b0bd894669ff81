//! Keyword-based interpreters used when no smarter validator is plugged in.

use crate::traits::interpreter::ExitIntent;

/// Lowercase, strip accents and punctuation, collapse whitespace.
///
/// The result is padded with one space on each side so phrases can be
/// matched on word boundaries with a plain `contains`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    let mut last_space = true;
    for ch in text.chars().flat_map(char::to_lowercase) {
        let mapped = match ch {
            'á' | 'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        };
        if mapped == ' ' {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(mapped);
            last_space = false;
        }
    }
    if !last_space {
        out.push(' ');
    }
    out
}

fn contains_phrase(normalized: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|p| normalized.contains(p.as_str()))
}

fn prepare(phrases: &[&str]) -> Vec<String> {
    phrases.iter().map(|p| normalize(p)).filter(|p| !p.trim().is_empty()).collect()
}

const EXIT_PHRASES: &[&str] = &[
    "adiós",
    "chao",
    "chau",
    "bye",
    "hasta luego",
    "me voy",
    "ya no quiero",
    "no quiero más",
    "ya basta",
    "terminar",
    "salir",
    "parar",
];

/// Detects farewell and "I want to stop" phrases.
#[derive(Debug, Clone)]
pub struct KeywordExitDetector {
    phrases: Vec<String>,
}

impl KeywordExitDetector {
    pub fn new() -> Self {
        Self::with_phrases(EXIT_PHRASES)
    }

    pub fn with_phrases(phrases: &[&str]) -> Self {
        Self {
            phrases: prepare(phrases),
        }
    }
}

impl Default for KeywordExitDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ExitIntent for KeywordExitDetector {
    fn is_exit_intent(&self, text: &str) -> bool {
        contains_phrase(&normalize(text), &self.phrases)
    }
}

const YES_WORDS: &[&str] = &["sí", "sep", "ajá", "claro", "ok", "está bien", "dale", "vale"];
const NO_WORDS: &[&str] = &["no", "nop", "nope", "no quiero", "mejor no"];

/// Yes/no interpreter. Answers containing both kinds of words are unclear.
#[derive(Debug, Clone)]
pub struct KeywordYesNo {
    yes: Vec<String>,
    no: Vec<String>,
}

impl KeywordYesNo {
    pub fn new() -> Self {
        Self {
            yes: prepare(YES_WORDS),
            no: prepare(NO_WORDS),
        }
    }

    pub fn interpret(&self, text: &str) -> Option<bool> {
        let normalized = normalize(text);
        match (contains_phrase(&normalized, &self.yes), contains_phrase(&normalized, &self.no)) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }
}

impl Default for KeywordYesNo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl crate::traits::interpreter::Validator<bool> for KeywordYesNo {
    async fn validate(&self, text: &str) -> Option<bool> {
        self.interpret(text)
    }
}
