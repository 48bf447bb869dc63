//! Language-agnostic surface statistics for the builtin extractor.
//!
//! Tokens are whitespace-separated words with surrounding punctuation
//! stripped; pieces with no alphanumeric character (a lone `—`) are not
//! tokens. A sentence ends at a token whose raw text ends in `.`, `!` or `?`
//! (ignoring closing quotes and brackets). Syllables are counted as groups of
//! vowels, with at least one per token.

/// Per-text counts from which every builtin metric is derived.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStats {
    /// Lowercased word tokens in order.
    pub tokens: Vec<String>,
    /// Number of tokens in each sentence.
    pub sentence_lengths: Vec<usize>,
    /// Syllables per token, aligned with `tokens`.
    pub syllables: Vec<usize>,
    /// Non-whitespace characters in the raw text.
    pub n_characters: usize,
}

const SENTENCE_END: [char; 3] = ['.', '!', '?'];
const CLOSERS: [char; 6] = ['"', '\'', ')', ']', '»', '”'];

impl TextStats {
    pub fn from_text(text: &str) -> Self {
        let mut tokens = Vec::new();
        let mut sentence_lengths = Vec::new();
        let mut current = 0usize;

        for piece in text.split_whitespace() {
            let word = piece.trim_matches(|c: char| !c.is_alphanumeric());
            if !word.is_empty() {
                tokens.push(word.to_lowercase());
                current += 1;
            }
            let ends_sentence = piece
                .trim_end_matches(&CLOSERS[..])
                .ends_with(&SENTENCE_END[..]);
            if ends_sentence && current > 0 {
                sentence_lengths.push(current);
                current = 0;
            }
        }
        if current > 0 {
            sentence_lengths.push(current);
        }

        let syllables = tokens.iter().map(|t| count_syllables(t)).collect();
        let n_characters = text.chars().filter(|c| !c.is_whitespace()).count();

        Self {
            tokens,
            sentence_lengths,
            syllables,
            n_characters,
        }
    }

    pub fn n_tokens(&self) -> usize {
        self.tokens.len()
    }

    pub fn n_sentences(&self) -> usize {
        self.sentence_lengths.len()
    }

    pub fn n_unique_tokens(&self) -> usize {
        let mut unique: Vec<&str> = self.tokens.iter().map(String::as_str).collect();
        unique.sort_unstable();
        unique.dedup();
        unique.len()
    }

    /// Alphanumeric characters across all tokens.
    pub fn n_letters(&self) -> usize {
        self.tokens
            .iter()
            .map(|t| t.chars().filter(|c| c.is_alphanumeric()).count())
            .sum()
    }

    pub fn token_lengths(&self) -> Vec<f64> {
        self.tokens
            .iter()
            .map(|t| t.chars().count() as f64)
            .collect()
    }

    /// Tokens with three or more syllables.
    pub fn n_polysyllables(&self) -> usize {
        self.syllables.iter().filter(|&&s| s >= 3).count()
    }

    /// Tokens longer than six characters.
    pub fn n_long_words(&self) -> usize {
        self.tokens.iter().filter(|t| t.chars().count() > 6).count()
    }
}

fn is_vowel(c: char) -> bool {
    matches!(
        c,
        'a' | 'e' | 'i' | 'o' | 'u' | 'y'
            | 'æ' | 'ø' | 'å' | 'ä' | 'ö' | 'ü'
            | 'á' | 'à' | 'â' | 'é' | 'è' | 'ê' | 'ë'
            | 'í' | 'ì' | 'î' | 'ï' | 'ó' | 'ò' | 'ô' | 'ú' | 'ù' | 'û'
    )
}

/// Number of vowel groups in `word`, at least one.
pub fn count_syllables(word: &str) -> usize {
    let mut count = 0;
    let mut prev_vowel = false;
    for c in word.chars().flat_map(char::to_lowercase) {
        let vowel = is_vowel(c);
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    count.max(1)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
