/// Splits raw message text into the tokens the classifier learns from.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

const MIN_WORD: usize = 3;
const MAX_WORD: usize = 12;

/// Lowercased whitespace-separated words.
///
/// Words shorter than three characters are dropped. Words longer than twelve
/// collapse into a `skip:` token recording their first character and
/// approximate length.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .filter_map(|word| {
                let word = word.to_lowercase();
                let len = word.chars().count();
                if len < MIN_WORD {
                    None
                } else if len > MAX_WORD {
                    let first = word.chars().next().unwrap_or('?');
                    Some(format!("skip:{} {}", first, len / 10 * 10))
                } else {
                    Some(word)
                }
            })
            .collect()
    }
}
