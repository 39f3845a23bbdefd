/// Lowercases, splits on any non-letter/non-digit boundary, and drops
/// single-character tokens, per the tokenization rule: "lowercase, split on
/// non-letter/non-digit, drop tokens of length <2".
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphabetic() || c.is_numeric()))
        .filter(|w| w.chars().count() >= 2)
        .map(|w| w.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_lowercases() {
        let tokens = tokenize("Hello, World! Go-lang.");
        assert_eq!(tokens, vec!["hello", "world", "go", "lang"]);
    }

    #[test]
    fn drops_single_char_tokens() {
        let tokens = tokenize("a b go I");
        assert_eq!(tokens, vec!["go"]);
    }

    #[test]
    fn empty_text_yields_empty_tokens() {
        assert!(tokenize("").is_empty());
    }
}
