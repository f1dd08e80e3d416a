// Sentence splitting and tokenization

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text into sentences
///
/// A sentence ends at a run of `.`, `!` or `?` followed by whitespace or
/// the end of the text, so "3.5" and "e.g.x" stay intact. Sentences are
/// trimmed and keep their terminator; trailing text without one still
/// counts as a sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_terminator(c) {
            continue;
        }
        match chars.peek() {
            Some((_, next)) if is_terminator(*next) || !next.is_whitespace() => continue,
            _ => {}
        }

        let end = i + c.len_utf8();
        push_trimmed(&mut sentences, &text[start..end]);
        start = end;
    }

    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

/// Whitespace tokens with surrounding punctuation stripped
///
/// Inner punctuation survives ("don't", "U.S", "e-mail").
pub fn tokenize(sentence: &str) -> Vec<&str> {
    sentence
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_sentences() {
        assert_eq!(
            split_sentences("A good day. Wonderful things happened today in the city."),
            vec!["A good day.", "Wonderful things happened today in the city."]
        );
    }

    #[test]
    fn test_split_keeps_decimals_and_terminator_runs() {
        assert_eq!(
            split_sentences("Prices rose 3.5 percent?! Nobody expected it"),
            vec!["Prices rose 3.5 percent?!", "Nobody expected it"]
        );
    }

    #[test]
    fn test_split_blank_text() {
        assert!(split_sentences("   ").is_empty());
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn test_tokenize_strips_punctuation() {
        assert_eq!(
            tokenize("\"Obama\" visited Paris, didn't he?"),
            vec!["Obama", "visited", "Paris", "didn't", "he"]
        );
    }
}
