/// BLEU tokenizer in the style of NIST mteval: lowercases, unescapes the
/// common XML entities and splits on whitespace and punctuation.
///
/// Periods and commas stay inside numbers (`3.5`, `1,000`), a dash is split
/// off only after a digit, and apostrophes are never split.
pub fn normalize(text: &str) -> Vec<String> {
    let cleaned = text
        .replace("<skipped>", "")
        .replace("-\n", "")
        .replace('\n', " ");
    let cleaned = unescape_entities(&cleaned).to_lowercase();
    let chars: Vec<char> = cleaned.chars().collect();

    let mut tokens = Vec::new();
    let mut current = String::new();
    for (idx, &c) in chars.iter().enumerate() {
        let prev_digit = idx > 0 && chars[idx - 1].is_ascii_digit();
        let next_digit = chars.get(idx + 1).is_some_and(|n| n.is_ascii_digit());

        let split_off = match c {
            c if c.is_whitespace() => {
                flush(&mut current, &mut tokens);
                continue;
            }
            '.' | ',' => !(prev_digit && next_digit),
            '-' => prev_digit,
            c => is_split_punctuation(c),
        };

        if split_off {
            flush(&mut current, &mut tokens);
            tokens.push(c.to_string());
        } else {
            current.push(c);
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

// ASCII punctuation that always forms its own token. Apostrophe, dash,
// period and comma are handled separately.
fn is_split_punctuation(c: char) -> bool {
    matches!(c,
        '!'..='&' | '('..='+' | '/' | ':'..='@' | '['..='`' | '{'..='~')
}

fn unescape_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_whitespace() {
        assert_eq!(normalize("The  Cat\tsat"), ["the", "cat", "sat"]);
    }

    #[test]
    fn punctuation_is_split_off() {
        assert_eq!(
            normalize("Hello, world! (yes)"),
            ["hello", ",", "world", "!", "(", "yes", ")"]
        );
    }

    #[test]
    fn numbers_keep_inner_period_and_comma() {
        assert_eq!(normalize("pi is 3.14."), ["pi", "is", "3.14", "."]);
        assert_eq!(normalize("1,000 people"), ["1,000", "people"]);
    }

    #[test]
    fn dash_split_only_after_digit() {
        assert_eq!(normalize("well-known"), ["well-known"]);
        assert_eq!(normalize("1990-1991"), ["1990", "-", "1991"]);
    }

    #[test]
    fn apostrophe_is_kept() {
        assert_eq!(normalize("l'homme"), ["l'homme"]);
    }

    #[test]
    fn entities_are_unescaped() {
        assert_eq!(normalize("a &amp; b"), ["a", "&", "b"]);
        assert_eq!(normalize("&quot;x&quot;"), ["\"", "x", "\""]);
    }

    #[test]
    fn skipped_tags_and_hyphenation_are_removed() {
        assert_eq!(normalize("<skipped>frag-\nment"), ["fragment"]);
    }

    #[test]
    fn empty_and_blank_input_yield_no_tokens() {
        assert!(normalize("").is_empty());
        assert!(normalize("   ").is_empty());
    }
}
