//! Lexer for code-like answer text.
//!
//! Splits C-family source fragments into tokens so that answers can be
//! compared independently of whitespace. Recognized token classes, tried in
//! order at each position:
//!
//! 1. string and char literals (`"..."`, `'...'`), escapes kept verbatim
//! 2. identifiers and keywords (`[A-Za-z_][A-Za-z0-9_]*`)
//! 3. integer literals (`[0-9]+`)
//! 4. two-character operators (`<<`, `>>`, `++`, `--`, `==`, `!=`, `>=`, `<=`, `&&`, `||`, `->`)
//! 5. single-character operators and punctuation
//!
//! Whitespace and any character outside these classes is skipped.

/// Two-character operators, matched before their single-character prefixes.
const MULTI_CHAR_OPERATORS: [&str; 11] = [
    "<<", ">>", "++", "--", "==", "!=", ">=", "<=", "&&", "||", "->",
];

const SINGLE_CHAR_OPERATORS: &str = "+-*/%=&|!<>:;,.()[]{}";

/// Split `text` into tokens. Tokens borrow from the input.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(c) = text[pos..].chars().next() {
        let rest = &text[pos..];
        match token_len(rest, c) {
            Some(len) => {
                tokens.push(&rest[..len]);
                pos += len;
            }
            None => pos += c.len_utf8(),
        }
    }

    tokens
}

/// Length in bytes of the token starting at `rest`, if one starts there.
fn token_len(rest: &str, first: char) -> Option<usize> {
    match first {
        '"' | '\'' => quoted_len(rest, first),
        c if c.is_ascii_alphabetic() || c == '_' => {
            Some(prefix_len(rest, |c| c.is_ascii_alphanumeric() || c == '_'))
        }
        c if c.is_ascii_digit() => Some(prefix_len(rest, |c| c.is_ascii_digit())),
        c => {
            if MULTI_CHAR_OPERATORS.iter().any(|op| rest.starts_with(op)) {
                Some(2)
            } else if SINGLE_CHAR_OPERATORS.contains(c) {
                Some(1)
            } else {
                None
            }
        }
    }
}

fn prefix_len(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.find(|c: char| !pred(c)).unwrap_or(s.len())
}

/// Length of a quoted literal including both quotes. An unterminated
/// literal is not a token.
fn quoted_len(rest: &str, quote: char) -> Option<usize> {
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if c == quote {
            return Some(i + c.len_utf8());
        }
    }
    None
}
