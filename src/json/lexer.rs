//! Byte-stream lexer for the tree format.
//!
//! Produces the token sequence the parser consumes. String escapes are
//! decoded here for the encoder's escape set (`\"`, `\\`, `\n`, `\t`,
//! `\r`); any other backslash sequence is kept verbatim. Unicode escapes
//! are out of scope; this is a practical subset of the wire grammar.

use std::borrow::Cow;
use std::fmt;

use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    BraceOpen,
    BraceClose,
    BracketOpen,
    BracketClose,
    Comma,
    Colon,
    String,
    Number,
    True,
    False,
    Null,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::BraceOpen => "'{'",
            TokenKind::BraceClose => "'}'",
            TokenKind::BracketOpen => "'['",
            TokenKind::BracketClose => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Null => "'null'",
        };
        f.write_str(name)
    }
}

/// A token with its text and 1-based source position. Text borrows from
/// the input except for strings containing escapes, which are decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: Cow<'a, str>,
    pub line: usize,
    pub column: usize,
}

/// Tokenize an input document.
pub fn tokenize(input: &str) -> Result<Vec<Token<'_>>, LexError> {
    Lexer {
        input,
        pos: 0,
        line: 1,
        column: 1,
    }
    .run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) -> Result<Vec<Token<'a>>, LexError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance(ch);
                continue;
            }

            let (line, column) = (self.line, self.column);
            match ch {
                '{' => tokens.push(self.structural(TokenKind::BraceOpen, ch, line, column)),
                '}' => tokens.push(self.structural(TokenKind::BraceClose, ch, line, column)),
                '[' => tokens.push(self.structural(TokenKind::BracketOpen, ch, line, column)),
                ']' => tokens.push(self.structural(TokenKind::BracketClose, ch, line, column)),
                ':' => tokens.push(self.structural(TokenKind::Colon, ch, line, column)),
                ',' => tokens.push(self.structural(TokenKind::Comma, ch, line, column)),
                '"' => tokens.push(self.string(line, column)?),
                _ => {
                    if let Some(token) = self.keyword(line, column) {
                        tokens.push(token);
                    } else if ch.is_ascii_digit() || ch == '-' {
                        tokens.push(self.number(line, column)?);
                    } else {
                        return Err(LexError::UnexpectedChar { ch, line, column });
                    }
                }
            }
        }

        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self, ch: char) {
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn structural(&mut self, kind: TokenKind, ch: char, line: usize, column: usize) -> Token<'a> {
        let text = &self.input[self.pos..self.pos + 1];
        self.advance(ch);
        Token {
            kind,
            text: Cow::Borrowed(text),
            line,
            column,
        }
    }

    fn string(&mut self, line: usize, column: usize) -> Result<Token<'a>, LexError> {
        self.advance('"');
        let start = self.pos;
        // Decoded text is only materialized once an escape is seen; plain
        // strings borrow from the input.
        let mut decoded: Option<String> = None;

        loop {
            let Some(ch) = self.peek() else {
                return Err(LexError::UnterminatedString { line, column });
            };
            match ch {
                '"' => {
                    let text = match decoded {
                        Some(s) => Cow::Owned(s),
                        None => Cow::Borrowed(&self.input[start..self.pos]),
                    };
                    self.advance('"');
                    return Ok(Token {
                        kind: TokenKind::String,
                        text,
                        line,
                        column,
                    });
                }
                '\\' => {
                    let buf =
                        decoded.get_or_insert_with(|| self.input[start..self.pos].to_string());
                    self.advance('\\');
                    let Some(esc) = self.peek() else {
                        return Err(LexError::UnterminatedString { line, column });
                    };
                    match esc {
                        '"' => buf.push('"'),
                        '\\' => buf.push('\\'),
                        'n' => buf.push('\n'),
                        't' => buf.push('\t'),
                        'r' => buf.push('\r'),
                        other => {
                            buf.push('\\');
                            buf.push(other);
                        }
                    }
                    self.advance(esc);
                }
                other => {
                    if let Some(buf) = decoded.as_mut() {
                        buf.push(other);
                    }
                    self.advance(other);
                }
            }
        }
    }

    fn keyword(&mut self, line: usize, column: usize) -> Option<Token<'a>> {
        // starts_with never reads past the end of input, however short the
        // remaining slice is.
        let rest = &self.input[self.pos..];
        for (literal, kind) in [
            ("true", TokenKind::True),
            ("false", TokenKind::False),
            ("null", TokenKind::Null),
        ] {
            if rest.starts_with(literal) {
                let text = &rest[..literal.len()];
                self.pos += literal.len();
                self.column += literal.len();
                return Some(Token {
                    kind,
                    text: Cow::Borrowed(text),
                    line,
                    column,
                });
            }
        }
        None
    }

    fn number(&mut self, line: usize, column: usize) -> Result<Token<'a>, LexError> {
        let bytes = self.input.as_bytes();
        let start = self.pos;
        let mut pos = self.pos;

        if bytes[pos] == b'-' {
            pos += 1;
        }

        let (mut has_dot, mut has_exp) = (false, false);
        let mut exp_digits = 0usize;

        while pos < bytes.len() {
            match bytes[pos] {
                b'0'..=b'9' => {
                    pos += 1;
                    if has_exp {
                        exp_digits += 1;
                    }
                }
                b'.' => {
                    if has_dot || has_exp {
                        return Err(self.invalid_number(start, pos + 1, line, column));
                    }
                    has_dot = true;
                    pos += 1;
                }
                b'e' | b'E' => {
                    if has_exp {
                        return Err(self.invalid_number(start, pos + 1, line, column));
                    }
                    has_exp = true;
                    pos += 1;
                    if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
                        pos += 1;
                    }
                    exp_digits = 0;
                }
                _ => break,
            }
        }

        let lexeme = &self.input[start..pos];
        if (has_exp && exp_digits == 0) || lexeme.parse::<f64>().is_err() {
            return Err(self.invalid_number(start, pos, line, column));
        }

        self.column += pos - self.pos;
        self.pos = pos;
        Ok(Token {
            kind: TokenKind::Number,
            text: Cow::Borrowed(lexeme),
            line,
            column,
        })
    }

    fn invalid_number(&self, start: usize, end: usize, line: usize, column: usize) -> LexError {
        LexError::InvalidNumber {
            lexeme: self.input[start..end].to_string(),
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn structural_tokens() {
        assert_eq!(
            kinds("{}[]:,"),
            vec![
                TokenKind::BraceOpen,
                TokenKind::BraceClose,
                TokenKind::BracketOpen,
                TokenKind::BracketClose,
                TokenKind::Colon,
                TokenKind::Comma,
            ]
        );
    }

    #[test]
    fn whitespace_is_skipped() {
        assert_eq!(
            kinds("  {\n\t}  "),
            vec![TokenKind::BraceOpen, TokenKind::BraceClose]
        );
    }

    #[test]
    fn plain_string_borrows() {
        let tokens = tokenize(r#""hello""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "hello");
        assert!(matches!(tokens[0].text, Cow::Borrowed(_)));
    }

    #[test]
    fn escapes_are_decoded() {
        let tokens = tokenize(r#""a\"b\\c\nd\te\rf""#).unwrap();
        assert_eq!(tokens[0].text, "a\"b\\c\nd\te\rf");
        assert!(matches!(tokens[0].text, Cow::Owned(_)));
    }

    #[test]
    fn unknown_escape_kept_verbatim() {
        let tokens = tokenize(r#""a\qb""#).unwrap();
        assert_eq!(tokens[0].text, "a\\qb");
    }

    #[test]
    fn unterminated_string() {
        let err = tokenize(r#""never ends"#).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn unterminated_string_ending_in_backslash() {
        let err = tokenize(r#""oops\"#).unwrap_err();
        assert!(matches!(err, LexError::UnterminatedString { .. }));
    }

    #[test]
    fn keywords() {
        assert_eq!(
            kinds("true false null"),
            vec![TokenKind::True, TokenKind::False, TokenKind::Null]
        );
    }

    #[test]
    fn short_keyword_at_end_of_input() {
        // The lookahead must not read past the end.
        let err = tokenize("tru").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: 't', .. }));
        let err = tokenize("nul").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: 'n', .. }));
    }

    #[test]
    fn keyword_at_exact_end_of_input() {
        assert_eq!(kinds("true"), vec![TokenKind::True]);
    }

    #[test]
    fn numbers() {
        for input in ["0", "42", "-7", "3.25", "-0.5", "1e3", "1E-2", "6.02e23"] {
            let tokens = tokenize(input).unwrap();
            assert_eq!(tokens[0].kind, TokenKind::Number, "input {input:?}");
            assert_eq!(tokens[0].text, input);
        }
    }

    #[test]
    fn invalid_numbers() {
        for input in ["1.2.3", "1e2e3", "1e", "1e+", "1.5e2.5", "-"] {
            let err = tokenize(input).unwrap_err();
            assert!(
                matches!(err, LexError::InvalidNumber { .. }),
                "input {input:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn dot_after_exponent_rejected() {
        assert!(matches!(
            tokenize("1e2.0").unwrap_err(),
            LexError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("@").unwrap_err();
        assert_eq!(
            err,
            LexError::UnexpectedChar {
                ch: '@',
                line: 1,
                column: 1
            }
        );
    }

    #[test]
    fn positions_are_tracked() {
        let tokens = tokenize("{\n  \"a\": 1\n}").unwrap();
        let key = &tokens[1];
        assert_eq!(key.kind, TokenKind::String);
        assert_eq!((key.line, key.column), (2, 3));
        let number = &tokens[3];
        assert_eq!((number.line, number.column), (2, 8));
        let close = tokens.last().unwrap();
        assert_eq!((close.line, close.column), (3, 1));
    }

    #[test]
    fn document_tokens_in_order() {
        let tokens = tokenize(r#"{"port": 8080, "on": true}"#).unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_ref()).collect();
        assert_eq!(texts, vec!["{", "port", ":", "8080", ",", "on", ":", "true", "}"]);
    }
}
