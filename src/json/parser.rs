//! Recursive-descent parser: token sequence → tree value.
//!
//! One function per grammar production (value, object, array). Empty input
//! is an error, not an empty value. Trailing commas are rejected: a comma
//! must be followed by another pair or element, never the closer.

use std::collections::BTreeMap;

use crate::error::ParseError;
use crate::json::lexer::{Token, TokenKind};
use crate::value::Value;

/// Parse a token sequence into a tree value.
pub fn parse(tokens: &[Token<'_>]) -> Result<Value, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    Cursor { tokens, pos: 0 }.value()
}

struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl Cursor<'_, '_> {
    fn peek(&self) -> Option<&Token<'_>> {
        self.tokens.get(self.pos)
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        let token = self.peek().ok_or(ParseError::UnexpectedEnd)?;
        match token.kind {
            TokenKind::String => {
                let text = token.text.to_string();
                self.pos += 1;
                Ok(Value::String(text))
            }
            TokenKind::Number => {
                let number = token.text.parse::<f64>().map_err(|_| {
                    ParseError::InvalidNumber {
                        lexeme: token.text.to_string(),
                        line: token.line,
                        column: token.column,
                    }
                })?;
                self.pos += 1;
                Ok(Value::Number(number))
            }
            TokenKind::True => {
                self.pos += 1;
                Ok(Value::Boolean(true))
            }
            TokenKind::False => {
                self.pos += 1;
                Ok(Value::Boolean(false))
            }
            TokenKind::Null => {
                self.pos += 1;
                Ok(Value::Null)
            }
            TokenKind::BraceOpen => self.object(),
            TokenKind::BracketOpen => self.array(),
            other => Err(ParseError::UnexpectedToken {
                found: other.to_string(),
                line: token.line,
                column: token.column,
            }),
        }
    }

    fn object(&mut self) -> Result<Value, ParseError> {
        self.pos += 1; // '{'
        let mut map = BTreeMap::new();

        if matches!(self.peek(), Some(t) if t.kind == TokenKind::BraceClose) {
            self.pos += 1;
            return Ok(Value::Object(map));
        }

        loop {
            let key_token = self.peek().ok_or(ParseError::UnexpectedEnd)?;
            if key_token.kind != TokenKind::String {
                return Err(ParseError::NonStringKey {
                    found: key_token.kind.to_string(),
                    line: key_token.line,
                    column: key_token.column,
                });
            }
            let key = key_token.text.to_string();
            self.pos += 1;

            match self.peek() {
                Some(t) if t.kind == TokenKind::Colon => self.pos += 1,
                Some(t) => {
                    return Err(ParseError::MissingColon {
                        found: t.kind.to_string(),
                        line: t.line,
                        column: t.column,
                    });
                }
                None => return Err(ParseError::UnexpectedEnd),
            }

            let value = self.value()?;
            map.insert(key, value);

            match self.peek() {
                Some(t) if t.kind == TokenKind::Comma => self.pos += 1,
                Some(t) if t.kind == TokenKind::BraceClose => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some(t) => {
                    return Err(ParseError::MissingBrace {
                        found: t.kind.to_string(),
                        line: t.line,
                        column: t.column,
                    });
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }

    fn array(&mut self) -> Result<Value, ParseError> {
        self.pos += 1; // '['
        let mut items = Vec::new();

        if matches!(self.peek(), Some(t) if t.kind == TokenKind::BracketClose) {
            self.pos += 1;
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.value()?);

            match self.peek() {
                Some(t) if t.kind == TokenKind::Comma => self.pos += 1,
                Some(t) if t.kind == TokenKind::BracketClose => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                Some(t) => {
                    return Err(ParseError::MissingBracket {
                        found: t.kind.to_string(),
                        line: t.line,
                        column: t.column,
                    });
                }
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::lexer::tokenize;

    fn parse_str(input: &str) -> Result<Value, ParseError> {
        parse(&tokenize(input).unwrap())
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(parse(&[]), Err(ParseError::Empty));
    }

    #[test]
    fn primitives() {
        assert_eq!(parse_str("42").unwrap(), Value::Number(42.0));
        assert_eq!(parse_str("\"hi\"").unwrap(), Value::String("hi".into()));
        assert_eq!(parse_str("true").unwrap(), Value::Boolean(true));
        assert_eq!(parse_str("false").unwrap(), Value::Boolean(false));
        assert_eq!(parse_str("null").unwrap(), Value::Null);
    }

    #[test]
    fn exponent_form_is_a_float() {
        assert_eq!(parse_str("2e3").unwrap(), Value::Number(2000.0));
    }

    #[test]
    fn empty_containers() {
        assert_eq!(parse_str("{}").unwrap(), Value::Object(BTreeMap::new()));
        assert_eq!(parse_str("[]").unwrap(), Value::Array(vec![]));
    }

    #[test]
    fn object_with_pairs() {
        let value = parse_str(r#"{"port": 8080, "host": "localhost"}"#).unwrap();
        assert_eq!(value.get("port"), Some(&Value::Number(8080.0)));
        assert_eq!(value.get("host"), Some(&Value::String("localhost".into())));
    }

    #[test]
    fn nested_structures() {
        let value = parse_str(r#"{"db": {"tags": ["a", "b"], "size": 5}}"#).unwrap();
        let db = value.get("db").unwrap();
        assert_eq!(db.get("size"), Some(&Value::Number(5.0)));
        assert_eq!(
            db.get("tags").unwrap().as_array().unwrap(),
            &[Value::String("a".into()), Value::String("b".into())]
        );
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let value = parse_str(r#"{"a": 1, "a": 2}"#).unwrap();
        assert_eq!(value.get("a"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn non_string_key() {
        let err = parse_str(r#"{1: 2}"#).unwrap_err();
        assert!(matches!(err, ParseError::NonStringKey { .. }));
    }

    #[test]
    fn missing_colon() {
        let err = parse_str(r#"{"a" 1}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingColon { .. }));
    }

    #[test]
    fn missing_closing_brace() {
        assert_eq!(parse_str(r#"{"a": 1"#), Err(ParseError::UnexpectedEnd));
        let err = parse_str(r#"{"a": 1]"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingBrace { .. }));
    }

    #[test]
    fn missing_closing_bracket() {
        assert_eq!(parse_str("[1, 2"), Err(ParseError::UnexpectedEnd));
        let err = parse_str("[1 2]").unwrap_err();
        assert!(matches!(err, ParseError::MissingBracket { .. }));
    }

    #[test]
    fn trailing_comma_in_object_rejected() {
        let err = parse_str(r#"{"a": 1,}"#).unwrap_err();
        assert!(matches!(err, ParseError::NonStringKey { .. }));
    }

    #[test]
    fn trailing_comma_in_array_rejected() {
        let err = parse_str("[1,]").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn truncated_input_mid_object() {
        assert_eq!(parse_str(r#"{"a":"#), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse_str(r#"{"a""#), Err(ParseError::UnexpectedEnd));
    }

    #[test]
    fn stray_closer_is_unexpected() {
        let err = parse_str("}").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
