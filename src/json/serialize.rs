//! Render a tree value back to bytes.
//!
//! Objects render in sorted-key order, a format guarantee: the same
//! tree always produces the same bytes. The escape set on encode is
//! exactly the set the lexer decodes: `" \ \n \t \r`.

use crate::value::Value;

/// Serialize a tree value. Never fails: the value enum is closed.
pub fn serialize(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    write_value(&mut buf, value);
    buf
}

fn write_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Object(map) => {
            buf.push(b'{');
            for (i, (key, val)) in map.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_string(buf, key);
                buf.extend_from_slice(b": ");
                write_value(buf, val);
            }
            buf.push(b'}');
        }
        Value::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                write_value(buf, item);
            }
            buf.push(b']');
        }
        Value::String(s) => write_string(buf, s),
        // Display for f64 is shortest round-trip; integral values render
        // without a fractional part.
        Value::Number(n) => buf.extend_from_slice(n.to_string().as_bytes()),
        Value::Boolean(true) => buf.extend_from_slice(b"true"),
        Value::Boolean(false) => buf.extend_from_slice(b"false"),
        Value::Null => buf.extend_from_slice(b"null"),
    }
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\t' => buf.extend_from_slice(b"\\t"),
            '\r' => buf.extend_from_slice(b"\\r"),
            other => {
                let mut utf8 = [0u8; 4];
                buf.extend_from_slice(other.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    buf.push(b'"');
}
