//! Line-oriented `NAME=value` codec.
//!
//! Instead of a tree, this format works through a flat name→value table:
//! encoding flattens nested records with composed upper-snake prefixes
//! (`database.pool_size` → `DATABASE_POOL_SIZE`), and decoding mirrors
//! the same traversal over the record's shape, routing every leaf name
//! through the [`precedence`] resolver before the shared typed mapper
//! does the conversion.

pub mod precedence;

use std::collections::BTreeMap;
use std::str;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::de::from_value;
use crate::error::Error;
use crate::names;
use crate::options::DecodeOptions;
use crate::registry::Codec;
use crate::ser::to_value;
use crate::value::Value;

/// The flat name→value table, rebuilt for every decode call. Keys are
/// resolved upper-snake names; iteration order is sorted, so encoding is
/// deterministic.
pub type FlatTable = BTreeMap<String, String>;

/// Codec for the line format.
pub struct EnvCodec;

impl<T> Codec<T> for EnvCodec
where
    T: Serialize + DeserializeOwned + Default,
{
    fn decode(&self, buf: &[u8], opts: &DecodeOptions) -> Result<T, Error> {
        let text = str::from_utf8(buf)?;
        let table = parse_lines(text);

        if opts.persist_to_env {
            for (key, value) in &table {
                // Process-wide side effect; loads are single-threaded by
                // contract (see the crate docs).
                unsafe { std::env::set_var(key, value) };
            }
        }

        let shape = to_value(&T::default())?;
        let tree = match &shape {
            Value::Object(fields) if !fields.is_empty() => {
                scan_fields(fields, "", &table, &|name| std::env::var(name).ok(), opts)
            }
            // Map-shaped targets take every table entry verbatim; the
            // mapper coerces per element type.
            Value::Object(_) => Value::Object(
                table
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
            // Dynamic targets get heuristically typed entries.
            _ => Value::Object(
                table
                    .iter()
                    .map(|(k, v)| (k.clone(), parse_scalar(v)))
                    .collect(),
            ),
        };
        Ok(from_value(&tree)?)
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>, Error> {
        let tree = to_value(value)?;
        let mut table = FlatTable::new();
        flatten_fields(&tree, "", &mut table);

        let mut out = Vec::new();
        for (key, value) in &table {
            out.extend_from_slice(key.as_bytes());
            out.push(b'=');
            out.extend_from_slice(value.as_bytes());
            out.push(b'\n');
        }
        Ok(out)
    }
}

/// Parse line-format content into a flat table.
///
/// `#` truncates the rest of its line; blank and comment-only lines are
/// skipped; a line whose first space-delimited token has no `=` is
/// ignored, not an error. The value is everything after the first `=`.
pub fn parse_lines(text: &str) -> FlatTable {
    let mut table = FlatTable::new();
    for line in text.lines() {
        let line = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let Some(token) = line.split_whitespace().next() else {
            continue;
        };
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        table.insert(key.to_string(), value.to_string());
    }
    table
}

/// Walk the shape of a record, substituting table/environment values for
/// leaves and recursing into nested records with composed prefixes.
/// Leaves with no resolved value keep their default.
fn scan_fields(
    fields: &BTreeMap<String, Value>,
    prefix: &str,
    table: &FlatTable,
    env_get: &dyn Fn(&str) -> Option<String>,
    opts: &DecodeOptions,
) -> Value {
    let mut out = BTreeMap::new();
    for (key, default) in fields {
        let Some(base) = names::resolve_upper(key) else {
            continue;
        };
        let name = names::prefixed(prefix, &base);
        match default {
            Value::Object(nested) => {
                out.insert(
                    key.clone(),
                    scan_fields(nested, &name, table, env_get, opts),
                );
            }
            leaf => {
                let value = match precedence::lookup(&name, table, env_get, opts) {
                    // Substituted as text; the mapper's coercions type it.
                    Some(raw) => Value::String(raw),
                    None => leaf.clone(),
                };
                out.insert(key.clone(), value);
            }
        }
    }
    Value::Object(out)
}

/// Mirror of [`scan_fields`] for encoding: store each leaf's rendered
/// text under its composed upper-snake name. Nulls and sequences are
/// unrepresentable in the line format and are skipped.
fn flatten_fields(tree: &Value, prefix: &str, table: &mut FlatTable) {
    let Value::Object(fields) = tree else {
        return;
    };
    for (key, value) in fields {
        let Some(base) = names::resolve_upper(key) else {
            continue;
        };
        let name = names::prefixed(prefix, &base);
        match value {
            Value::Object(_) => flatten_fields(value, &name, table),
            Value::Array(_) | Value::Null => {}
            Value::String(s) => {
                table.insert(name, s.clone());
            }
            Value::Number(n) => {
                table.insert(name, n.to_string());
            }
            Value::Boolean(b) => {
                table.insert(name, b.to_string());
            }
        }
    }
}

/// Heuristic typing for shapeless targets: bool, then integer, then
/// float, then string.
fn parse_scalar(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Boolean(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Boolean(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Number(i as f64);
    }
    if let Ok(f) = s.parse::<f64>() {
        // Require a literal dot so "NaN" and "inf" stay strings.
        if s.contains('.') {
            return Value::Number(f);
        }
    }
    Value::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::fixtures::test::{AppConfig, DbConfig};

    fn decode<T: Serialize + DeserializeOwned + Default>(content: &str) -> T {
        EnvCodec
            .decode(content.as_bytes(), &DecodeOptions::default())
            .unwrap()
    }

    // --- line scanning ---

    #[test]
    fn parses_simple_pairs() {
        let table = parse_lines("SIMPLE_C=hore\nSIMPLE_E=2\n");
        assert_eq!(table["SIMPLE_C"], "hore");
        assert_eq!(table["SIMPLE_E"], "2");
    }

    #[test]
    fn comments_truncate_lines() {
        let table = parse_lines("# full comment\nPORT=8080 # trailing\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table["PORT"], "8080");
    }

    #[test]
    fn blank_lines_and_bare_words_are_ignored() {
        let table = parse_lines("\n   \nJUSTAWORD\nPORT=1\n");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn value_stops_at_first_space() {
        let table = parse_lines("GREETING=hello world\n");
        assert_eq!(table["GREETING"], "hello");
    }

    #[test]
    fn value_keeps_later_equals_signs() {
        let table = parse_lines("QUERY=a=b\n");
        assert_eq!(table["QUERY"], "a=b");
    }

    #[test]
    fn leading_whitespace_is_trimmed() {
        let table = parse_lines("  PORT=8080\n");
        assert_eq!(table["PORT"], "8080");
    }

    // --- decode ---

    #[test]
    fn decodes_flat_fields() {
        let config: AppConfig = decode("SIMPLE_C=hore\nSIMPLE_E=2\nDEBUG=true\n");
        assert_eq!(config.simple_c, "hore");
        assert_eq!(config.simple_e, 2);
        assert!(config.debug);
    }

    #[test]
    fn decodes_nested_fields_with_prefix() {
        let config: AppConfig = decode(
            "DATABASE_USER=dbtest\nDATABASE_SERVER_PORT=halo\nDATABASE_POOLING_MAX=200\n",
        );
        assert_eq!(config.database.user, "dbtest");
        assert_eq!(config.database.server_port, "halo");
        assert_eq!(config.database.pooling_max, 200);
    }

    #[test]
    fn absent_names_keep_defaults() {
        let config: AppConfig = decode("SIMPLE_E=2\n");
        assert_eq!(config.simple_c, "");
        assert_eq!(config.database.pooling_max, 0);
    }

    #[test]
    fn unparsable_number_is_an_error() {
        let result: Result<AppConfig, Error> =
            EnvCodec.decode(b"SIMPLE_E=abc\n", &DecodeOptions::default());
        assert!(matches!(result, Err(Error::Map(_))));
    }

    #[test]
    fn map_target_takes_every_entry() {
        let table: HashMap<String, String> = decode("SIMPLE_C=hore\nDB_POOL=200\n");
        assert_eq!(table["SIMPLE_C"], "hore");
        assert_eq!(table["DB_POOL"], "200");
    }

    #[test]
    fn map_target_coerces_per_element() {
        let table: HashMap<String, i64> = decode("A=1\nB=200\n");
        assert_eq!(table["B"], 200);
    }

    #[test]
    fn dynamic_target_gets_heuristic_types() {
        let value: Value = decode("FLAG=true\nCOUNT=200\nRATIO=0.5\nNAME=hore\n");
        assert_eq!(value.get("FLAG"), Some(&Value::Boolean(true)));
        assert_eq!(value.get("COUNT"), Some(&Value::Number(200.0)));
        assert_eq!(value.get("RATIO"), Some(&Value::Number(0.5)));
        assert_eq!(value.get("NAME"), Some(&Value::String("hore".into())));
    }

    #[test]
    fn heuristic_leaves_nan_and_inf_as_strings() {
        assert_eq!(parse_scalar("NaN"), Value::String("NaN".into()));
        assert_eq!(parse_scalar("inf"), Value::String("inf".into()));
        assert_eq!(parse_scalar("TRUE"), Value::Boolean(true));
    }

    // --- encode ---

    #[test]
    fn encode_flattens_with_prefixes() {
        let config = AppConfig {
            simple_c: "hore".into(),
            simple_e: 100,
            debug: true,
            example_type: "senin".into(),
            database: DbConfig {
                user: "dbtest".into(),
                server_port: "halo".into(),
                pooling_max: 200,
            },
        };
        let bytes = EnvCodec.encode(&config).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            "DATABASE_POOLING_MAX=200\nDATABASE_SERVER_PORT=halo\nDATABASE_USER=dbtest\n\
             DEBUG=true\nEXAMPLE_TYPE=senin\nSIMPLE_C=hore\nSIMPLE_E=100\n"
        );
    }

    #[test]
    fn encode_skips_nulls_and_sequences() {
        #[derive(Serialize, Deserialize, Default)]
        struct Sparse {
            name: Option<String>,
            tags: Vec<String>,
            port: u16,
        }
        let bytes = EnvCodec
            .encode(&Sparse {
                name: None,
                tags: vec!["a".into()],
                port: 1,
            })
            .unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "PORT=1\n");
    }

    #[test]
    fn encode_decode_round_trip() {
        let config = AppConfig {
            simple_c: "gore".into(),
            simple_e: 1000,
            debug: true,
            example_type: "selasa".into(),
            database: DbConfig {
                user: "u".into(),
                server_port: "p".into(),
                pooling_max: 7,
            },
        };
        let bytes = EnvCodec.encode(&config).unwrap();
        let back: AppConfig = EnvCodec.decode(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(back, config);
    }

    // --- precedence wiring ---

    #[test]
    fn environment_overrides_file_when_not_preferred() {
        let var = "STRATUM_TEST_PRECEDENCE_PORT";
        unsafe { std::env::set_var(var, "9000") };
        #[derive(Serialize, Deserialize, Default, Debug)]
        #[serde(default)]
        struct Ports {
            stratum_test_precedence_port: u32,
        }
        let opts = DecodeOptions {
            automatic_env: true,
            ..DecodeOptions::default()
        };
        let ports: Ports = EnvCodec
            .decode(format!("{var}=8080\n").as_bytes(), &opts)
            .unwrap();
        assert_eq!(ports.stratum_test_precedence_port, 9000);

        let opts = DecodeOptions {
            automatic_env: true,
            prefer_file_over_env: true,
            ..DecodeOptions::default()
        };
        let ports: Ports = EnvCodec
            .decode(format!("{var}=8080\n").as_bytes(), &opts)
            .unwrap();
        assert_eq!(ports.stratum_test_precedence_port, 8080);
        unsafe { std::env::remove_var(var) };
    }

    #[test]
    fn persist_writes_parsed_pairs_to_the_environment() {
        let var = "STRATUM_TEST_PERSIST_C";
        unsafe { std::env::remove_var(var) };
        let opts = DecodeOptions {
            persist_to_env: true,
            ..DecodeOptions::default()
        };
        let _: HashMap<String, String> = EnvCodec
            .decode(format!("{var}=hore\n").as_bytes(), &opts)
            .unwrap();
        assert_eq!(std::env::var(var).as_deref(), Ok("hore"));
        unsafe { std::env::remove_var(var) };
    }
}
