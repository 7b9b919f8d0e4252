//! Typed, layered configuration loading. Define a struct, point at your
//! files, and fold them into one value.
//!
//! Stratum decodes configuration from two built-in formats, a JSON-style
//! tree format and a line-oriented `NAME=value` format, through one
//! serde-based typed mapper, then folds any number of partially-populated
//! records into a single configuration with zero-value skipping.
//!
//! ```ignore
//! #[derive(Serialize, Deserialize, Default)]
//! #[serde(default)]
//! struct AppConfig {
//!     host: String,
//!     port: u16,
//!     database: DbConfig,
//! }
//!
//! let mut session = Stratum::<AppConfig>::new();
//! session.load_config_files(["base.json", "local.env"])?;
//! let config = session.config();
//! ```
//!
//! # Design: records are plain serde types
//!
//! Any `T: Serialize + DeserializeOwned + Default` is a record. There is
//! no bespoke schema trait and no runtime field registry: the derive
//! macros are the metadata. `#[serde(rename)]` overrides a field's
//! external name, `#[serde(skip)]` (or a literal `-` name) excludes a
//! field, and everything else derives from the field identifier by
//! case-splitting: `pool_size` maps to the tree key `pool_size` and the
//! line name `POOL_SIZE`. The splitting treats every capital as a word
//! boundary, so a renamed `APIKey` derives `a_p_i_key` / `A_P_I_KEY`;
//! rename explicitly when an acronym should stay together.
//!
//! # The tree format
//!
//! A hand-written engine, not a serde_json wrapper: a lexer producing
//! positioned tokens, a recursive-descent parser producing a [`Value`]
//! tree, and a serializer rendering trees back to bytes. The grammar is
//! the practical subset of JSON: objects, arrays, strings with the
//! `\" \\ \n \t \r` escapes, numbers with optional fraction and
//! exponent, `true`/`false`/`null`. Trailing commas are rejected, and
//! serialization renders object keys in sorted order, so the same tree
//! always produces the same bytes.
//!
//! Decoding is partial application: the parsed tree is layered over the
//! record's default tree, so a document only has to mention the keys it
//! wants to set. An explicit `null` resets its target to the kind's zero
//! value.
//!
//! # The line format
//!
//! One `NAME=value` per line, `#` comments, blank lines ignored. Nested
//! records compose their names with `_`: `database.pool_size` is read and
//! written as `DATABASE_POOL_SIZE`. Decoding routes every resolved name
//! through a precedence policy over the file table and the process
//! environment, controlled by the three [`DecodeOptions`] flags:
//!
//! | `automatic_env` | `prefer_file_over_env` | value source |
//! |---|---|---|
//! | `false` | — | file table only |
//! | `true` | `true` | file table, environment as fallback |
//! | `true` | `false` | environment (set and non-empty), else file |
//!
//! `persist_to_env` additionally writes every parsed pair back into the
//! process environment, a process-wide effect; see Concurrency below.
//!
//! # Merging
//!
//! Every loaded file decodes into a partial record that is folded into
//! the session's accumulated value field by field. A source field only
//! wins when it is **not** the zero value of its type: `0`, `""`,
//! `false`, `null`, and empty containers never erase earlier data, and
//! nested records merge recursively. Later files win for the fields they
//! actually populate. One consequence worth spelling out: an explicit
//! `debug=false` in a later file cannot override an earlier `true`,
//! because `false` is indistinguishable from unset. Model such flags as
//! `Option<bool>` if you need three states.
//!
//! # Leaf coercions
//!
//! The mapper converts leaves type-directedly: text parses into numeric
//! and boolean targets, numbers convert into integer targets only when
//! exact (`200.0` becomes `200`; `200.5` and out-of-range values like
//! `1e20` into a 32-bit field are errors, never truncated), booleans only
//! map to booleans. Every mapping error names the offending field path,
//! like `database.pool_size` or `rows[1].n`.
//!
//! # Dynamic targets
//!
//! [`Value`] implements `Serialize`/`Deserialize`, so `Stratum::<Value>`
//! (or a `Value` field inside a record) captures arbitrary documents: the
//! tree format yields the parsed tree, the line format yields a flat
//! object with heuristically typed values.
//!
//! # Formats and the registry
//!
//! Codecs implement [`Codec`] and live in a [`CodecRegistry`] keyed by
//! case-insensitive format name; file extensions select the codec on
//! load. `json` and `env` are built in; registered codecs shadow them.
//!
//! # Errors
//!
//! Everything fallible returns [`Error`]; nothing is logged or swallowed.
//! Lexing, parsing, and mapping each have their own taxonomy
//! ([`LexError`], [`ParseError`], [`MapError`]) with positions or field
//! paths for diagnostics. A failed decode aborts that file's load; merges
//! already committed for earlier files stay committed.
//!
//! # Concurrency
//!
//! A session is single-writer: don't share a `Stratum` between threads
//! mid-load. Once loading completes the merged record is a plain value;
//! read it from as many threads as you like. `persist_to_env` mutates
//! the process environment, which is only sound while loads stay
//! single-threaded; leave it off if that contract doesn't hold.

pub mod env;
pub mod error;
pub mod json;

mod de;
#[cfg(test)]
mod fixtures;
mod loader;
mod merge;
mod names;
mod options;
mod registry;
mod ser;
mod value;

pub use de::from_value;
pub use env::{EnvCodec, FlatTable};
pub use error::{Error, LexError, MapError, ParseError};
pub use json::JsonCodec;
pub use loader::Stratum;
pub use merge::{merge_records, overlay, zero_skip};
pub use options::DecodeOptions;
pub use registry::{Codec, CodecRegistry};
pub use ser::to_value;
pub use value::Value;
