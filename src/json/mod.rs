//! Tree-format codec: lexer → parser → tree value ⇄ typed record.

pub mod lexer;
pub mod parser;
pub mod serialize;

use std::str;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::de::from_value;
use crate::error::Error;
use crate::merge;
use crate::options::DecodeOptions;
use crate::registry::Codec;
use crate::ser::to_value;

/// Codec for the tree format.
pub struct JsonCodec;

impl<T> Codec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned + Default,
{
    fn decode(&self, buf: &[u8], _opts: &DecodeOptions) -> Result<T, Error> {
        let text = str::from_utf8(buf)?;
        let tokens = lexer::tokenize(text)?;
        let tree = parser::parse(&tokens)?;
        // Layer the parsed tree over the record's defaults so decoding is
        // partial: absent keys keep their current value.
        let base = to_value(&T::default())?;
        Ok(from_value(&merge::overlay(base, tree))?)
    }

    fn encode(&self, value: &T) -> Result<Vec<u8>, Error> {
        Ok(serialize::serialize(&to_value(value)?))
    }
}
