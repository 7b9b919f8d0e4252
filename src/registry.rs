//! Format-keyed codec registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::env::EnvCodec;
use crate::error::Error;
use crate::json::JsonCodec;
use crate::options::DecodeOptions;

/// A format codec: decode bytes into a record, encode a record into
/// bytes. Options are passed per call; codecs hold no mutable state, so
/// one instance serves any number of loads.
pub trait Codec<T>: Send + Sync {
    fn decode(&self, buf: &[u8], opts: &DecodeOptions) -> Result<T, Error>;
    fn encode(&self, value: &T) -> Result<Vec<u8>, Error>;
}

/// Case-insensitive format → codec mapping, shared across loads behind a
/// mutex. Registered codecs shadow the built-in `json` and `env` codecs.
pub struct CodecRegistry<T> {
    codecs: Mutex<HashMap<String, Arc<dyn Codec<T>>>>,
}

impl<T> CodecRegistry<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new() -> Self {
        CodecRegistry {
            codecs: Mutex::new(HashMap::new()),
        }
    }

    /// Register a codec for a format name. Re-registering a format
    /// replaces the previous codec.
    pub fn register(&self, format: &str, codec: Arc<dyn Codec<T>>) {
        let mut codecs = self.codecs.lock().expect("codec registry poisoned");
        codecs.insert(format.to_lowercase(), codec);
    }

    /// Look up the codec for a format. The `Arc` is cloned out of the
    /// lock, so no decode or encode ever runs under it.
    pub fn get(&self, format: &str) -> Result<Arc<dyn Codec<T>>, Error> {
        let format = format.to_lowercase();
        {
            let codecs = self.codecs.lock().expect("codec registry poisoned");
            if let Some(codec) = codecs.get(&format) {
                return Ok(Arc::clone(codec));
            }
        }
        match format.as_str() {
            "json" => Ok(Arc::new(JsonCodec)),
            "env" => Ok(Arc::new(EnvCodec)),
            _ => Err(Error::UnknownFormat(format)),
        }
    }
}

impl<T> Default for CodecRegistry<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    fn default() -> Self {
        Self::new()
    }
}
