//! serde Deserializer over a borrowed [`Value`] tree.
//!
//! Carries the leaf-coercion rules: textual leaves parse into numeric and
//! boolean targets, numeric leaves convert into integer targets with
//! exact-value and overflow checks (no truncation, ever), `Null` resets
//! any target to its kind's zero value, and `deserialize_any` hands whole
//! subtrees to dynamic targets. Errors name the offending field path.

use serde::de::value::StrDeserializer;
use serde::de::{self, DeserializeOwned, IntoDeserializer, Visitor};

use crate::error::MapError;
use crate::names;
use crate::ser::{join_field, join_index};
use crate::value::Value;

/// Populate a typed record from a tree value.
///
/// Struct targets take only the declared fields whose resolved names
/// appear in the object; other keys are ignored. Map targets take every
/// key. Absent fields are simply not served; layering over a default
/// tree is the codec's job.
pub fn from_value<T: DeserializeOwned>(value: &Value) -> Result<T, MapError> {
    T::deserialize(ValueDeserializer {
        value,
        path: String::new(),
    })
}

struct ValueDeserializer<'de> {
    value: &'de Value,
    path: String,
}

// Integer range bounds exactly representable as f64: 2^63 and 2^64.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

fn int_from_f64(n: f64, target: &'static str, path: &str) -> Result<i64, MapError> {
    if n.fract() != 0.0 {
        return Err(MapError::TypeMismatch {
            path: path.to_string(),
            detail: format!("number {n} cannot be converted to an integer"),
        });
    }
    if n < -I64_LIMIT || n >= I64_LIMIT {
        return Err(MapError::Overflow {
            path: path.to_string(),
            number: n,
            target,
        });
    }
    Ok(n as i64)
}

fn uint_from_f64(n: f64, target: &'static str, path: &str) -> Result<u64, MapError> {
    if n < 0.0 {
        return Err(MapError::TypeMismatch {
            path: path.to_string(),
            detail: format!("negative number {n} cannot be assigned to an unsigned type"),
        });
    }
    if n.fract() != 0.0 {
        return Err(MapError::TypeMismatch {
            path: path.to_string(),
            detail: format!("number {n} cannot be converted to an unsigned integer"),
        });
    }
    if n >= U64_LIMIT {
        return Err(MapError::Overflow {
            path: path.to_string(),
            number: n,
            target,
        });
    }
    Ok(n as u64)
}

impl<'de> ValueDeserializer<'de> {
    fn mismatch(&self, expected: &str) -> MapError {
        MapError::TypeMismatch {
            path: self.path.clone(),
            detail: format!("expected {expected}, got {}", self.value.kind()),
        }
    }

    fn parse_failure(&self, text: &str, target: &str) -> MapError {
        MapError::TypeMismatch {
            path: self.path.clone(),
            detail: format!("cannot parse {text:?} as {target}"),
        }
    }

    fn i64_value(&self, target: &'static str) -> Result<i64, MapError> {
        match self.value {
            Value::Number(n) => int_from_f64(*n, target, &self.path),
            Value::String(s) => s
                .parse::<i64>()
                .map_err(|_| self.parse_failure(s, target)),
            Value::Null => Ok(0),
            _ => Err(self.mismatch(target)),
        }
    }

    fn u64_value(&self, target: &'static str) -> Result<u64, MapError> {
        match self.value {
            Value::Number(n) => uint_from_f64(*n, target, &self.path),
            Value::String(s) => s
                .parse::<u64>()
                .map_err(|_| self.parse_failure(s, target)),
            Value::Null => Ok(0),
            _ => Err(self.mismatch(target)),
        }
    }

    fn f64_value(&self, target: &'static str) -> Result<f64, MapError> {
        match self.value {
            Value::Number(n) => Ok(*n),
            Value::String(s) => s
                .parse::<f64>()
                .map_err(|_| self.parse_failure(s, target)),
            Value::Null => Ok(0.0),
            _ => Err(self.mismatch(target)),
        }
    }

    fn narrow_int<T: TryFrom<i64>>(&self, target: &'static str) -> Result<T, MapError> {
        let wide = self.i64_value(target)?;
        T::try_from(wide).map_err(|_| MapError::Overflow {
            path: self.path.clone(),
            number: wide as f64,
            target,
        })
    }

    fn narrow_uint<T: TryFrom<u64>>(&self, target: &'static str) -> Result<T, MapError> {
        let wide = self.u64_value(target)?;
        T::try_from(wide).map_err(|_| MapError::Overflow {
            path: self.path.clone(),
            number: wide as f64,
            target,
        })
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'de> {
    type Error = MapError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Boolean(b) => visitor.visit_bool(*b),
            Value::Number(n) => visitor.visit_f64(*n),
            Value::String(s) => visitor.visit_str(s),
            Value::Array(_) => self.deserialize_seq(visitor),
            Value::Object(_) => self.deserialize_map(visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        match self.value {
            Value::Boolean(b) => visitor.visit_bool(*b),
            Value::String(s) => {
                let parsed = s
                    .parse::<bool>()
                    .map_err(|_| self.parse_failure(s, "boolean"))?;
                visitor.visit_bool(parsed)
            }
            Value::Null => visitor.visit_bool(false),
            _ => Err(self.mismatch("boolean")),
        }
    }

    fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        let v = self.narrow_int::<i8>("i8")?;
        visitor.visit_i8(v)
    }

    fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        let v = self.narrow_int::<i16>("i16")?;
        visitor.visit_i16(v)
    }

    fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        let v = self.narrow_int::<i32>("i32")?;
        visitor.visit_i32(v)
    }

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        let v = self.i64_value("i64")?;
        visitor.visit_i64(v)
    }

    fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        let v = self.narrow_uint::<u8>("u8")?;
        visitor.visit_u8(v)
    }

    fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        let v = self.narrow_uint::<u16>("u16")?;
        visitor.visit_u16(v)
    }

    fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        let v = self.narrow_uint::<u32>("u32")?;
        visitor.visit_u32(v)
    }

    fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        let v = self.u64_value("u64")?;
        visitor.visit_u64(v)
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        let v = self.f64_value("f32")?;
        if v.is_finite() && v.abs() > f32::MAX as f64 {
            return Err(MapError::Overflow {
                path: self.path,
                number: v,
                target: "f32",
            });
        }
        visitor.visit_f32(v as f32)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        let v = self.f64_value("f64")?;
        visitor.visit_f64(v)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        match self.value {
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => visitor.visit_char(ch),
                    _ => Err(self.parse_failure(s, "a single character")),
                }
            }
            _ => Err(self.mismatch("string")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        match self.value {
            Value::String(s) => visitor.visit_str(s),
            Value::Null => visitor.visit_str(""),
            _ => Err(self.mismatch("string")),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, MapError> {
        Err(MapError::UnsupportedType {
            path: self.path,
            kind: "bytes".to_string(),
        })
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            _ => Err(self.mismatch("null")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, MapError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, MapError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        match self.value {
            Value::Array(items) => visitor.visit_seq(SeqAccess {
                items: items.iter(),
                index: 0,
                path: self.path,
            }),
            Value::Null => visitor.visit_seq(SeqAccess {
                items: EMPTY_ARRAY.iter(),
                index: 0,
                path: self.path,
            }),
            _ => Err(self.mismatch("array")),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, MapError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, MapError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        match self.value {
            Value::Object(map) => visitor.visit_map(MapAccess {
                iter: map.iter(),
                entry: None,
                path: self.path,
            }),
            Value::Null => visitor.visit_map(MapAccess {
                iter: EMPTY_OBJECT.iter(),
                entry: None,
                path: self.path,
            }),
            _ => Err(self.mismatch("object")),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, MapError> {
        match self.value {
            Value::Object(map) => {
                // Serve only declared fields present in the tree, under
                // their declared names; absent fields are left alone and
                // unknown keys are ignored.
                let mut entries = Vec::with_capacity(fields.len());
                for field in fields {
                    let Some(resolved) = names::resolve_lower(field) else {
                        continue;
                    };
                    if let Some(value) = map.get(&resolved) {
                        entries.push((*field, resolved, value));
                    }
                }
                visitor.visit_map(StructAccess {
                    entries: entries.into_iter(),
                    current: None,
                    path: self.path,
                })
            }
            Value::Null => visitor.visit_map(StructAccess {
                entries: Vec::new().into_iter(),
                current: None,
                path: self.path,
            }),
            _ => Err(self.mismatch("object")),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, MapError> {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.as_str().into_deserializer()),
            _ => Err(self.mismatch("string")),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, MapError> {
        self.deserialize_any(visitor)
    }
}

const EMPTY_ARRAY: &[Value] = &[];
static EMPTY_OBJECT: std::collections::BTreeMap<String, Value> = std::collections::BTreeMap::new();

struct SeqAccess<'de> {
    items: std::slice::Iter<'de, Value>,
    index: usize,
    path: String,
}

impl<'de> de::SeqAccess<'de> for SeqAccess<'de> {
    type Error = MapError;

    fn next_element_seed<T: de::DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, MapError> {
        let Some(value) = self.items.next() else {
            return Ok(None);
        };
        let path = join_index(&self.path, self.index);
        self.index += 1;
        seed.deserialize(ValueDeserializer { value, path }).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct MapAccess<'de> {
    iter: std::collections::btree_map::Iter<'de, String, Value>,
    entry: Option<(&'de str, &'de Value)>,
    path: String,
}

impl<'de> de::MapAccess<'de> for MapAccess<'de> {
    type Error = MapError;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, MapError> {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        self.entry = Some((key.as_str(), value));
        let key_de: StrDeserializer<'de, MapError> = key.as_str().into_deserializer();
        seed.deserialize(key_de).map(Some)
    }

    fn next_value_seed<S: de::DeserializeSeed<'de>>(
        &mut self,
        seed: S,
    ) -> Result<S::Value, MapError> {
        let (key, value) = self
            .entry
            .take()
            .expect("next_value_seed called before next_key_seed");
        seed.deserialize(ValueDeserializer {
            value,
            path: join_field(&self.path, key),
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct StructAccess<'de> {
    entries: std::vec::IntoIter<(&'static str, String, &'de Value)>,
    current: Option<(String, &'de Value)>,
    path: String,
}

impl<'de> de::MapAccess<'de> for StructAccess<'de> {
    type Error = MapError;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, MapError> {
        let Some((field, resolved, value)) = self.entries.next() else {
            return Ok(None);
        };
        self.current = Some((resolved, value));
        let key_de: StrDeserializer<'de, MapError> = field.into_deserializer();
        seed.deserialize(key_de).map(Some)
    }

    fn next_value_seed<S: de::DeserializeSeed<'de>>(
        &mut self,
        seed: S,
    ) -> Result<S::Value, MapError> {
        let (resolved, value) = self
            .current
            .take()
            .expect("next_value_seed called before next_key_seed");
        seed.deserialize(ValueDeserializer {
            value,
            path: join_field(&self.path, &resolved),
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}
