//! Custom serde Serializer that converts any `Serialize` value into a
//! [`Value`] tree, resolving struct field names through the name resolver
//! and tracking the field path for diagnostics.

use std::collections::BTreeMap;

use serde::ser::{self, Serialize};

use crate::error::MapError;
use crate::names;
use crate::value::Value;

/// Convert a typed record into a tree value.
///
/// Struct fields are keyed by their resolved lower-snake names (fields
/// named `-` are excluded); `None` and unit map to `Null`; unit enum
/// variants map to their name as a string; map keys must be strings.
/// Errors name the offending field path (`parent.field`, `parent[i]`).
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, MapError> {
    value.serialize(ValueSerializer {
        path: String::new(),
    })
}

pub(crate) fn join_field(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

pub(crate) fn join_index(path: &str, index: usize) -> String {
    if path.is_empty() {
        format!("[{index}]")
    } else {
        format!("{path}[{index}]")
    }
}

struct ValueSerializer {
    path: String,
}

impl ValueSerializer {
    fn unsupported(&self, kind: &str) -> MapError {
        MapError::UnsupportedType {
            path: self.path.clone(),
            kind: kind.to_string(),
        }
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = MapError;
    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = SeqSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = StructSerializer;

    fn serialize_bool(self, v: bool) -> Result<Value, MapError> {
        Ok(Value::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, MapError> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, MapError> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, MapError> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, MapError> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, MapError> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, MapError> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, MapError> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, MapError> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, MapError> {
        Ok(Value::Number(v as f64))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, MapError> {
        Ok(Value::Number(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, MapError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, MapError> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Value, MapError> {
        Err(self.unsupported("bytes"))
    }

    fn serialize_none(self) -> Result<Value, MapError> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, MapError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, MapError> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, MapError> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, MapError> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, MapError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<Value, MapError> {
        value.serialize(self)
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, MapError> {
        Ok(SeqSerializer {
            path: self.path,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, MapError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, MapError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, MapError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, MapError> {
        Ok(MapSerializer {
            path: self.path,
            map: BTreeMap::new(),
            current_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, MapError> {
        Ok(StructSerializer {
            path: self.path,
            map: BTreeMap::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, MapError> {
        Ok(StructSerializer {
            path: self.path,
            map: BTreeMap::new(),
        })
    }
}

// --- SerializeStruct ---

struct StructSerializer {
    path: String,
    map: BTreeMap<String, Value>,
}

impl ser::SerializeStruct for StructSerializer {
    type Ok = Value;
    type Error = MapError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), MapError> {
        let Some(name) = names::resolve_lower(key) else {
            return Ok(());
        };
        let node = value.serialize(ValueSerializer {
            path: join_field(&self.path, &name),
        })?;
        self.map.insert(name, node);
        Ok(())
    }

    fn end(self) -> Result<Value, MapError> {
        Ok(Value::Object(self.map))
    }
}

impl ser::SerializeStructVariant for StructSerializer {
    type Ok = Value;
    type Error = MapError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), MapError> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<Value, MapError> {
        ser::SerializeStruct::end(self)
    }
}

// --- SerializeMap ---

struct MapSerializer {
    path: String,
    map: BTreeMap<String, Value>,
    current_key: Option<String>,
}

impl ser::SerializeMap for MapSerializer {
    type Ok = Value;
    type Error = MapError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), MapError> {
        self.current_key = Some(key.serialize(KeySerializer {
            path: self.path.clone(),
        })?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MapError> {
        let key = self
            .current_key
            .take()
            .expect("serialize_value called without serialize_key");
        let node = value.serialize(ValueSerializer {
            path: join_field(&self.path, &key),
        })?;
        self.map.insert(key, node);
        Ok(())
    }

    fn end(self) -> Result<Value, MapError> {
        Ok(Value::Object(self.map))
    }
}

// --- SerializeSeq (for Vec/array fields) ---

struct SeqSerializer {
    path: String,
    items: Vec<Value>,
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = Value;
    type Error = MapError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MapError> {
        let node = value.serialize(ValueSerializer {
            path: join_index(&self.path, self.items.len()),
        })?;
        self.items.push(node);
        Ok(())
    }

    fn end(self) -> Result<Value, MapError> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SeqSerializer {
    type Ok = Value;
    type Error = MapError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MapError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, MapError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqSerializer {
    type Ok = Value;
    type Error = MapError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MapError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, MapError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleVariant for SeqSerializer {
    type Ok = Value;
    type Error = MapError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), MapError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, MapError> {
        ser::SerializeSeq::end(self)
    }
}

// --- Key serializer (string-only map keys) ---

struct KeySerializer {
    path: String,
}

impl KeySerializer {
    fn invalid(&self) -> MapError {
        MapError::InvalidKey {
            path: self.path.clone(),
        }
    }
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = MapError;
    type SerializeSeq = ser::Impossible<String, MapError>;
    type SerializeTuple = ser::Impossible<String, MapError>;
    type SerializeTupleStruct = ser::Impossible<String, MapError>;
    type SerializeTupleVariant = ser::Impossible<String, MapError>;
    type SerializeMap = ser::Impossible<String, MapError>;
    type SerializeStruct = ser::Impossible<String, MapError>;
    type SerializeStructVariant = ser::Impossible<String, MapError>;

    fn serialize_str(self, v: &str) -> Result<String, MapError> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String, MapError> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String, MapError> {
        Ok(variant.to_string())
    }

    fn serialize_bool(self, _v: bool) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_i8(self, _v: i8) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_i16(self, _v: i16) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_i32(self, _v: i32) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_i64(self, _v: i64) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_u8(self, _v: u8) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_u16(self, _v: u16) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_u32(self, _v: u32) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_u64(self, _v: u64) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_f32(self, _v: f32) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_f64(self, _v: f64) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_none(self) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_unit(self) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String, MapError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String, MapError> {
        Err(self.invalid())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, MapError> {
        Err(self.invalid())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, MapError> {
        Err(self.invalid())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, MapError> {
        Err(self.invalid())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, MapError> {
        Err(self.invalid())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, MapError> {
        Err(self.invalid())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, MapError> {
        Err(self.invalid())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, MapError> {
        Err(self.invalid())
    }
}
