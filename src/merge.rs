//! Deep merges on tree values.
//!
//! [`overlay`] is the layering merge used at decode time: the overlay
//! always wins, except where both sides are objects, which recurse.
//! [`zero_skip`] is the fold used when accumulating loaded files: a source
//! value only replaces the destination when it is not the zero value of
//! its kind, so a later, emptier source never erases earlier data.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::de::from_value;
use crate::error::Error;
use crate::ser::to_value;
use crate::value::Value;

/// Deep-merge `over` on top of `base`.
/// If both sides have an object for the same key, recurse.
/// Otherwise, `over`'s value wins.
pub fn overlay(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Object(mut base_map), Value::Object(over_map)) => {
            for (key, over_val) in over_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => overlay(base_val, over_val),
                    None => over_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, over) => over,
    }
}

/// Fold `src` into `dst`, recursing through objects and skipping zero
/// values. `false`, `0`, `""`, `null`, and empty containers never
/// override a populated destination.
pub fn zero_skip(dst: Value, src: Value) -> Value {
    match (dst, src) {
        (Value::Object(mut dst_map), Value::Object(src_map)) => {
            for (key, src_val) in src_map {
                let merged = match dst_map.remove(&key) {
                    Some(dst_val) => zero_skip(dst_val, src_val),
                    None => src_val,
                };
                dst_map.insert(key, merged);
            }
            Value::Object(dst_map)
        }
        (dst, src) => {
            if src.is_zero() {
                dst
            } else {
                src
            }
        }
    }
}

/// Fold a partial record into an accumulated one, field by field, with
/// zero-value skipping. A conversion failure aborts the merge and leaves
/// `dst` untouched.
pub fn merge_records<T>(dst: &mut T, src: &T) -> Result<(), Error>
where
    T: Serialize + DeserializeOwned,
{
    let dst_tree = to_value(dst).map_err(|source| Error::Merge { source })?;
    let src_tree = to_value(src).map_err(|source| Error::Merge { source })?;
    *dst = from_value(&zero_skip(dst_tree, src_tree)).map_err(|source| Error::Merge { source })?;
    Ok(())
}
