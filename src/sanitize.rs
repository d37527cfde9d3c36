//! Conversion of SDK responses into event payloads.
//!
//! Struct fields are renamed to the AWS member names (`e_tag` becomes `ETag`) and absent
//! members are left out, so the payload has the shape of the API response. Map keys are data and
//! keep their spelling.
//!
//! Some responses carry members that cannot be encoded, such as open body streams. In lenient
//! mode ([`to_emittable`]) those members are dropped: a failing object member is left out, and a
//! failing array element becomes `null`. [`to_event`] is strict and fails instead. Nesting deeper
//! than [`MAX_DEPTH`] counts as a failure in both modes, so a value that refers back to itself is
//! cut off instead of recursing forever.

use serde::ser::{self, Error as _, Serialize};
use serde_json::{Map, Number, Value};

pub const MAX_DEPTH: usize = 64;

// Members whose AWS name keeps an acronym in upper case.
const ACRONYM_MEMBERS: &[(&str, &str)] = &[
    ("ssekms_key_id", "SSEKMSKeyId"),
    ("sse_customer_algorithm", "SSECustomerAlgorithm"),
    ("sse_customer_key_md5", "SSECustomerKeyMD5"),
];

/// Serializes `value`, eliding members that fail to serialize.
///
/// Only a failure of the top-level value itself is returned as an error.
pub fn to_emittable<T>(value: &T) -> Result<Value, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    value.serialize(Sanitizer {
        depth: 0,
        lenient: true,
    })
}

/// Serializes `value`, failing on the first member that cannot be encoded.
pub fn to_event<T>(value: &T) -> Result<Value, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    value.serialize(Sanitizer {
        depth: 0,
        lenient: false,
    })
}

/// The AWS member name for a response struct field.
pub fn member_name(field: &str) -> String {
    if let Some(&(_, member)) = ACRONYM_MEMBERS.iter().find(|(name, _)| *name == field) {
        return member.to_string();
    }
    field
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[derive(Clone, Copy)]
struct Sanitizer {
    depth: usize,
    lenient: bool,
}

impl Sanitizer {
    fn nested(self) -> Result<Sanitizer, serde_json::Error> {
        if self.depth >= MAX_DEPTH {
            return Err(serde_json::Error::custom("maximum nesting depth exceeded"));
        }
        Ok(Sanitizer {
            depth: self.depth + 1,
            lenient: self.lenient,
        })
    }
}

fn wrap_variant(variant: &'static str, value: Value) -> Value {
    let mut object = Map::new();
    object.insert(variant.to_string(), value);
    Value::Object(object)
}

impl ser::Serializer for Sanitizer {
    type Ok = Value;
    type Error = serde_json::Error;

    type SerializeSeq = SeqSanitizer;
    type SerializeTuple = SeqSanitizer;
    type SerializeTupleStruct = SeqSanitizer;
    type SerializeTupleVariant = SeqSanitizer;
    type SerializeMap = MapSanitizer;
    type SerializeStruct = MapSanitizer;
    type SerializeStructVariant = MapSanitizer;

    fn serialize_bool(self, v: bool) -> Result<Value, Self::Error> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, Self::Error> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, Self::Error> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, Self::Error> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, Self::Error> {
        Ok(Value::Number(Number::from(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<Value, Self::Error> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, Self::Error> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, Self::Error> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, Self::Error> {
        Ok(Value::Number(Number::from(v)))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, Self::Error> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, Self::Error> {
        Ok(Number::from_f64(v).map_or(Value::Null, Value::Number))
    }

    fn serialize_char(self, v: char) -> Result<Value, Self::Error> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, Self::Error> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, Self::Error> {
        Ok(Value::Array(
            v.iter().map(|byte| Value::Number(Number::from(*byte))).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Value, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self.nested()?)
    }

    fn serialize_unit(self) -> Result<Value, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Self::Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, Self::Error> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self.nested()?)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Self::Error>
    where
        T: Serialize + ?Sized,
    {
        let inner = value.serialize(self.nested()?)?;
        Ok(wrap_variant(variant, inner))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqSanitizer, Self::Error> {
        Ok(SeqSanitizer {
            element: self.nested()?,
            variant: None,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqSanitizer, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqSanitizer, Self::Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqSanitizer, Self::Error> {
        let mut seq = self.serialize_seq(Some(len))?;
        seq.variant = Some(variant);
        Ok(seq)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapSanitizer, Self::Error> {
        Ok(MapSanitizer {
            member: self.nested()?,
            variant: None,
            object: Map::new(),
            next_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<MapSanitizer, Self::Error> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<MapSanitizer, Self::Error> {
        let mut map = self.serialize_map(Some(len))?;
        map.variant = Some(variant);
        Ok(map)
    }
}

struct SeqSanitizer {
    element: Sanitizer,
    variant: Option<&'static str>,
    items: Vec<Value>,
}

impl SeqSanitizer {
    fn push<T>(&mut self, value: &T) -> Result<(), serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        let item = match value.serialize(self.element) {
            Ok(item) => item,
            Err(_) if self.element.lenient => Value::Null,
            Err(e) => return Err(e),
        };
        self.items.push(item);
        Ok(())
    }

    fn finish(self) -> Value {
        let array = Value::Array(self.items);
        match self.variant {
            Some(variant) => wrap_variant(variant, array),
            None => array,
        }
    }
}

impl ser::SerializeSeq for SeqSanitizer {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqSanitizer {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqSanitizer {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SeqSanitizer {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

struct MapSanitizer {
    member: Sanitizer,
    variant: Option<&'static str>,
    object: Map<String, Value>,
    // `Some(None)` marks a key that could not be encoded; its value is skipped.
    next_key: Option<Option<String>>,
}

impl MapSanitizer {
    fn insert<T>(&mut self, key: String, value: &T) -> Result<(), serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        match value.serialize(self.member) {
            Ok(value) => {
                self.object.insert(key, value);
                Ok(())
            }
            Err(_) if self.member.lenient => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// An absent struct member (`None`) is left out rather than emitted as `null`.
    fn insert_member<T>(&mut self, field: &'static str, value: &T) -> Result<(), serde_json::Error>
    where
        T: Serialize + ?Sized,
    {
        match value.serialize(self.member) {
            Ok(Value::Null) => Ok(()),
            Ok(value) => {
                self.object.insert(member_name(field), value);
                Ok(())
            }
            Err(_) if self.member.lenient => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn finish(self) -> Value {
        let object = Value::Object(self.object);
        match self.variant {
            Some(variant) => wrap_variant(variant, object),
            None => object,
        }
    }
}

fn key_string(key: Value) -> Option<String> {
    match key {
        Value::String(key) => Some(key),
        Value::Number(key) => Some(key.to_string()),
        Value::Bool(key) => Some(key.to_string()),
        _ => None,
    }
}

impl ser::SerializeMap for MapSanitizer {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<(), Self::Error>
    where
        T: Serialize + ?Sized,
    {
        let key = match key.serialize(self.member).map(key_string) {
            Ok(Some(key)) => Some(key),
            Ok(None) | Err(_) if self.member.lenient => None,
            Ok(None) => return Err(serde_json::Error::custom("key must be a string")),
            Err(e) => return Err(e),
        };
        self.next_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + ?Sized,
    {
        match self.next_key.take() {
            Some(Some(key)) => self.insert(key, value),
            Some(None) => Ok(()),
            None => Err(serde_json::Error::custom("map value without a key")),
        }
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for MapSanitizer {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + ?Sized,
    {
        self.insert_member(key, value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for MapSanitizer {
    type Ok = Value;
    type Error = serde_json::Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), Self::Error>
    where
        T: Serialize + ?Sized,
    {
        self.insert_member(key, value)
    }

    fn end(self) -> Result<Value, Self::Error> {
        Ok(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use crate::sanitize::{member_name, to_emittable, to_event, MAX_DEPTH};
    use serde::ser::{Error as _, SerializeStruct, Serializer};
    use serde::Serialize;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Stands in for a body stream.
    struct Handle;

    impl Serialize for Handle {
        fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            Err(S::Error::custom("value holds a handle that cannot be serialized"))
        }
    }

    #[derive(Serialize)]
    struct Download {
        body: Option<Handle>,
        content_length: Option<i64>,
        e_tag: Option<String>,
        version_id: Option<String>,
        parts: Vec<Handle>,
        metadata: HashMap<String, String>,
    }

    fn download() -> Download {
        let mut metadata = HashMap::new();
        metadata.insert("build_id".to_string(), "42".to_string());
        Download {
            body: Some(Handle),
            content_length: Some(3),
            e_tag: Some("\"abc\"".to_string()),
            version_id: None,
            parts: vec![Handle, Handle],
            metadata,
        }
    }

    /// Serializes as an object whose only member is itself.
    struct SelfReferential;

    impl Serialize for SelfReferential {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut state = serializer.serialize_struct("SelfReferential", 1)?;
            state.serialize_field("next", self)?;
            state.end()
        }
    }

    /// Refers back to itself through `Some`, without any container in between.
    struct OptionalLoop;

    impl Serialize for OptionalLoop {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_some(self)
        }
    }

    struct NewtypeLoop;

    impl Serialize for NewtypeLoop {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_newtype_struct("NewtypeLoop", self)
        }
    }

    #[derive(Serialize)]
    struct Links {
        size: i64,
        optional: OptionalLoop,
        newtype: NewtypeLoop,
    }

    #[test]
    fn test_unserializable_member_is_elided() {
        assert!(serde_json::to_value(&download()).is_err());
        assert_eq!(
            to_emittable(&download()).unwrap(),
            json!({
                "ContentLength": 3,
                "ETag": "\"abc\"",
                "Parts": [null, null],
                "Metadata": { "build_id": "42" },
            })
        );
    }

    #[test]
    fn test_strict_mode_fails_on_unserializable_member() {
        assert!(to_event(&download()).is_err());
    }

    #[test]
    fn test_member_names() {
        assert_eq!(member_name("e_tag"), "ETag");
        assert_eq!(member_name("content_length"), "ContentLength");
        assert_eq!(member_name("ssekms_key_id"), "SSEKMSKeyId");
        assert_eq!(member_name("CiphertextBlob"), "CiphertextBlob");
    }

    #[test]
    fn test_plain_values_match_serde_json() {
        let mut metadata = HashMap::new();
        metadata.insert("owner".to_string(), "ops".to_string());
        let value = json!({
            "Key": "reports/2020-11.csv",
            "Size": 142863,
            "Ratio": 0.5,
            "Tags": ["a", "b"],
            "Metadata": metadata,
            "Marker": null,
        });

        assert_eq!(to_emittable(&value).unwrap(), value);
        assert_eq!(to_event(&value).unwrap(), value);
    }

    #[test]
    fn test_self_reference_is_cut_at_depth_limit() {
        let value = to_emittable(&SelfReferential).unwrap();

        let mut depth = 0;
        let mut cursor = &value;
        while let Some(next) = cursor.get("Next") {
            cursor = next;
            depth += 1;
        }
        assert_eq!(depth, MAX_DEPTH - 1);
        assert_eq!(cursor, &json!({}));
    }

    #[test]
    fn test_self_reference_through_option_and_newtype_is_cut() {
        assert!(to_emittable(&OptionalLoop).is_err());
        assert!(to_emittable(&NewtypeLoop).is_err());
        assert!(to_event(&OptionalLoop).is_err());

        let links = Links {
            size: 7,
            optional: OptionalLoop,
            newtype: NewtypeLoop,
        };
        assert_eq!(to_emittable(&links).unwrap(), json!({ "Size": 7 }));
    }

    #[test]
    fn test_top_level_failure_is_an_error() {
        assert!(to_emittable(&Handle).is_err());
        assert_eq!(to_emittable(&()).unwrap(), Value::Null);
    }
}
