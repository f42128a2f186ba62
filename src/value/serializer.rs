use crate::Result;
use crate::error::TemplateError;
use crate::value::Value;
use serde::Serialize;
use serde::ser::{
    SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant, SerializeTuple,
    SerializeTupleStruct, SerializeTupleVariant, Serializer,
};
use std::collections::HashMap;

/// Converts any serde-serializable value into a [`Value`].
///
/// Structs and maps become `Value::Map`, sequences and tuples become
/// `Value::List`. Map keys must serialize to strings. Enum variants carrying
/// data are externally tagged: `Shape::Circle(2.0)` becomes `{'Circle': 2.0}`.
pub fn to_value<T: ?Sized + Serialize>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}

/// Wraps `value` as the single entry of a map keyed by the variant name.
fn tagged(variant: &str, value: Value) -> Value {
    Value::Map(HashMap::from([(variant.to_string(), value)]))
}

pub struct ValueSerializer;

/// Scalars that map onto one variant through a lossless `Into`.
macro_rules! serialize_scalars {
    ($($method:ident($ty:ty) => $variant:ident),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<Value> {
                Ok(Value::$variant(v.into()))
            }
        )*
    };
}

impl Serializer for ValueSerializer {
    type Ok = Value;
    type Error = TemplateError;
    type SerializeSeq = ListSerializer;
    type SerializeTuple = ListSerializer;
    type SerializeTupleStruct = ListSerializer;
    type SerializeTupleVariant = ListSerializer;
    type SerializeMap = MapSerializer;
    type SerializeStruct = MapSerializer;
    type SerializeStructVariant = MapSerializer;

    serialize_scalars! {
        serialize_bool(bool) => Bool,
        serialize_i8(i8) => I64,
        serialize_i16(i16) => I64,
        serialize_i32(i32) => I64,
        serialize_i64(i64) => I64,
        serialize_u8(u8) => U64,
        serialize_u16(u16) => U64,
        serialize_u32(u32) => U64,
        serialize_u64(u64) => U64,
        serialize_f32(f32) => F64,
        serialize_f64(f64) => F64,
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::Str(variant.to_string()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value> {
        Ok(tagged(variant, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<ListSerializer> {
        Ok(ListSerializer::new(len.unwrap_or_default(), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<ListSerializer> {
        Ok(ListSerializer::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<ListSerializer> {
        Ok(ListSerializer::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<ListSerializer> {
        Ok(ListSerializer::new(len, Some(variant)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapSerializer> {
        Ok(MapSerializer::new(len.unwrap_or_default(), None))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapSerializer> {
        Ok(MapSerializer::new(len, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<MapSerializer> {
        Ok(MapSerializer::new(len, Some(variant)))
    }
}

/// Collects sequence and tuple elements into a `Value::List`.
pub struct ListSerializer {
    items: Vec<Value>,
    variant: Option<&'static str>,
}

impl ListSerializer {
    fn new(len: usize, variant: Option<&'static str>) -> Self {
        Self {
            items: Vec::with_capacity(len),
            variant,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let list = Value::List(self.items);
        match self.variant {
            Some(variant) => tagged(variant, list),
            None => list,
        }
    }
}

macro_rules! impl_list_serializer {
    ($($trait:ident::$method:ident),*) => {
        $(
            impl $trait for ListSerializer {
                type Ok = Value;
                type Error = TemplateError;

                fn $method<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
                    self.push(value)
                }

                fn end(self) -> Result<Value> {
                    Ok(self.finish())
                }
            }
        )*
    };
}

impl_list_serializer!(
    SerializeSeq::serialize_element,
    SerializeTuple::serialize_element,
    SerializeTupleStruct::serialize_field,
    SerializeTupleVariant::serialize_field
);

/// Collects map entries and struct fields into a `Value::Map`.
pub struct MapSerializer {
    entries: HashMap<String, Value>,
    pending_key: Option<String>,
    variant: Option<&'static str>,
}

impl MapSerializer {
    fn new(len: usize, variant: Option<&'static str>) -> Self {
        Self {
            entries: HashMap::with_capacity(len),
            pending_key: None,
            variant,
        }
    }

    fn insert<T: ?Sized + Serialize>(&mut self, key: String, value: &T) -> Result<()> {
        self.entries.insert(key, to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let map = Value::Map(self.entries);
        match self.variant {
            Some(variant) => tagged(variant, map),
            None => map,
        }
    }
}

impl SerializeMap for MapSerializer {
    type Ok = Value;
    type Error = TemplateError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        match to_value(key)? {
            Value::Str(s) => {
                self.pending_key = Some(s);
                Ok(())
            }
            other => Err(TemplateError::Serialization(format!(
                "Map key must be a string, got {}",
                other.kind()
            ))),
        }
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self.pending_key.take().ok_or_else(|| {
            TemplateError::Serialization("serialize_value called before serialize_key".to_string())
        })?;
        self.insert(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

macro_rules! impl_struct_serializer {
    ($($trait:ident),*) => {
        $(
            impl $trait for MapSerializer {
                type Ok = Value;
                type Error = TemplateError;

                fn serialize_field<T: ?Sized + Serialize>(
                    &mut self,
                    key: &'static str,
                    value: &T,
                ) -> Result<()> {
                    self.insert(key.to_string(), value)
                }

                fn end(self) -> Result<Value> {
                    Ok(self.finish())
                }
            }
        )*
    };
}

impl_struct_serializer!(SerializeStruct, SerializeStructVariant);
