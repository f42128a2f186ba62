mod object;
mod serializer;

pub use object::{Function, Object};
pub use serializer::{ValueSerializer, to_value};

use crate::Result;
use crate::error::TemplateError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Str(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bytes(Vec<u8>),
    /// Date without time zone
    Date(NaiveDate),

    /// Time without date
    Time(NaiveTime),

    /// Date and time without time zone
    DateTime(NaiveDateTime),

    /// Date and time in UTC
    DateTimeUtc(DateTime<Utc>),

    /// Arbitrary-precision decimal number
    Decimal(Decimal),

    /// Ordered list of values (e.g. arrays, tuples)
    List(Vec<Value>),

    /// Key-value map (e.g. structs, JSON objects)
    Map(HashMap<String, Value>),

    /// A host object exposing attributes, items or iteration.
    Object(Arc<dyn Object>),

    /// A callable, used as a filter or invoked by dotted lookups.
    Function(Function),
}

impl Value {
    /// Wraps a one-argument closure, the shape filters are called with.
    pub fn filter<F>(name: &str, f: F) -> Value
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(Function::unary(name, f))
    }

    /// Wraps a zero-argument closure, the shape dotted lookups invoke.
    pub fn method<F>(name: &str, f: F) -> Value
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(Function::nullary(name, f))
    }

    pub fn object<O: Object + 'static>(object: O) -> Value {
        Value::Object(Arc::new(object))
    }

    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "none",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::I64(_) | Value::U64(_) => "int",
            Value::F64(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) | Value::DateTimeUtc(_) => "datetime",
            Value::Decimal(_) => "decimal",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::I64(n) => *n != 0,
            Value::U64(n) => *n != 0,
            Value::F64(n) => *n != 0.0,
            Value::Bytes(b) => !b.is_empty(),
            Value::Decimal(d) => !d.is_zero(),
            Value::List(l) => !l.is_empty(),
            Value::Map(m) => !m.is_empty(),
            Value::Object(o) => o.is_truthy(),
            Value::Date(_)
            | Value::Time(_)
            | Value::DateTime(_)
            | Value::DateTimeUtc(_)
            | Value::Function(_) => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            Value::Function(f) => f.call(args),
            other => Err(TemplateError::Type(format!(
                "'{}' object is not callable",
                other.kind()
            ))),
        }
    }

    /// Keyed-container lookup: map keys, list indices, or the object's own items.
    pub fn get_item(&self, key: &str) -> Option<Value> {
        match self {
            Value::Map(m) => m.get(key).cloned(),
            Value::List(l) => key.parse::<usize>().ok().and_then(|i| l.get(i).cloned()),
            Value::Object(o) => o.get_item(key),
            _ => None,
        }
    }

    /// Named-attribute lookup. Only host objects carry attributes.
    pub fn get_attr(&self, name: &str) -> Option<Value> {
        match self {
            Value::Object(o) => o.get_attr(name),
            _ => None,
        }
    }

    /// Collects the values a `for` loop walks over.
    pub fn try_iter(&self) -> Result<Vec<Value>> {
        match self {
            Value::List(l) => Ok(l.clone()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Map(m) => {
                let mut keys: Vec<&String> = m.keys().collect();
                keys.sort();
                Ok(keys.into_iter().map(|k| Value::Str(k.clone())).collect())
            }
            Value::Object(o) => o.try_iter().ok_or_else(|| not_iterable(self)),
            _ => Err(not_iterable(self)),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(n) => Some(*n),
            Value::U64(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "'{}'", s),
            other => fmt::Display::fmt(other, f),
        }
    }
}

fn not_iterable(v: &Value) -> TemplateError {
    TemplateError::Type(format!("'{}' object is not iterable", v.kind()))
}

fn fmt_float(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("nan")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "inf" } else { "-inf" })
    } else if n.fract() == 0.0 {
        write!(f, "{:.1}", n)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Str(s) => f.write_str(s),
            Value::I64(n) => write!(f, "{}", n),
            Value::U64(n) => write!(f, "{}", n),
            Value::F64(n) => fmt_float(*n, f),
            Value::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::DateTimeUtc(dt) => write!(f, "{}", dt),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_repr(f)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                // Sorted so the output does not depend on hash order.
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                f.write_str("{")?;
                for (i, (k, v)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}': ", k)?;
                    v.fmt_repr(f)?;
                }
                f.write_str("}")
            }
            Value::Object(o) => o.render(f),
            Value::Function(func) => write!(f, "<function {}>", func.name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::DateTimeUtc(a), Value::DateTimeUtc(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a == b,
            _ => false,
        }
    }
}

/// Anything that can be placed into a template context.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

macro_rules! impl_to_value_primitive {
    ($rust_type:ty, $variant:ident) => {
        impl ToValue for $rust_type {
            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }
        }
    };
}

macro_rules! impl_to_value_cast {
    ($variant:ident as $target:ty: $($rust_type:ty),*) => {
        $(
            impl ToValue for $rust_type {
                fn to_value(&self) -> Value {
                    Value::$variant(*self as $target)
                }
            }
        )*
    };
}

impl_to_value_primitive!(bool, Bool);
impl_to_value_primitive!(String, Str);
impl_to_value_primitive!(NaiveDate, Date);
impl_to_value_primitive!(NaiveTime, Time);
impl_to_value_primitive!(NaiveDateTime, DateTime);
impl_to_value_primitive!(DateTime<Utc>, DateTimeUtc);
impl_to_value_primitive!(Decimal, Decimal);
impl_to_value_primitive!(Function, Function);

impl_to_value_cast!(I64 as i64: i8, i16, i32, i64, isize);
impl_to_value_cast!(U64 as u64: u8, u16, u32, u64, usize);
impl_to_value_cast!(F64 as f64: f32, f64);

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::Null
    }
}

impl ToValue for Arc<dyn Object> {
    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl<T> ToValue for &T
where
    T: ToValue + ?Sized,
{
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(|v| v.to_value()).collect())
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(|v| v.to_value()).collect())
    }
}

impl<T: ToValue> ToValue for HashMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
    }
}

impl<T: ToValue> ToValue for BTreeMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
    }
}

macro_rules! impl_from_to_value {
    ($($rust_type:ty),*) => {
        $(
            impl From<$rust_type> for Value {
                fn from(v: $rust_type) -> Self {
                    v.to_value()
                }
            }
        )*
    };
}

impl_from_to_value!(
    bool, char, String, &str, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64,
    NaiveDate, NaiveTime, NaiveDateTime, DateTime<Utc>, Decimal, Function
);

impl<T: ToValue> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        v.to_value()
    }
}

impl<T: ToValue> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.to_value()
    }
}

impl<T: ToValue> From<HashMap<String, T>> for Value {
    fn from(v: HashMap<String, T>) -> Self {
        v.to_value()
    }
}

impl From<Arc<dyn Object>> for Value {
    fn from(v: Arc<dyn Object>) -> Self {
        Value::Object(v)
    }
}
