use crate::Result;
use crate::error::TemplateError;
use crate::value::{self, Value};
use serde::Serialize;
use std::collections::HashMap;
use std::collections::hash_map;

/// Variable names mapped to the values a template renders against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    vars: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.vars.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    /// Copies every entry of `other` into `self`; keys in `other` win.
    pub fn merge(&mut self, other: &Context) {
        self.vars
            .extend(other.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Value> {
        self.vars.iter()
    }

    /// Builds a context from a serde struct or map, one entry per field.
    ///
    /// # Errors
    /// Returns `TemplateError::Serialization` if `param` does not serialize
    /// to a map with string keys.
    pub fn from_serialize<T: ?Sized + Serialize>(param: &T) -> Result<Self> {
        match value::to_value(param)? {
            Value::Map(vars) => Ok(Self { vars }),
            Value::Null => Ok(Self::new()),
            other => Err(TemplateError::Serialization(format!(
                "A context must serialize to a map, got {}",
                other.kind()
            ))),
        }
    }
}

impl From<HashMap<String, Value>> for Context {
    fn from(vars: HashMap<String, Value>) -> Self {
        Self { vars }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Context::new();
        ctx.extend(iter);
        ctx
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Context {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a> IntoIterator for &'a Context {
    type Item = (&'a String, &'a Value);
    type IntoIter = hash_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.iter()
    }
}

/// Builds a [`Context`] from `key => value` pairs.
///
/// ```
/// let ctx = utpl::context! { "name" => "Bob", "count" => 3 };
/// assert_eq!(ctx.len(), 2);
/// ```
#[macro_export]
macro_rules! context {
    () => {
        $crate::Context::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut ctx = $crate::Context::new();
        $( ctx.insert($key, $value); )+
        ctx
    }};
}
