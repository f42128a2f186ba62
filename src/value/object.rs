use crate::Result;
use crate::error::TemplateError;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// A host value that templates can look into.
///
/// Dotted lookups try [`Object::get_item`] first and fall back to
/// [`Object::get_attr`]; a `Value::Function` returned from either is called
/// with no arguments before the lookup continues. Every method is optional.
///
/// `#[derive(Attrs)]` implements this for plain structs.
pub trait Object: fmt::Debug + Send + Sync {
    /// Keyed access, e.g. `obj.key` on a mapping-like type.
    fn get_item(&self, _key: &str) -> Option<Value> {
        None
    }

    /// Attribute access, e.g. `obj.field` or `obj.method`.
    fn get_attr(&self, _name: &str) -> Option<Value> {
        None
    }

    /// The values a `{% for %}` loop walks over, if the object is iterable.
    fn try_iter(&self) -> Option<Vec<Value>> {
        None
    }

    fn is_truthy(&self) -> bool {
        true
    }

    /// How `{{ obj }}` prints. Defaults to the `Debug` form.
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

type Callback = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A named callable stored in a context.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    callback: Arc<Callback>,
}

impl Function {
    pub fn new<F>(name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            callback: Arc::new(f),
        }
    }

    /// A callable taking exactly one argument.
    pub fn unary<F>(name: &str, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        let owned = name.to_string();
        Self::new(name, move |args| match args {
            [arg] => f(arg),
            _ => Err(arity_error(&owned, 1, args.len())),
        })
    }

    /// A callable taking no arguments.
    pub fn nullary<F>(name: &str, f: F) -> Self
    where
        F: Fn() -> Result<Value> + Send + Sync + 'static,
    {
        let owned = name.to_string();
        Self::new(name, move |args| {
            if args.is_empty() {
                f()
            } else {
                Err(arity_error(&owned, 0, args.len()))
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.callback)(args)
    }
}

fn arity_error(name: &str, expected: usize, given: usize) -> TemplateError {
    TemplateError::Type(format!(
        "{}() takes {} positional argument(s) but {} were given",
        name, expected, given
    ))
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.name).finish()
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}
