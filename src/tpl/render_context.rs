use crate::context::Context;
use crate::value::Value;

/// Scopes visible while rendering: loop bindings over context layers.
pub struct RenderContext<'a> {
    /// Context layers, later layers shadow earlier ones (defaults first).
    layers: Vec<&'a Context>,
    /// Loop bindings, innermost last.
    locals: Vec<(&'a str, Value)>,
}

impl<'a> RenderContext<'a> {
    pub fn new(layers: Vec<&'a Context>) -> Self {
        Self {
            layers,
            locals: Vec::new(),
        }
    }

    pub fn push(&mut self, key: &'a str, value: Value) {
        self.locals.push((key, value));
    }

    pub fn pop(&mut self) {
        self.locals.pop();
    }

    pub fn lookup(&self, key: &str) -> Option<&Value> {
        // 1. Loop variables, searched backwards so inner loops shadow outer ones.
        if let Some((_, v)) = self.locals.iter().rev().find(|(k, _)| *k == key) {
            return Some(v);
        }

        // 2. Context layers, per-call values before defaults.
        self.layers.iter().rev().find_map(|layer| layer.get(key))
    }

    /// Whether `key` is set in the context itself, ignoring loop bindings.
    pub fn has_root(&self, key: &str) -> bool {
        self.layers.iter().any(|layer| layer.contains(key))
    }
}
