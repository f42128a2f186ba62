use crate::Result;
use crate::context::Context;
use crate::tpl::ast::Program;
use crate::tpl::parser::parse_template;
use crate::tpl::render::render_program;
use crate::tpl::render_context::RenderContext;
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;

/// A compiled template plus the default values it renders with.
///
/// Compilation happens once, in the constructor. The compiled program is
/// immutable, so one `Template` can be rendered any number of times, from any
/// number of threads, each call with its own context.
///
/// ```
/// use utpl::{Template, Value, context};
///
/// let tpl = Template::with_defaults(
///     "This is {{ name|upper }}{{ punct }}",
///     [context! {
///         "upper" => Value::filter("upper", |v| Ok(v.to_string().to_uppercase().into())),
///         "punct" => "!",
///     }],
/// )?;
/// assert_eq!(tpl.render(Some(&context! { "name" => "bob" }))?, "This is BOB!");
/// # Ok::<(), utpl::error::TemplateError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Template {
    program: Program,
    defaults: Context,
}

impl Template {
    /// Compiles `source` with no default values.
    ///
    /// # Errors
    /// `Syntax` for an invalid name, `TemplateSyntax` for malformed or
    /// unbalanced tags.
    pub fn new(source: &str) -> Result<Self> {
        Self::with_defaults(source, std::iter::empty())
    }

    /// Compiles `source`; `contexts` are merged in order, later ones winning,
    /// and used under every render call.
    pub fn with_defaults<I>(source: &str, contexts: I) -> Result<Self>
    where
        I: IntoIterator<Item = Context>,
    {
        let mut defaults = Context::new();
        for ctx in contexts {
            defaults.merge(&ctx);
        }

        let program = parse_template(source)?;
        debug!(
            "Compiled template: {} top-level nodes, {} variables, {} loop variables",
            program.nodes.len(),
            program.vars.all_vars.len(),
            program.vars.loop_vars.len()
        );
        Ok(Self { program, defaults })
    }

    /// Renders with `context` layered over the defaults.
    ///
    /// # Errors
    /// `Lookup` if a variable is missing, `Type`/`Call` if a filter or loop
    /// value is unusable. Failures inside dotted lookups never error.
    pub fn render(&self, context: Option<&Context>) -> Result<String> {
        let mut layers = vec![&self.defaults];
        if let Some(ctx) = context {
            layers.push(ctx);
        }
        let mut ctx = RenderContext::new(layers);
        render_program(&self.program, &mut ctx)
    }

    /// Renders with the fields of a serde struct or map as the context.
    pub fn render_with<T: ?Sized + Serialize>(&self, param: &T) -> Result<String> {
        let ctx = Context::from_serialize(param)?;
        self.render(Some(&ctx))
    }

    pub fn defaults(&self) -> &Context {
        &self.defaults
    }

    /// Every root name the template references, filters included.
    pub fn all_vars(&self) -> &BTreeSet<String> {
        &self.program.vars.all_vars
    }

    /// Names bound by `{% for %}` tags.
    pub fn loop_vars(&self) -> &BTreeSet<String> {
        &self.program.vars.loop_vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::value::Value;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_defaults_merge_in_order() {
        let tpl = Template::with_defaults(
            "{{ a }}{{ b }}",
            [
                Context::new().with("a", 1).with("b", 1),
                Context::new().with("b", 2),
            ],
        )
        .unwrap();
        assert_eq!(tpl.render(None).unwrap(), "12");
        assert_eq!(
            tpl.render(Some(&Context::new().with("a", 9))).unwrap(),
            "92"
        );
        // The override did not leak into the defaults.
        assert_eq!(tpl.render(None).unwrap(), "12");
    }

    #[test]
    fn test_compile_errors_abort_construction() {
        assert!(matches!(
            Template::new("{% if x %}"),
            Err(TemplateError::TemplateSyntax(_))
        ));
        assert!(matches!(
            Template::new("{{ 1x }}"),
            Err(TemplateError::Syntax(_))
        ));
    }

    #[test]
    fn test_registry_accessors() {
        let tpl = Template::new("{% for x in xs %}{{ x|f }}{% endfor %}").unwrap();
        let all: Vec<&str> = tpl.all_vars().iter().map(String::as_str).collect();
        assert_eq!(all, vec!["f", "x", "xs"]);
        assert!(tpl.loop_vars().contains("x"));
    }

    #[test]
    fn test_render_from_threads() {
        let tpl = Arc::new(
            Template::with_defaults(
                "{{ who|shout }}",
                [Context::new().with(
                    "shout",
                    Value::filter("shout", |v| Ok(Value::from(format!("{}!", v)))),
                )],
            )
            .unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let tpl = tpl.clone();
                thread::spawn(move || tpl.render(Some(&Context::new().with("who", i))))
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap().unwrap(), format!("{}!", i));
        }
    }
}
