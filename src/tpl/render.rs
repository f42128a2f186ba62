use crate::Result;
use crate::error::TemplateError;
use crate::tpl::ast::{AstNode, Expr, Program};
use crate::tpl::render_context::RenderContext;
use crate::value::Value;
use log::warn;

/// Renders a compiled program.
///
/// Every free name of the program must be set in the context before anything
/// is emitted, even names only used inside a branch that is never taken.
pub(crate) fn render_program<'a>(program: &'a Program, ctx: &mut RenderContext<'a>) -> Result<String> {
    if let Some(missing) = program.vars.free_vars().find(|name| !ctx.has_root(name)) {
        return Err(undefined(missing));
    }

    let mut buf = String::new();
    render(&program.nodes, ctx, &mut buf)?;
    Ok(buf)
}

pub(crate) fn render<'a>(
    nodes: &'a [AstNode],
    ctx: &mut RenderContext<'a>,
    buf: &mut String,
) -> Result<()> {
    for node in nodes {
        match node {
            AstNode::Text(t) => buf.push_str(t),
            AstNode::Output(expr) => {
                let v = eval_expr(expr, ctx)?;
                buf.push_str(&v.to_string());
            }
            AstNode::If { test, body } => {
                if eval_expr(test, ctx)?.is_truthy() {
                    render(body, ctx, buf)?;
                }
            }
            AstNode::For {
                item,
                collection,
                body,
            } => {
                let items = eval_expr(collection, ctx)?.try_iter()?;
                for v in items {
                    ctx.push(item, v);
                    let result = render(body, ctx, buf);
                    ctx.pop();
                    result?;
                }
            }
        }
    }
    Ok(())
}

pub fn eval_expr(expr: &Expr, ctx: &RenderContext) -> Result<Value> {
    match expr {
        Expr::Var(name) => ctx.lookup(name).cloned().ok_or_else(|| undefined(name)),
        Expr::Dotted { base, path } => {
            let value = eval_expr(base, ctx)?;
            match resolve_path(value, path) {
                Ok(v) => Ok(v),
                Err(e) => {
                    warn!("Something went wrong while looking up '{}': {}", expr, e);
                    Ok(Value::Str(String::new()))
                }
            }
        }
        Expr::Filter { base, name } => {
            let value = eval_expr(base, ctx)?;
            let func = ctx.lookup(name).ok_or_else(|| undefined(name))?;
            func.call(&[value])
        }
    }
}

/// Walks `path` from `value`: item lookup, then attribute lookup, then a
/// zero-argument call if the result is callable.
fn resolve_path(mut value: Value, path: &[String]) -> Result<Value> {
    for dot in path {
        let next = value
            .get_item(dot)
            .or_else(|| value.get_attr(dot))
            .ok_or_else(|| {
                TemplateError::Lookup(format!(
                    "'{}' object has no item or attribute {:?}",
                    value.kind(),
                    dot
                ))
            })?;
        value = if next.is_callable() { next.call(&[])? } else { next };
    }
    Ok(value)
}

fn undefined(name: &str) -> TemplateError {
    TemplateError::Lookup(format!("Undefined variable {:?}", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::tpl::parser::parse_template;
    use std::collections::HashMap;

    fn run(tpl: &str, root: &Context) -> Result<String> {
        let program = parse_template(tpl).unwrap();
        let mut ctx = RenderContext::new(vec![root]);
        render_program(&program, &mut ctx)
    }

    #[test]
    fn test_if_and_for() {
        let root = Context::new()
            .with("show", true)
            .with("nums", vec![1, 2, 3]);
        assert_eq!(
            run("{% if show %}{% for n in nums %}{{ n }};{% endfor %}{% endif %}", &root).unwrap(),
            "1;2;3;"
        );
    }

    #[test]
    fn test_nested_loops_shadow_and_restore() {
        let root = Context::new()
            .with("outer", vec!["a", "b"])
            .with("inner", vec![1, 2]);
        let tpl = "{% for x in outer %}{{ x }}{% for x in inner %}{{ x }}{% endfor %}{{ x }} {% endfor %}";
        assert_eq!(run(tpl, &root).unwrap(), "a12a b12b ");
    }

    #[test]
    fn test_loop_variable_not_visible_after_loop() {
        let root = Context::new().with("xs", vec![1]);
        let err = run("{% for x in xs %}{% endfor %}{{ x }}", &root).unwrap_err();
        assert!(matches!(err, TemplateError::Lookup(_)));
    }

    #[test]
    fn test_free_vars_checked_before_rendering() {
        let root = Context::new().with("flag", false);
        let err = run("{% if flag %}{{ missing }}{% endif %}", &root).unwrap_err();
        assert!(matches!(err, TemplateError::Lookup(_)));
        assert!(err.to_string().contains("\"missing\""));
    }

    #[test]
    fn test_dotted_map_and_list() {
        let mut user = HashMap::new();
        user.insert("tags".to_string(), Value::from(vec!["x", "y"]));
        let root = Context::new().with("user", Value::Map(user));
        assert_eq!(run("{{ user.tags.1 }}", &root).unwrap(), "y");
        assert_eq!(run("{{ user.nope.deeper }}", &root).unwrap(), "");
    }

    #[test]
    fn test_dotted_calls_functions() {
        let mut obj = HashMap::new();
        obj.insert(
            "greet".to_string(),
            Value::method("greet", || Ok(Value::from("hi"))),
        );
        let root = Context::new().with("obj", Value::Map(obj));
        assert_eq!(run("{{ obj.greet }}", &root).unwrap(), "hi");
    }

    #[test]
    fn test_dotted_failures_are_suppressed() {
        let mut obj = HashMap::new();
        obj.insert(
            "boom".to_string(),
            Value::method("boom", || Err(TemplateError::Call("boom".to_string()))),
        );
        obj.insert(
            "needs_arg".to_string(),
            Value::filter("needs_arg", |v| Ok(v.clone())),
        );
        let root = Context::new().with("obj", Value::Map(obj));
        assert_eq!(run("[{{ obj.boom }}]", &root).unwrap(), "[]");
        assert_eq!(run("[{{ obj.needs_arg }}]", &root).unwrap(), "[]");
        assert_eq!(run("[{{ obj.boom.further }}]", &root).unwrap(), "[]");
    }

    #[test]
    fn test_dotted_base_errors_propagate() {
        let root = Context::new().with("xs", Vec::<i32>::new());
        let err = run("{% for x in xs %}{% endfor %}{{ x.y }}", &root).unwrap_err();
        assert!(matches!(err, TemplateError::Lookup(_)));
    }

    #[test]
    fn test_filter_must_be_callable() {
        let root = Context::new().with("name", "bob").with("upper", 3);
        let err = run("{{ name|upper }}", &root).unwrap_err();
        assert!(matches!(err, TemplateError::Type(_)));
    }

    #[test]
    fn test_filter_errors_propagate() {
        let root = Context::new().with("name", "bob").with(
            "fail",
            Value::filter("fail", |_| Err(TemplateError::Call("nope".to_string()))),
        );
        let err = run("{{ name|fail }}", &root).unwrap_err();
        assert!(matches!(err, TemplateError::Call(_)));
    }

    #[test]
    fn test_for_over_non_iterable() {
        let root = Context::new().with("n", 5);
        let err = run("{% for x in n %}{% endfor %}", &root).unwrap_err();
        assert!(matches!(err, TemplateError::Type(_)));
    }
}
