use crate::Result;
use crate::error::TemplateError;
use crate::tpl::ast::Expr;
use std::collections::BTreeSet;

/// Compiles an expression such as `user.name|upper` and records every root
/// name it references in `vars`.
///
/// Pipes bind loosest: `a.b|f|g` applies `f` then `g` to `a.b`.
pub fn compile_expr(expr: &str, vars: &mut BTreeSet<String>) -> Result<Expr> {
    if expr.contains('|') {
        let mut pipes = expr.split('|');
        let mut code = compile_expr(pipes.next().unwrap_or_default().trim(), vars)?;
        for func in pipes {
            let name = func.trim();
            register(name, vars)?;
            code = Expr::Filter {
                base: Box::new(code),
                name: name.to_string(),
            };
        }
        Ok(code)
    } else if expr.contains('.') {
        let mut dots = expr.split('.');
        let base = compile_expr(dots.next().unwrap_or_default(), vars)?;
        Ok(Expr::Dotted {
            base: Box::new(base),
            path: dots.map(str::to_string).collect(),
        })
    } else {
        register(expr, vars)?;
        Ok(Expr::Var(expr.to_string()))
    }
}

/// Checks that `name` is a valid identifier and adds it to `vars`.
pub fn register(name: &str, vars: &mut BTreeSet<String>) -> Result<()> {
    if !is_identifier(name) {
        return Err(TemplateError::Syntax(format!(
            "Not a valid variable name: {:?}",
            name
        )));
    }
    vars.insert(name.to_string());
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Var(name.to_string()))
    }

    #[test]
    fn test_bare_variable() {
        let mut vars = BTreeSet::new();
        let expr = compile_expr("name", &mut vars).unwrap();
        assert_eq!(expr, Expr::Var("name".to_string()));
        assert!(vars.contains("name"));
    }

    #[test]
    fn test_dotted_path() {
        let mut vars = BTreeSet::new();
        let expr = compile_expr("obj.a.b", &mut vars).unwrap();
        assert_eq!(
            expr,
            Expr::Dotted {
                base: var("obj"),
                path: vec!["a".to_string(), "b".to_string()],
            }
        );
        // Path segments are not root names.
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn test_filters_apply_left_to_right() {
        let mut vars = BTreeSet::new();
        let expr = compile_expr("name|upper|first", &mut vars).unwrap();
        assert_eq!(
            expr,
            Expr::Filter {
                base: Box::new(Expr::Filter {
                    base: var("name"),
                    name: "upper".to_string(),
                }),
                name: "first".to_string(),
            }
        );
        assert_eq!(expr.to_string(), "name|upper|first");
        let names: Vec<&str> = vars.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["first", "name", "upper"]);
    }

    #[test]
    fn test_pipe_binds_looser_than_dot() {
        let mut vars = BTreeSet::new();
        let expr = compile_expr("user.name | upper", &mut vars).unwrap();
        match expr {
            Expr::Filter { base, name } => {
                assert_eq!(name, "upper");
                assert!(matches!(*base, Expr::Dotted { .. }));
            }
            other => panic!("Expected Filter, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_names() {
        let mut vars = BTreeSet::new();
        for bad in ["_@$DSAF", "", "1abc", "a b", "x|f.g", "$$.x"] {
            let err = compile_expr(bad, &mut vars).unwrap_err();
            assert!(matches!(err, TemplateError::Syntax(_)), "{:?}", bad);
        }
    }
}
