use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A bare name resolved from the loop scope or the context.
    Var(String),
    /// `base.a.b`, resolved segment by segment at render time.
    Dotted { base: Box<Expr>, path: Vec<String> },
    /// `base|name`, where `name` is a callable looked up in the context.
    Filter { base: Box<Expr>, name: String },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Var(name) => f.write_str(name),
            Expr::Dotted { base, path } => write!(f, "{}.{}", base, path.join(".")),
            Expr::Filter { base, name } => write!(f, "{}|{}", base, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Text(String),
    Output(Expr),
    If {
        test: Expr,
        body: Vec<AstNode>,
    },
    For {
        item: String,
        collection: Expr,
        body: Vec<AstNode>,
    },
}

/// Names collected while compiling a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarRegistry {
    /// Every root name referenced, filters included.
    pub all_vars: BTreeSet<String>,
    /// Names bound by `{% for %}`.
    pub loop_vars: BTreeSet<String>,
}

impl VarRegistry {
    /// Names that must be present in the context before rendering starts.
    pub fn free_vars(&self) -> impl Iterator<Item = &str> {
        self.all_vars
            .difference(&self.loop_vars)
            .map(String::as_str)
    }
}

/// A compiled template: the instruction tree plus the names it touches.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub nodes: Vec<AstNode>,
    pub vars: VarRegistry,
}
