use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    /// An invalid identifier used as a variable, filter or loop variable name.
    #[error("Syntax Error: {0}")]
    Syntax(String),
    /// Malformed or unbalanced action tags.
    #[error("Template Syntax Error: {0}")]
    TemplateSyntax(String),
    /// A root variable missing from the context at render time.
    #[error("Lookup Error: {0}")]
    Lookup(String),
    #[error("Type Error: {0}")]
    Type(String),
    /// Raised by a user supplied callable.
    #[error("Call Error: {0}")]
    Call(String),
    #[error("Serialization Error: {0}")]
    Serialization(String),
    #[error("Template Not Found: {0}")]
    NotFound(String),
    #[error("Template Load Error: {0}")]
    Load(String),
}

pub type Error = TemplateError;

impl TemplateError {
    /// Builds a `TemplateSyntax` error quoting the offending token.
    pub(crate) fn syntax(msg: &str, thing: &str) -> Self {
        TemplateError::TemplateSyntax(format!("{}: {:?}", msg, thing))
    }
}

impl serde::ser::Error for TemplateError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        TemplateError::Serialization(msg.to_string())
    }
}
