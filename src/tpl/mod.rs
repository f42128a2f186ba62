pub(crate) mod ast;
pub(crate) mod engine;
mod expr;
mod lexer;
mod parser;
mod render;
mod render_context;
