pub mod context;
pub mod error;
pub mod template_loader;
pub mod template_manager;
pub(crate) mod tpl;
pub mod value;

#[doc(hidden)]
pub use ctor;
#[doc(hidden)]
pub use log;

pub use context::Context;
pub use tpl::engine::Template;
pub use utpl_macros::Attrs;
pub use utpl_macros::template_assets;
pub use value::{Function, Object, ToValue, Value};

pub type Result<T> = std::result::Result<T, error::TemplateError>;
