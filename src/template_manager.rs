use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;

use crate::Result;
use crate::context::Context;
use crate::error::TemplateError;
use crate::template_loader::{self, TemplateSource};
use crate::tpl::engine::Template;

/// The process-wide template registry.
/// `template_assets!` registers into it; applications may use it directly or
/// create their own [`TemplateManager`].
pub static TEMPLATES: LazyLock<TemplateManager> = LazyLock::new(TemplateManager::new);

/// A registry of compiled templates, addressed by name.
///
/// Templates are compiled once, at registration, and shared as `Arc<Template>`.
/// Global values set with [`TemplateManager::set_globals`] become the defaults
/// of every template registered afterwards.
pub struct TemplateManager {
    templates: DashMap<String, Arc<Template>>,
    globals: RwLock<Context>,
}

impl Default for TemplateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateManager {
    /// Creates a new, empty `TemplateManager`.
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
            globals: RwLock::new(Context::new()),
        }
    }

    /// Replaces the default values given to templates registered from now on.
    pub fn set_globals(&self, globals: Context) {
        *self.globals.write().unwrap_or_else(PoisonError::into_inner) = globals;
    }

    /// Compiles `source` and registers it under `name`.
    ///
    /// # Errors
    /// Compilation errors are returned as is. A name that is already taken
    /// gives `TemplateError::Load`.
    pub fn register(&self, name: &str, source: &str) -> Result<Arc<Template>> {
        let template = self.compile(source)?;
        self.insert(name, template.clone())?;
        Ok(template)
    }

    fn compile(&self, source: &str) -> Result<Arc<Template>> {
        let globals = self
            .globals
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(Arc::new(Template::with_defaults(source, [globals])?))
    }

    fn insert(&self, name: &str, template: Arc<Template>) -> Result<()> {
        match self.templates.entry(name.to_string()) {
            Entry::Occupied(_) => Err(already_registered(name)),
            Entry::Vacant(slot) => {
                slot.insert(template);
                Ok(())
            }
        }
    }

    /// Loads and registers every file matching a glob pattern, named by file stem.
    ///
    /// # Arguments
    /// * `pattern` - A glob pattern (e.g., "resources/templates/*.tpl").
    ///
    /// Returns the number of templates registered. The batch is all or
    /// nothing: if any file fails to read or compile, or its name is taken,
    /// none of them are registered.
    pub fn assets(&self, pattern: &str) -> Result<usize> {
        let sources = template_loader::load(pattern).map_err(|e| {
            TemplateError::Load(format!(
                "Failed to load template assets from pattern: {:#}",
                e
            ))
        })?;
        self.register_sources(sources)
    }

    /// Registers `(path, content)` pairs, typically produced by `template_assets!`.
    ///
    /// Like [`TemplateManager::assets`], nothing is registered unless every
    /// pair compiles under a free name.
    pub fn load_assets(&self, assets: Vec<(&str, &str)>) -> Result<usize> {
        let sources = template_loader::from_assets(assets)
            .map_err(|e| TemplateError::Load(format!("{:#}", e)))?;
        self.register_sources(sources)
    }

    fn register_sources(&self, sources: Vec<TemplateSource>) -> Result<usize> {
        let mut compiled: Vec<(TemplateSource, Arc<Template>)> = Vec::with_capacity(sources.len());
        for source in sources {
            if self.contains(&source.name) || compiled.iter().any(|(s, _)| s.name == source.name) {
                return Err(TemplateError::Load(format!(
                    "{} ({}): name already registered",
                    source.name, source.path
                )));
            }
            let template = self.compile(&source.content).map_err(|e| {
                TemplateError::Load(format!("{} ({}): {}", source.name, source.path, e))
            })?;
            compiled.push((source, template));
        }

        let count = compiled.len();
        for (source, template) in compiled {
            self.insert(&source.name, template)?;
            debug!("Registered template '{}' from {}", source.name, source.path);
        }
        Ok(count)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.get(name).map(|v| v.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Renders the template registered as `name`.
    ///
    /// # Errors
    /// `TemplateError::NotFound` if no such template exists, otherwise any
    /// render error of the template.
    pub fn render(&self, name: &str, context: Option<&Context>) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        template.render(context)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Template>> {
        self.templates.remove(name).map(|(_, v)| v)
    }

    /// Removes every template (mainly to reset state between tests).
    pub fn clear(&self) {
        self.templates.clear();
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn already_registered(name: &str) -> TemplateError {
    TemplateError::Load(format!("Template '{}' already registered", name))
}
