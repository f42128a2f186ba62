use anyhow::{Context, Result};
use glob::glob;
use std::fs;
use std::path::Path;

/// A template file read from disk or embedded at compile time.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// Registry name, the file stem (`mail/welcome.txt` -> `welcome`).
    pub name: String,
    /// Where the content came from, for diagnostics.
    pub path: String,
    pub content: String,
}

/// Reads every file matching a glob pattern, e.g. `"templates/**/*.tpl"`.
pub fn load(pattern: &str) -> Result<Vec<TemplateSource>> {
    let paths = glob(pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))?;
    let mut sources = Vec::new();
    for entry in paths {
        let path = entry.with_context(|| format!("Unable to read path: {}", pattern))?;
        if path.is_file() {
            sources.push(load_file(&path)?);
        }
    }
    Ok(sources)
}

/// Wraps `(path, content)` pairs that were already read, e.g. by `include_str!`.
pub fn from_assets(assets: Vec<(&str, &str)>) -> Result<Vec<TemplateSource>> {
    assets
        .into_iter()
        .map(|(path, content)| {
            Ok(TemplateSource {
                name: template_name(Path::new(path))?,
                path: path.to_string(),
                content: content.to_string(),
            })
        })
        .collect()
}

fn load_file(path: &Path) -> Result<TemplateSource> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read template file: {}", path.display()))?;
    Ok(TemplateSource {
        name: template_name(path)?,
        path: path.display().to_string(),
        content,
    })
}

fn template_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .with_context(|| format!("Template file has no usable name: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_assets_names_by_stem() {
        let sources = from_assets(vec![
            ("/app/templates/mail/welcome.txt", "Hi {{ name }}"),
            ("footer.tpl", "bye"),
        ])
        .unwrap();
        assert_eq!(sources[0].name, "welcome");
        assert_eq!(sources[0].path, "/app/templates/mail/welcome.txt");
        assert_eq!(sources[1].name, "footer");
        assert_eq!(sources[1].content, "bye");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = load("templates/[").unwrap_err();
        assert!(err.to_string().contains("Invalid glob pattern"));
    }
}
