//! Upstream content collaborator. Whatever produces the HTML fragment is
//! opaque to the export subsystem; it only has to honor [`ContentSource`].

use std::future::Future;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure of the content generator, propagated to the caller untouched.
#[derive(Debug, Error)]
pub enum ContentGenerationError {
    #[error("content generation failed: {0}")]
    Upstream(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("content generator returned an empty document")]
    Empty,
}

/// Produces an HTML fragment from some input (a prompt, a file, …).
pub trait ContentSource {
    fn generate(&self, input: &str) -> impl Future<Output = Result<String, ContentGenerationError>> + Send;
}

/// Reads the fragment from a file on disk. `input` is ignored.
#[derive(Debug, Clone)]
pub struct FileContent {
    path: PathBuf,
}

impl FileContent {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ContentSource for FileContent {
    async fn generate(&self, _input: &str) -> Result<String, ContentGenerationError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ContentGenerationError::Read {
                path: self.path.clone(),
                source,
            })?;
        let html = clean_generated_html(&raw);
        if html.is_empty() {
            return Err(ContentGenerationError::Empty);
        }
        Ok(html)
    }
}

/// Strip the Markdown code fences generators sometimes wrap HTML in
/// (```` ```html … ``` ````) and surrounding whitespace.
pub fn clean_generated_html(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string ("html") along with the opening fence.
        text = rest.split_once('\n').map_or("", |(_, body)| body);
    }
    if let Some(body) = text.trim_end().strip_suffix("```") {
        text = body;
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_html_fences() {
        assert_eq!(clean_generated_html("```html\n<p>Hola</p>\n```"), "<p>Hola</p>");
        assert_eq!(clean_generated_html("```\n<p>Hola</p>```\n"), "<p>Hola</p>");
        assert_eq!(clean_generated_html("  <p>Hola</p>  "), "<p>Hola</p>");
    }

    #[tokio::test]
    async fn file_content_reads_and_cleans() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guia.html");
        std::fs::write(&path, "```html\n<h1>Reglamento</h1>\n```").unwrap();
        let html = FileContent::new(&path).generate("").await.unwrap();
        assert_eq!(html, "<h1>Reglamento</h1>");
    }

    #[tokio::test]
    async fn missing_file_is_a_generation_error() {
        let err = FileContent::new("/nonexistent/guia.html").generate("").await.unwrap_err();
        assert!(matches!(err, ContentGenerationError::Read { .. }));
    }
}
