use crate::core::models::*;
use crate::utils::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Turns source text into candidate class tokens
pub trait Extractor: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Candidate tokens in match order. Duplicates are allowed.
    fn extract(&self, content: &str) -> Result<Vec<String>>;
}

/// An extractor together with the file extensions it handles
#[derive(Debug, Clone)]
pub struct ExtractorBinding {
    pub extensions: Vec<String>,
    pub extractor: Arc<dyn Extractor>,
}

impl ExtractorBinding {
    pub fn new<I, S>(extensions: I, extractor: Arc<dyn Extractor>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
            extractor,
        }
    }

    pub fn handles(&self, extension: &str) -> bool {
        let extension = normalize_extension(extension);
        self.extensions.iter().any(|ext| *ext == extension)
    }
}

/// The CSS reduction routine
#[async_trait]
pub trait CssPurger: Send + Sync {
    /// Returns one result per entry of `request.css`, in the same order
    async fn purge(&self, request: PurgeRequest) -> Result<Vec<PurgeResult>>;
}

/// File system operations interface
#[async_trait]
pub trait FileSystemService: Send + Sync {
    async fn read_file(&self, path: &Path) -> Result<String>;
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;
    async fn create_directory(&self, path: &Path) -> Result<()>;
    fn file_exists(&self, path: &Path) -> bool;
}

/// Build service interface
#[async_trait]
pub trait BuildService: Send + Sync {
    async fn build(&self, config: &BuildConfig) -> Result<BuildResult>;
}
