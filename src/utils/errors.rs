use std::path::PathBuf;
use thiserror::Error;

/// Where in the compilation an error happened
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub asset: Option<String>,
    pub chunk: Option<String>,
    pub file_path: Option<PathBuf>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    pub fn with_chunk(mut self, chunk: impl Into<String>) -> Self {
        self.chunk = Some(chunk.into());
        self
    }

    pub fn with_file(mut self, path: PathBuf) -> Self {
        self.file_path = Some(path);
        self
    }
}

#[derive(Error, Debug)]
pub enum PurgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot resolve modules for asset '{asset}': {reason}")]
    Resolution { asset: String, reason: String },

    #[error("Failed to purge '{asset}': {message}")]
    Reduction { asset: String, message: String },

    #[error(
        "Extractor '{extractor}' failed{}: {message}",
        .asset.as_ref().map(|a| format!(" on '{}'", a)).unwrap_or_default()
    )]
    Extractor {
        extractor: String,
        message: String,
        asset: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest error: {message}")]
    Manifest {
        message: String,
        context: Option<ErrorContext>,
    },

    #[error("Build error: {0}")]
    Build(String),
}

impl PurgeError {
    pub fn resolution(asset: &str, reason: impl Into<String>) -> Self {
        Self::Resolution {
            asset: asset.to_string(),
            reason: reason.into(),
        }
    }

    pub fn reduction(asset: &str, message: impl Into<String>) -> Self {
        Self::Reduction {
            asset: asset.to_string(),
            message: message.into(),
        }
    }

    pub fn extractor(extractor: &str, message: impl Into<String>) -> Self {
        Self::Extractor {
            extractor: extractor.to_string(),
            message: message.into(),
            asset: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
            context: None,
        }
    }

    pub fn manifest_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Manifest {
            message: message.into(),
            context: Some(context),
        }
    }

    /// Attach an asset name to errors raised below the asset loop
    pub fn for_asset(self, asset: &str) -> Self {
        match self {
            PurgeError::Reduction { message, .. } => PurgeError::reduction(asset, message),
            PurgeError::Resolution { reason, .. } => PurgeError::resolution(asset, reason),
            PurgeError::Extractor {
                extractor, message, ..
            } => PurgeError::Extractor {
                extractor,
                message,
                asset: Some(asset.to_string()),
            },
            other => other,
        }
    }

    /// Format error with context lines for terminal output
    pub fn format_detailed(&self) -> String {
        let mut output = format!("❌ {}", self);

        if let PurgeError::Manifest {
            context: Some(ctx), ..
        } = self
        {
            if let Some(ref chunk) = ctx.chunk {
                output.push_str(&format!("\n📦 Chunk: {}", chunk));
            }
            if let Some(ref asset) = ctx.asset {
                output.push_str(&format!("\n🎨 Asset: {}", asset));
            }
            if let Some(ref file_path) = ctx.file_path {
                output.push_str(&format!("\n📁 File: {}", file_path.display()));
            }
        }

        output
    }
}

pub type Result<T> = std::result::Result<T, PurgeError>;

impl From<regex::Error> for PurgeError {
    fn from(err: regex::Error) -> Self {
        PurgeError::config(format!("Regex error: {}", err))
    }
}

impl From<serde_json::Error> for PurgeError {
    fn from(err: serde_json::Error) -> Self {
        PurgeError::manifest(format!("JSON error: {}", err))
    }
}
