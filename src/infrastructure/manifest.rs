// Build manifest: a JSON snapshot of the bundler's chunk and module graph

use crate::core::interfaces::FileSystemService;
use crate::core::models::*;
use crate::utils::{ErrorContext, Logger, PurgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestChunk {
    pub id: String,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub files: ChunkFiles,
    #[serde(default)]
    pub entry_module: Option<String>,
    #[serde(default)]
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestModule {
    pub id: String,
    #[serde(rename = "type", default = "default_module_type")]
    pub module_type: String,
    #[serde(default)]
    pub resource: Option<PathBuf>,
    #[serde(default)]
    pub context: Option<PathBuf>,
    /// Inline source; read from `root/resource` when absent
    #[serde(default)]
    pub source: Option<String>,
}

fn default_module_type() -> String {
    "javascript/auto".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestAsset {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub chunks: Vec<ManifestChunk>,
    #[serde(default)]
    pub modules: Vec<ManifestModule>,
    /// Inline assets; stylesheets named by chunks are otherwise read from the output directory
    #[serde(default)]
    pub assets: Vec<ManifestAsset>,
}

impl Manifest {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PurgeError::manifest(format!("Failed to parse build manifest: {}", e)))
    }
}

fn resolve_against(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Turns a manifest plus the files it points at into a `Compilation`
pub struct ManifestLoader {
    fs_service: Arc<dyn FileSystemService>,
}

impl ManifestLoader {
    pub fn new(fs_service: Arc<dyn FileSystemService>) -> Self {
        Self { fs_service }
    }

    pub async fn load(&self, config: &BuildConfig) -> Result<Compilation> {
        let manifest_path = resolve_against(&config.root, &config.manifest);
        Logger::debug(&format!("Loading manifest from {}", manifest_path.display()));

        let json = self.fs_service.read_file(&manifest_path).await.map_err(|e| {
            PurgeError::manifest_with_context(
                format!("Cannot read build manifest: {}", e),
                ErrorContext::new().with_file(manifest_path.clone()),
            )
        })?;
        let manifest = Manifest::parse(&json)?;
        self.assemble(manifest, config).await
    }

    pub async fn assemble(&self, manifest: Manifest, config: &BuildConfig) -> Result<Compilation> {
        let mut compilation = Compilation::new();

        for chunk in manifest.chunks {
            compilation.add_chunk(Chunk {
                id: chunk.id,
                runtime: chunk.runtime,
                files: chunk.files,
                entry_module: chunk.entry_module,
                modules: chunk.modules,
            });
        }

        for module in manifest.modules {
            let module_type = ModuleType::from_tag(&module.module_type);
            let resource = module
                .resource
                .as_deref()
                .map(|r| resolve_against(&config.root, r));
            let context = module
                .context
                .as_deref()
                .map(|c| resolve_against(&config.root, c));

            let mut source_module = SourceModule {
                id: module.id,
                module_type,
                resource,
                context,
                source: String::new(),
            };

            source_module.source = match module.source {
                Some(source) => source,
                None if source_module.is_usage_candidate() => {
                    let path = source_module.resource.clone().unwrap_or_default();
                    self.fs_service.read_file(&path).await.map_err(|e| {
                        PurgeError::manifest_with_context(
                            format!("Cannot read module {}: {}", source_module.id, e),
                            ErrorContext::new().with_file(path.clone()),
                        )
                    })?
                }
                None => String::new(),
            };

            compilation.add_module(source_module);
        }

        for asset in manifest.assets {
            compilation.emit_asset(asset.name, asset.source);
        }

        let chunk_styles: Vec<(String, String)> = compilation
            .chunks()
            .iter()
            .flat_map(|chunk| {
                chunk
                    .files
                    .iter()
                    .filter(|file| file.ends_with(STYLESHEET_EXTENSION))
                    .map(|file| (chunk.id.clone(), file.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();

        for (chunk_id, file) in chunk_styles {
            if compilation.asset(&file).is_some() {
                continue;
            }
            let path = config.outdir.join(&file);
            let source = self.fs_service.read_file(&path).await.map_err(|e| {
                PurgeError::manifest_with_context(
                    format!("Cannot read emitted stylesheet: {}", e),
                    ErrorContext::new()
                        .with_chunk(chunk_id)
                        .with_asset(file.clone())
                        .with_file(path.clone()),
                )
            })?;
            compilation.emit_asset(file, source);
        }

        Ok(compilation)
    }
}
