// Maps a stylesheet asset to the source modules whose text counts as usage

use crate::core::models::{Chunk, Compilation, FileMembership, ResolutionStrategy, SourceModule};
use crate::utils::{Logger, PurgeError, Result};
use std::path::{Path, PathBuf};

/// Modules resolved for one stylesheet
#[derive(Debug)]
pub struct Resolution<'a> {
    pub chunk: &'a Chunk,
    /// Grouping context; `None` under the chunk-modules strategy
    pub context: Option<PathBuf>,
    pub modules: Vec<&'a SourceModule>,
}

pub struct ContextResolver {
    strategy: ResolutionStrategy,
}

impl ContextResolver {
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self { strategy }
    }

    pub fn resolve<'a>(&self, compilation: &'a Compilation, asset: &str) -> Result<Resolution<'a>> {
        let chunk = Self::owning_chunk(compilation, asset)?;

        let (context, modules) = match self.strategy {
            ResolutionStrategy::Context => {
                let context = Self::grouping_context(compilation, chunk, asset)?;
                let modules = Self::modules_in_context(compilation, &context);
                (Some(context.to_path_buf()), modules)
            }
            ResolutionStrategy::ChunkModules => (None, Self::modules_in_chunk(compilation, chunk)),
        };

        if modules.is_empty() {
            let scope = match &context {
                Some(context) => format!("context {}", context.display()),
                None => format!("chunk {}", chunk.id),
            };
            return Err(PurgeError::resolution(
                asset,
                format!("no source modules found in {}", scope),
            ));
        }

        Ok(Resolution {
            chunk,
            context,
            modules,
        })
    }

    /// First chunk in registration order whose files include `asset`
    pub fn owning_chunk<'a>(compilation: &'a Compilation, asset: &str) -> Result<&'a Chunk> {
        compilation
            .chunks()
            .iter()
            .find(|chunk| chunk.files.contains_file(asset))
            .ok_or_else(|| PurgeError::resolution(asset, "no chunk lists this file"))
    }

    /// Context of the chunk's entry module, or of the first peer chunk on the
    /// same runtime that has one.
    pub fn grouping_context<'a>(
        compilation: &'a Compilation,
        chunk: &'a Chunk,
        asset: &str,
    ) -> Result<&'a Path> {
        let owner = match chunk.entry_module {
            Some(_) => chunk,
            None => {
                let runtime = chunk.runtime.as_deref().ok_or_else(|| {
                    PurgeError::resolution(
                        asset,
                        format!("chunk {} has no entry module and no runtime", chunk.id),
                    )
                })?;
                let peer = compilation
                    .chunks()
                    .iter()
                    .filter(|peer| !std::ptr::eq(*peer, chunk))
                    .find(|peer| {
                        peer.entry_module.is_some() && peer.runtime.as_deref() == Some(runtime)
                    })
                    .ok_or_else(|| {
                        PurgeError::resolution(
                            asset,
                            format!(
                                "chunk {} has no entry module and no peer on runtime {}",
                                chunk.id, runtime
                            ),
                        )
                    })?;
                Logger::runtime_fallback(&chunk.id, &peer.id, runtime);
                peer
            }
        };

        let entry_id = owner.entry_module.as_deref().unwrap_or_default();
        let entry = compilation.module(entry_id).ok_or_else(|| {
            PurgeError::resolution(
                asset,
                format!("entry module {} of chunk {} is not registered", entry_id, owner.id),
            )
        })?;

        entry.context().ok_or_else(|| {
            PurgeError::resolution(
                asset,
                format!("entry module {} has no context", entry_id),
            )
        })
    }

    fn modules_in_context<'a>(compilation: &'a Compilation, context: &Path) -> Vec<&'a SourceModule> {
        compilation
            .modules()
            .iter()
            .filter(|module| module.context() == Some(context))
            .filter(|module| module.is_usage_candidate())
            .collect()
    }

    fn modules_in_chunk<'a>(compilation: &'a Compilation, chunk: &Chunk) -> Vec<&'a SourceModule> {
        chunk
            .modules
            .iter()
            .filter_map(|id| compilation.module(id))
            .filter(|module| module.is_usage_candidate())
            .collect()
    }
}
