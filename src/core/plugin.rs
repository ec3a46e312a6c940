// Plugin host for the purge pass
// Hooks run in registration order; the first error stops the build

use crate::core::models::{BuildConfig, Compilation, PurgeReport};
use crate::utils::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Context provided to plugins during execution
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// Project root directory
    pub root: PathBuf,
    /// Current build configuration
    pub config: BuildConfig,
}

impl PluginContext {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            root: config.root.clone(),
            config,
        }
    }
}

/// Main plugin trait that all plugins must implement
///
/// Plugins can hook into three stages of a build:
/// - Build start
/// - Additional assets (after emission, before anything is written)
/// - Build end
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique name for this plugin
    fn name(&self) -> &str;

    /// Called at the start of a build
    fn on_build_start(&self, _context: &PluginContext) -> Result<()> {
        Ok(())
    }

    /// Called once all assets are emitted. Plugins may rewrite assets here.
    ///
    /// Return a report when the plugin changed stylesheets.
    async fn additional_assets(
        &self,
        _compilation: &mut Compilation,
        _context: &PluginContext,
    ) -> Result<Option<PurgeReport>> {
        Ok(None)
    }

    /// Called after every plugin has processed the assets
    fn on_build_end(&self, _context: &PluginContext, _report: &PurgeReport) -> Result<()> {
        Ok(())
    }
}

/// Manages plugin registration and execution
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginManager {
    /// Create a new empty plugin manager
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Register a plugin
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    /// Get number of registered plugins
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Execute on_build_start hook for all plugins
    pub fn on_build_start(&self, context: &PluginContext) -> Result<()> {
        for plugin in &self.plugins {
            plugin.on_build_start(context)?;
        }
        Ok(())
    }

    /// Execute additional_assets for all plugins, one after another.
    /// Reports from several plugins are concatenated.
    pub async fn additional_assets(
        &self,
        compilation: &mut Compilation,
        context: &PluginContext,
    ) -> Result<PurgeReport> {
        let mut report = PurgeReport::default();
        for plugin in &self.plugins {
            if let Some(partial) = plugin.additional_assets(compilation, context).await? {
                report.assets.extend(partial.assets);
                report.build_time += partial.build_time;
            }
        }
        Ok(report)
    }

    /// Execute on_build_end hook for all plugins
    pub fn on_build_end(&self, context: &PluginContext, report: &PurgeReport) -> Result<()> {
        for plugin in &self.plugins {
            plugin.on_build_end(context, report)?;
        }
        Ok(())
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
