// Purge plugin: trims every emitted stylesheet to the selectors its entry uses

use crate::core::interfaces::CssPurger;
use crate::core::models::{Compilation, PurgeOptions, PurgeReport};
use crate::core::plugin::{Plugin, PluginContext};
use crate::core::services::SelectorReducer;
use crate::infrastructure::LightningCssPurger;
use crate::utils::{Logger, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub const PLUGIN_NAME: &str = "tailwind-purge";

/// Runs the selector reduction pass in the additional-assets hook
///
/// # Example
/// ```
/// use tailpurge::plugins::TailwindPurgePlugin;
/// use tailpurge::core::models::PurgeOptions;
///
/// let plugin = TailwindPurgePlugin::new(PurgeOptions::new().with_safelist(["html", "body"]));
/// assert_eq!(plugin.options().safelist.len(), 2);
/// ```
pub struct TailwindPurgePlugin {
    reducer: SelectorReducer,
}

impl TailwindPurgePlugin {
    pub fn new(options: PurgeOptions) -> Self {
        Self::with_purger(Arc::new(LightningCssPurger::new()), options)
    }

    pub fn with_purger(purger: Arc<dyn CssPurger>, options: PurgeOptions) -> Self {
        Self {
            reducer: SelectorReducer::new(purger, options),
        }
    }

    pub fn options(&self) -> &PurgeOptions {
        self.reducer.options()
    }
}

#[async_trait]
impl Plugin for TailwindPurgePlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn on_build_start(&self, _context: &PluginContext) -> Result<()> {
        let options = self.reducer.options();
        Logger::debug(&format!(
            "{}: strategy {:?}, {} safelist / {} blocklist / {} variable entries",
            PLUGIN_NAME,
            options.strategy,
            options.safelist.len(),
            options.blocklist.len(),
            options.variables.len()
        ));
        Ok(())
    }

    async fn additional_assets(
        &self,
        compilation: &mut Compilation,
        _context: &PluginContext,
    ) -> Result<Option<PurgeReport>> {
        let report = self.reducer.run(compilation).await?;
        Ok(Some(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{BuildConfig, Chunk, SourceModule};

    #[test]
    fn test_plugin_name() {
        let plugin = TailwindPurgePlugin::new(PurgeOptions::new());
        assert_eq!(plugin.name(), "tailwind-purge");
    }

    #[tokio::test]
    async fn test_additional_assets_purges() {
        let plugin = TailwindPurgePlugin::new(PurgeOptions::new());
        let mut compilation = Compilation::new()
            .with_chunk(
                Chunk::new("one")
                    .with_files(vec!["one.css".to_string()])
                    .with_entry_module("/test/one/index.js"),
            )
            .with_module(SourceModule::javascript("/test/one/index.js", "el.className = 'card';"))
            .with_asset("one.css", ".card { padding: 1rem; } .modal { z-index: 10; }");

        let context = PluginContext::new(BuildConfig::default());
        let report = plugin
            .additional_assets(&mut compilation, &context)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.assets.len(), 1);
        let css = &compilation.asset("one.css").unwrap().source;
        assert!(css.contains(".card"));
        assert!(!css.contains(".modal"));
    }
}
