// Stats Plugin: Logs per-stylesheet purge statistics

use crate::core::models::PurgeReport;
use crate::core::plugin::{Plugin, PluginContext};
use crate::utils::{Logger, Result};

/// Plugin that logs how much each stylesheet shrank
///
/// # Example
/// ```
/// use tailpurge::plugins::StatsPlugin;
///
/// let plugin = StatsPlugin::new(true); // verbose = true
/// assert!(plugin.is_verbose());
/// ```
pub struct StatsPlugin {
    verbose: bool,
}

impl StatsPlugin {
    /// Create a new stats plugin
    ///
    /// # Arguments
    /// * `verbose` - If true, also logs the rejected selectors
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[async_trait::async_trait]
impl Plugin for StatsPlugin {
    fn name(&self) -> &str {
        "stats-plugin"
    }

    fn on_build_start(&self, context: &PluginContext) -> Result<()> {
        if self.verbose {
            Logger::info("📊 Stats Plugin: Purge started");
            Logger::info(&format!("  Root: {}", context.root.display()));
            Logger::info(&format!("  Output: {}", context.config.outdir.display()));
            Logger::info(&format!("  Dry run: {}", context.config.dry_run));
        }
        Ok(())
    }

    fn on_build_end(&self, _context: &PluginContext, report: &PurgeReport) -> Result<()> {
        Logger::info("📊 Stats Plugin: Purge Statistics");
        Logger::info(&format!("  ⚡ Time: {:?}", report.build_time));
        Logger::info(&format!("  🎨 CSS assets: {}", report.assets.len()));

        for (i, asset) in report.assets.iter().enumerate() {
            Logger::info(&format!(
                "     {}. {} [{}] {} → {} bytes (-{:.1}%, {} modules)",
                i + 1,
                asset.name,
                asset.chunk,
                asset.before_bytes,
                asset.after_bytes,
                asset.reduction_percentage(),
                asset.module_count
            ));

            if self.verbose && !asset.rejected.is_empty() {
                Logger::info(&format!("        rejected: {}", asset.rejected.join(", ")));
            }
        }

        Ok(())
    }
}
