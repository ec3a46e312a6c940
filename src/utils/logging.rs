use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use std::time::Instant;

pub struct Logger;

impl Logger {
    /// Install the global subscriber. `RUST_LOG` overrides the default filter.
    pub fn init() {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("tailpurge=info"));

        // A second init (tests, embedding hosts) keeps the first subscriber
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }

    pub fn purge_start(root: &str, outdir: &str) {
        info!("🧹 tailpurge - CSS purge pass");
        info!("═══════════════════════════════════════");
        info!("📁 Root: {}", root);
        info!("📦 Output: {}", outdir);
    }

    pub fn found_assets(css_count: usize, chunk_count: usize, module_count: usize) {
        info!(
            "📦 Found {} CSS assets across {} chunks ({} modules)",
            css_count, chunk_count, module_count
        );
    }

    pub fn processing_asset(name: &str, chunk: &str, module_count: usize) {
        debug!("🎨 Purging {} (chunk {}, {} modules)", name, chunk, module_count);
    }

    pub fn runtime_fallback(chunk: &str, peer: &str, runtime: &str) {
        debug!(
            "↪️  Chunk {} has no entry module, using peer {} (runtime {})",
            chunk, peer, runtime
        );
    }

    pub fn asset_purged(name: &str, before: usize, after: usize) {
        info!("  • {}: {} → {} bytes", name, before, after);
    }

    pub fn pass_complete(asset_count: usize, build_time: std::time::Duration) {
        info!("✅ Purged {} CSS assets in {:.2?}", asset_count, build_time);
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }

    pub fn debug(msg: &str) {
        debug!("{}", msg);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱️  Completed: {} in {:.2?}", self.name, self.elapsed());
    }
}
