// Built-in plugins

pub mod purge_plugin;
pub mod stats_plugin;

pub use purge_plugin::TailwindPurgePlugin;
pub use stats_plugin::StatsPlugin;
