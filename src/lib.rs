// tailpurge - per-entry CSS purge pass for bundler compilations

pub mod utils;
pub mod core;
pub mod infrastructure;
pub mod plugins;
pub mod cli;
