// Core domain layer
pub mod models;
pub mod interfaces;
pub mod plugin;
pub mod resolver;
pub mod services;

pub use models::*;
pub use interfaces::*;
pub use resolver::*;
pub use services::*;
