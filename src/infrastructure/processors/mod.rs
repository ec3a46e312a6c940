// Processors module
pub mod css_processor;
pub mod extractor;
pub mod selector;

pub use css_processor::*;
pub use extractor::*;
pub use selector::*;
