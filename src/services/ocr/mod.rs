pub mod engine;
pub mod parser;
pub mod preprocess;

pub use engine::{OcrEngine, OcrParams};
pub use parser::parse_effects;
pub use preprocess::TextPreprocessor;
