pub mod analyzer;
pub mod capture;
pub mod condition;
pub mod detector;
pub mod matcher;
pub mod nms;
pub mod ocr;
pub mod rarity;
pub mod score;
pub mod templates;
pub mod tracker;
