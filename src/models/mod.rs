pub mod config;
pub mod detection;
pub mod effect;
pub mod roi;
