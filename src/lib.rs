//! Real-time score tracking for Mystic Frontier dice rounds.
//!
//! A tracking session grabs frames from a [`FrameSource`], finds the three
//! rolled dice and any site bonus icons by multi-scale template matching,
//! reads the round's rule text through an [`OcrEngine`], and folds it all
//! into a [`ScoreBreakdown`]. The heavy lifting lives in
//! [`services::analyzer`]; [`services::tracker`] wraps it in a background
//! loop with caching so steady frames cost almost nothing.

pub mod models;
pub mod services;

pub use models::config::{AnalyzerConfig, Strictness};
pub use models::detection::{DieFace, Rarity, SiteIcon, SiteKind};
pub use models::effect::{EvaluatedEffect, ParsedEffect, ScoreBreakdown};
pub use models::roi::{RegionLayout, Roi, RoiPct};
pub use services::analyzer::{AnalysisResult, AnalyzerSession};
pub use services::capture::FrameSource;
pub use services::ocr::{OcrEngine, OcrParams};
pub use services::templates::TemplateLibrary;
pub use services::tracker::{ScoreTracker, TrackerStats};

/// Install the default tracing subscriber. Call once at startup; a second
/// call is ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
