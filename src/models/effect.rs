use serde::{Deserialize, Serialize};

/// One scoring rule extracted from the attribute text.
///
/// `condition` is the free-text clause before the effect numbers; it is
/// re-interpreted against the current dice on every pass rather than being
/// compiled into an AST (OCR noise makes a rigid grammar brittle).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedEffect {
    pub raw_text: String,
    pub condition: String,
    pub dice_total_delta: i32,
    pub multiplier_delta: f64,
}

/// A parsed effect plus whether its condition holds for the current dice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluatedEffect {
    #[serde(flatten)]
    pub effect: ParsedEffect,
    pub is_active: bool,
}

/// Final score composition for one pass. Derived, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub base_sum: i32,
    pub total_bonus: i32,
    pub final_multiplier: f64,
    pub final_score: i64,
}
