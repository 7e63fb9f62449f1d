use crate::models::config::Strictness;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const ORDINALS: [&str; 5] = ["first", "second", "third", "fourth", "fifth"];

fn roll_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"roll(?:s)?\s*a\s*(\d+)").unwrap())
}

fn add_up_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"add(?:s)?\s*up\s*to\s*(\d+)").unwrap())
}

/// Decides whether a parsed condition holds for the current dice.
///
/// Rules are checked in a fixed order; the first one whose keyword appears
/// in the condition decides the outcome. A condition no rule understands is
/// treated as satisfied by default so an OCR misread never silently zeroes
/// a bonus - `Strictness::FailClosed` flips that.
#[derive(Debug, Clone)]
pub struct ConditionEvaluator {
    strictness: Strictness,
}

impl ConditionEvaluator {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    pub fn evaluate(&self, condition: &str, dice: &[u8]) -> bool {
        let text = condition.trim().to_lowercase();
        if text.is_empty() {
            return true;
        }
        // "Prevents ..." describes a passive shield, always in force
        if text.starts_with("prevents") {
            return true;
        }

        let targets = extract_targets(&text);

        if text.contains("match") {
            return check_match(&targets, dice);
        }
        if let Some(caps) = roll_re().captures(&text) {
            let value: u8 = match caps[1].parse() {
                Ok(v) => v,
                Err(_) => return self.fallback(condition),
            };
            return check_roll(&targets, dice, value);
        }
        if let Some(caps) = add_up_re().captures(&text) {
            let total: u32 = match caps[1].parse() {
                Ok(v) => v,
                Err(_) => return self.fallback(condition),
            };
            return check_sum(&targets, dice, total);
        }
        if text.contains("consecutive") {
            return check_consecutive(&targets, dice);
        }
        // Parity needs the full phrase; a bare "even"/"odd" substring
        // ("prevents", "seventh") is not a parity clause
        if text.contains("even number") {
            return check_parity(&targets, dice, 0);
        }
        if text.contains("odd number") {
            return check_parity(&targets, dice, 1);
        }

        self.fallback(condition)
    }

    fn fallback(&self, condition: &str) -> bool {
        debug!(condition, "unrecognized condition, applying strictness default");
        matches!(self.strictness, Strictness::FailOpen)
    }
}

/// Which dice a condition talks about, as zero-based indices.
fn extract_targets(text: &str) -> Vec<usize> {
    if text.contains("all three") || text.contains("all 3") || text.contains("the three") {
        return vec![0, 1, 2];
    }

    let mut targets: Vec<usize> = Vec::new();
    for (index, ordinal) in ORDINALS.iter().enumerate() {
        if text.contains(ordinal) && !targets.contains(&index) {
            targets.push(index);
        }
    }
    if targets.is_empty() && (add_up_re().is_match(text) || text.contains("consecutive")) {
        // Aggregate conditions default to the whole roll
        return vec![0, 1, 2];
    }
    targets
}

/// Values of the target dice, or None when any target is missing.
fn target_values(targets: &[usize], dice: &[u8]) -> Option<Vec<u8>> {
    targets.iter().map(|&i| dice.get(i).copied()).collect()
}

fn check_match(targets: &[usize], dice: &[u8]) -> bool {
    if targets.len() < 2 {
        return false;
    }
    match target_values(targets, dice) {
        Some(values) => values.windows(2).all(|w| w[0] == w[1]),
        None => false,
    }
}

fn check_roll(targets: &[usize], dice: &[u8], value: u8) -> bool {
    if targets.is_empty() {
        return dice.contains(&value);
    }
    match target_values(targets, dice) {
        Some(values) => values.iter().all(|&v| v == value),
        None => false,
    }
}

fn check_sum(targets: &[usize], dice: &[u8], total: u32) -> bool {
    match target_values(targets, dice) {
        Some(values) => values.iter().map(|&v| v as u32).sum::<u32>() >= total,
        None => false,
    }
}

fn check_consecutive(targets: &[usize], dice: &[u8]) -> bool {
    let Some(mut values) = target_values(targets, dice) else {
        return false;
    };
    if values.len() < 2 {
        return false;
    }
    values.sort_unstable();
    values.windows(2).all(|w| w[1] == w[0] + 1)
}

fn check_parity(targets: &[usize], dice: &[u8], remainder: u8) -> bool {
    if targets.is_empty() {
        return dice.iter().any(|&v| v % 2 == remainder);
    }
    match target_values(targets, dice) {
        Some(values) => !values.is_empty() && values.iter().all(|&v| v % 2 == remainder),
        None => false,
    }
}
