use crate::models::effect::ParsedEffect;
use regex::Regex;
use std::sync::OnceLock;

/// Fragments shorter than this after trimming are OCR noise, not rules.
const MIN_FRAGMENT_LEN: usize = 5;

fn splitter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:if|prevents)\b").unwrap())
}

fn dice_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Dice\s*Total\s*[:;.]?\s*([+-]?\d+)").unwrap())
}

fn multiplier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Final\s*Multiplier\s*[:;.]?\s*\+?([\d.]+)").unwrap())
}

/// Parse recognized rule text into structured effects.
///
/// The text is cut into fragments before every "If"/"Prevents" keyword (the
/// leading fragment is kept so unconditional stat lines survive), short
/// noise fragments are dropped, and each remaining fragment yields one
/// effect with its condition text and stat deltas.
pub fn parse_effects(raw: &str) -> Vec<ParsedEffect> {
    let normalized = raw.replace(['\n', '\r'], " ");

    let mut boundaries = vec![0usize];
    for m in splitter().find_iter(&normalized) {
        if m.start() > 0 {
            boundaries.push(m.start());
        }
    }
    boundaries.push(normalized.len());

    boundaries
        .windows(2)
        .filter_map(|pair| {
            let fragment = normalized[pair[0]..pair[1]].trim();
            if fragment.len() < MIN_FRAGMENT_LEN {
                return None;
            }
            parse_fragment(fragment)
        })
        .collect()
}

fn parse_fragment(fragment: &str) -> Option<ParsedEffect> {
    let dice_match = dice_total_re().captures(fragment);
    let mult_match = multiplier_re().captures(fragment);

    // A fragment with no stat clause and no passive keyword is noise
    if dice_match.is_none() && mult_match.is_none() && !fragment.to_lowercase().contains("prevents")
    {
        return None;
    }

    let dice_total_delta = dice_match
        .as_ref()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok())
        .unwrap_or(0);
    let multiplier_delta = mult_match
        .as_ref()
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);

    // The condition is everything before the first stat clause
    let stat_start = [
        dice_match.as_ref().and_then(|c| c.get(0)).map(|m| m.start()),
        mult_match.as_ref().and_then(|c| c.get(0)).map(|m| m.start()),
    ]
    .into_iter()
    .flatten()
    .min()
    .unwrap_or(fragment.len());

    let condition = fragment[..stat_start]
        .trim()
        .trim_end_matches([':', ';', '.', ',', '-'])
        .trim()
        .to_string();

    Some(ParsedEffect {
        raw_text: fragment.to_string(),
        condition,
        dice_total_delta,
        multiplier_delta,
    })
}
