use crate::models::detection::{Rarity, SiteIcon, SiteKind};
use crate::models::effect::{EvaluatedEffect, ScoreBreakdown};

/// Flat dice-total bonus and multiplier contribution of one site icon.
pub fn site_effect(kind: SiteKind, rarity: Rarity) -> (i32, f64) {
    use Rarity::*;
    use SiteKind::*;
    match (kind, rarity) {
        (Bonus, Common) => (3, 0.0),
        (Bonus, Rare) => (6, 0.0),
        (Bonus, Epic) => (9, 0.0),
        (Bonus, Unique) => (12, 0.0),
        (Bonus, Legendry) => (15, 0.0),

        (BonusMultiplier, Common) => (1, 1.4),
        (BonusMultiplier, Rare) => (1, 1.6),
        (BonusMultiplier, Epic) => (1, 1.8),
        (BonusMultiplier, Unique) => (1, 2.0),
        (BonusMultiplier, Legendry) => (1, 2.2),

        (Multiplier, Common) => (0, 1.2),
        (Multiplier, Rare) => (0, 1.4),
        (Multiplier, Epic) => (0, 1.6),
        (Multiplier, Unique) => (0, 1.8),
        (Multiplier, Legendry) => (0, 2.0),

        (PenaltyMultiplier, Common) => (-1, 1.6),
        (PenaltyMultiplier, Rare) => (-1, 1.8),
        (PenaltyMultiplier, Epic) => (-1, 2.0),
        (PenaltyMultiplier, Unique) => (-1, 2.2),
        (PenaltyMultiplier, Legendry) => (-1, 2.4),
    }
}

/// Fold dice, site icons, and active rule effects into one breakdown.
///
/// Multipliers are additive among themselves; when nothing contributes a
/// multiplier the factor stays at 1.0. The final score truncates toward
/// negative infinity, matching the in-game display.
pub fn compose(dice: &[u8], sites: &[SiteIcon], effects: &[EvaluatedEffect]) -> ScoreBreakdown {
    let base_sum: i32 = dice.iter().map(|&v| v as i32).sum();

    let mut total_bonus = 0i32;
    let mut multiplier_sum = 0.0f64;

    for site in sites {
        let (bonus, multiplier) = site_effect(site.kind, site.rarity);
        total_bonus += bonus;
        multiplier_sum += multiplier;
    }
    for effect in effects.iter().filter(|e| e.is_active) {
        total_bonus += effect.effect.dice_total_delta;
        multiplier_sum += effect.effect.multiplier_delta;
    }

    let final_multiplier = if multiplier_sum > 0.0 {
        multiplier_sum
    } else {
        1.0
    };
    let final_score = ((base_sum + total_bonus) as f64 * final_multiplier).floor() as i64;

    ScoreBreakdown {
        base_sum,
        total_bonus,
        final_multiplier,
        final_score,
    }
}
