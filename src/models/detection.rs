use serde::{Deserialize, Serialize};

/// Rarity tier of a site icon.
///
/// "Legendry" is the game's own spelling and is kept verbatim so template
/// ids round-trip against the asset catalog.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Unique,
    Legendry,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Unique,
        Rarity::Legendry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Unique => "Unique",
            Rarity::Legendry => "Legendry",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Common" => Some(Rarity::Common),
            "Rare" => Some(Rarity::Rare),
            "Epic" => Some(Rarity::Epic),
            "Unique" => Some(Rarity::Unique),
            "Legendry" => Some(Rarity::Legendry),
            _ => None,
        }
    }
}

/// Effect family of a site icon, named after its id token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SiteKind {
    /// "+" - flat dice total bonus
    Bonus,
    /// "+x" - small bonus plus multiplier
    BonusMultiplier,
    /// "x" - pure multiplier
    Multiplier,
    /// "-x" - dice total penalty traded for a larger multiplier
    PenaltyMultiplier,
}

impl SiteKind {
    pub const ALL: [SiteKind; 4] = [
        SiteKind::Bonus,
        SiteKind::BonusMultiplier,
        SiteKind::Multiplier,
        SiteKind::PenaltyMultiplier,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            SiteKind::Bonus => "+",
            SiteKind::BonusMultiplier => "+x",
            SiteKind::Multiplier => "x",
            SiteKind::PenaltyMultiplier => "-x",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "+" => Some(SiteKind::Bonus),
            "+x" => Some(SiteKind::BonusMultiplier),
            "x" => Some(SiteKind::Multiplier),
            "-x" => Some(SiteKind::PenaltyMultiplier),
            _ => None,
        }
    }
}

/// Identity of a reference template.
///
/// String form: `"1"`..`"6"` for die faces, `"S_<kind>_<rarity>"` for site
/// icons (e.g. `"S_+x_Epic"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Die(u8),
    Site { kind: SiteKind, rarity: Rarity },
}

impl TemplateKind {
    pub fn id(&self) -> String {
        match self {
            TemplateKind::Die(value) => value.to_string(),
            TemplateKind::Site { kind, rarity } => {
                format!("S_{}_{}", kind.token(), rarity.as_str())
            }
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        if let Some(rest) = id.strip_prefix("S_") {
            // Rarity is the last underscore segment; the kind token may
            // itself be multi-character ("+x", "-x").
            let (kind_token, rarity_str) = rest.rsplit_once('_')?;
            let kind = SiteKind::parse(kind_token)?;
            let rarity = Rarity::parse(rarity_str)?;
            Some(TemplateKind::Site { kind, rarity })
        } else {
            let value: u8 = id.parse().ok()?;
            if (1..=6).contains(&value) {
                Some(TemplateKind::Die(value))
            } else {
                None
            }
        }
    }

    pub fn is_site(&self) -> bool {
        matches!(self, TemplateKind::Site { .. })
    }
}

/// Axis-aligned box for a detection, in frame coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// Intersection-over-union with another box. Zero when disjoint.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) as f64 * (y2 - y1) as f64;
        let union = self.area() + other.area() - intersection;

        intersection / union
    }
}

/// Raw match above threshold, produced per (template, scale) pair and
/// consumed by NMS.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Candidate {
    pub template: TemplateKind,
    pub score: f32,
    pub bbox: BoundingBox,
    pub scale: f32,
}

/// A die face that survived NMS.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DieFace {
    pub value: u8,
    pub score: f32,
    pub bbox: BoundingBox,
    pub scale: f32,
}

/// A site icon that survived NMS.
///
/// `kind`/`rarity` come from the template identity, which is authoritative.
/// `sampled_color`/`sampled_rarity` are the mean color probe over the icon
/// center, kept for diagnostics only.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SiteIcon {
    pub kind: SiteKind,
    pub rarity: Rarity,
    pub score: f32,
    pub bbox: BoundingBox,
    pub scale: f32,
    pub sampled_color: [u8; 3],
    pub sampled_rarity: Rarity,
}

/// Sort detections ascending by x so that index 0 is the leftmost ("first")
/// die or site for every downstream consumer.
pub fn sort_left_to_right<T, F: Fn(&T) -> u32>(items: &mut [T], x_of: F) {
    items.sort_by_key(|item| x_of(item));
}
