//! Color-family classification for fuzzy shape references.
//!
//! DESIGN
//! ======
//! One pure function maps a hex color to the family a user would name
//! ("the blue circle"), so every resolution layer shares the same
//! thresholds. Classification is channel-dominance based, not exact hex
//! equality: neutrals are detected by channel spread and brightness,
//! chromatic colors by which channels lead and by how much. Rules are
//! ordered; the first match wins.

use serde::{Deserialize, Serialize};

// =============================================================================
// THRESHOLDS
// =============================================================================

/// Channel spread (max − min) below which a color reads as neutral.
const NEUTRAL_SPREAD: i32 = 40;

/// Mean brightness at or below which a neutral reads as black.
const BLACK_MAX_AVG: i32 = 60;

/// Mean brightness at or above which a neutral reads as white.
const WHITE_MIN_AVG: i32 = 200;

/// Minimum lead one channel needs over another to count as dominant.
const DOMINANCE: i32 = 40;

/// Maximum red/green imbalance for a color to read as yellow.
const YELLOW_BALANCE: i32 = 60;

/// Minimum red lead over green for orange (red clearly ahead, green warm).
const ORANGE_RED_LEAD: i32 = 60;

/// Mean brightness at or above which a red-dominant color reads as pink.
const PINK_MIN_AVG: i32 = 160;

/// Minimum blue lead over green for a red-dominant color to read as pink.
const PINK_BLUE_LEAD: i32 = 50;

// =============================================================================
// FAMILY
// =============================================================================

/// The color families users name in fuzzy references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFamily {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Gray,
    Black,
    White,
}

impl ColorFamily {
    /// Parse a family token as it appears in user phrasing.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "red" => Some(Self::Red),
            "orange" => Some(Self::Orange),
            "yellow" => Some(Self::Yellow),
            "green" => Some(Self::Green),
            "blue" => Some(Self::Blue),
            "purple" => Some(Self::Purple),
            "pink" => Some(Self::Pink),
            "gray" | "grey" => Some(Self::Gray),
            "black" => Some(Self::Black),
            "white" => Some(Self::White),
            _ => None,
        }
    }

    /// Lowercase name, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Pink => "pink",
            Self::Gray => "gray",
            Self::Black => "black",
            Self::White => "white",
        }
    }
}

impl std::fmt::Display for ColorFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Classify a hex color (`"#RRGGBB"`, `"RRGGBB"`, or `"#RGB"`) into a
/// [`ColorFamily`]. Returns `None` when the string doesn't parse.
#[must_use]
pub fn classify_hex(hex: &str) -> Option<ColorFamily> {
    let (r, g, b) = parse_hex(hex)?;
    Some(classify_rgb(i32::from(r), i32::from(g), i32::from(b)))
}

fn classify_rgb(r: i32, g: i32, b: i32) -> ColorFamily {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let spread = max - min;
    let avg = (r + g + b) / 3;

    // Neutrals: little channel separation, bucketed by brightness.
    if spread < NEUTRAL_SPREAD {
        if avg <= BLACK_MAX_AVG {
            return ColorFamily::Black;
        }
        if avg >= WHITE_MIN_AVG {
            return ColorFamily::White;
        }
        return ColorFamily::Gray;
    }

    // Yellow: red and green in balance, both well clear of blue.
    if (r - g).abs() <= YELLOW_BALANCE && r.min(g) - b >= DOMINANCE {
        return ColorFamily::Yellow;
    }

    // Orange: red clearly ahead of green, green still clearly warm of blue.
    if r - g >= ORANGE_RED_LEAD && g - b >= DOMINANCE {
        return ColorFamily::Orange;
    }

    // Purple: red and blue both clear of green, blue holding its own.
    if r - g >= DOMINANCE && b - g >= DOMINANCE && b >= r - DOMINANCE {
        return ColorFamily::Purple;
    }

    // Red-dominant: pink when light or noticeably blue-tinted, else red.
    if r - g >= DOMINANCE && r - b >= DOMINANCE {
        if avg >= PINK_MIN_AVG || b - g >= PINK_BLUE_LEAD {
            return ColorFamily::Pink;
        }
        return ColorFamily::Red;
    }

    if g - r >= DOMINANCE && g - b >= DOMINANCE {
        return ColorFamily::Green;
    }

    if b - r >= DOMINANCE && b - g >= DOMINANCE {
        return ColorFamily::Blue;
    }

    // Mixed hues (teal, cyan): fall back to the strongest channel.
    if b >= g && b >= r {
        ColorFamily::Blue
    } else if g >= r {
        ColorFamily::Green
    } else {
        ColorFamily::Red
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    match digits.len() {
        6 => {
            let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
            let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
            let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
            Some((r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&digits[0..1], 16).ok()?;
            let g = u8::from_str_radix(&digits[1..2], 16).ok()?;
            let b = u8::from_str_radix(&digits[2..3], 16).ok()?;
            // Expand each nibble: "F" -> 0xFF.
            Some((r * 17, g * 17, b * 17))
        }
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================
