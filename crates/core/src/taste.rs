//! Taste preference analysis.
//!
//! Maps the two preference axes (X = light→heavy body, Y = fruity→smoky)
//! onto a named quadrant and a set of derived characteristics. Pure and
//! total: every input produces a profile, including absent coordinates.

use serde::{Serialize, Serializer};

/// Coordinates above this are assumed to be on the 0–300 pad scale the
/// front-end sends, rather than already normalized to 0–1.
const PAD_SCALE_MAX: f64 = 300.0;

const MIDPOINT: f64 = 0.5;
const SWEETNESS_FLOOR: f64 = 0.2;
const APPROACHABILITY_FLOOR: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quadrant {
    LightFruity,
    HeavyFruity,
    LightSmoky,
    HeavySmoky,
}

impl Quadrant {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LightFruity => "light & fruity",
            Self::HeavyFruity => "heavy & fruity",
            Self::LightSmoky => "light & smoky",
            Self::HeavySmoky => "heavy & smoky",
        }
    }
}

impl Serialize for Quadrant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Each value is normalized to 0–1 and derived deterministically from the
/// two axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TasteCharacteristics {
    pub sweetness: f64,
    pub smokiness: f64,
    pub richness: f64,
    pub complexity: f64,
    pub approachability: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TasteProfile {
    pub quadrant: Quadrant,
    pub characteristics: TasteCharacteristics,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PreferenceAnalyzer;

impl PreferenceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, taste_x: Option<f64>, taste_y: Option<f64>) -> TasteProfile {
        let x = normalize_axis(taste_x);
        let y = normalize_axis(taste_y);

        // Boundary values resolve to the ≥ branch: ties favor heavy/smoky.
        let quadrant = match (x < MIDPOINT, y < MIDPOINT) {
            (true, true) => Quadrant::LightFruity,
            (false, true) => Quadrant::HeavyFruity,
            (true, false) => Quadrant::LightSmoky,
            (false, false) => Quadrant::HeavySmoky,
        };

        let characteristics = TasteCharacteristics {
            sweetness: (1.0 - y).max(SWEETNESS_FLOOR),
            smokiness: y,
            richness: x,
            complexity: (x + y) / 2.0,
            approachability: (1.0 - x).max(APPROACHABILITY_FLOOR),
        };

        TasteProfile { quadrant, characteristics }
    }
}

/// Missing or non-finite coordinates default to the midpoint; pad-scale
/// values are brought down to 0–1 before clamping.
pub fn normalize_axis(value: Option<f64>) -> f64 {
    let Some(raw) = value else {
        return MIDPOINT;
    };
    if !raw.is_finite() {
        return MIDPOINT;
    }

    let scaled = if raw > 1.0 { raw / PAD_SCALE_MAX } else { raw };
    scaled.clamp(0.0, 1.0)
}
