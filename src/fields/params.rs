use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Discriminant of the field variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Flow,
    Starfield,
    Ball,
    Vortex,
    Pulse,
    Gradient,
    ColorCycle,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        FieldKind::Flow,
        FieldKind::Starfield,
        FieldKind::Ball,
        FieldKind::Vortex,
        FieldKind::Pulse,
        FieldKind::Gradient,
        FieldKind::ColorCycle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Flow => "flow",
            FieldKind::Starfield => "starfield",
            FieldKind::Ball => "ball",
            FieldKind::Vortex => "vortex",
            FieldKind::Pulse => "pulse",
            FieldKind::Gradient => "gradient",
            FieldKind::ColorCycle => "color_cycle",
        }
    }

    /// Human-readable description of this field
    pub fn description(&self) -> &'static str {
        match self {
            FieldKind::Flow => "Three layered travelling sine waves, hue-mapped into a painterly flow",
            FieldKind::Starfield => "Depth-layered stars drifting left and respawning on the right",
            FieldKind::Ball => "A single ball bouncing off the walls, recoloring on every bounce",
            FieldKind::Vortex => "Material spiralling into a black event horizon, optional infalling objects",
            FieldKind::Pulse => "A pulsating vortex zooming into a bright core",
            FieldKind::Gradient => "Directional gradients added on top of each other with 8-bit wraparound flashes",
            FieldKind::ColorCycle => "Solid full-frame hue cycle",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = FieldKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown field '{}' (available: {})", s, names.join(", "))
            })
    }
}

/// Variant-specific parameters, tagged by [`FieldKind`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldParams {
    #[default]
    Flow,
    Starfield(StarfieldParams),
    Ball(BallParams),
    Vortex(VortexParams),
    Pulse,
    Gradient(GradientParams),
    ColorCycle,
}

impl FieldParams {
    /// Default parameters for the given kind
    pub fn defaults_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Flow => FieldParams::Flow,
            FieldKind::Starfield => FieldParams::Starfield(StarfieldParams::default()),
            FieldKind::Ball => FieldParams::Ball(BallParams::default()),
            FieldKind::Vortex => FieldParams::Vortex(VortexParams::default()),
            FieldKind::Pulse => FieldParams::Pulse,
            FieldKind::Gradient => FieldParams::Gradient(GradientParams::default()),
            FieldKind::ColorCycle => FieldParams::ColorCycle,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldParams::Flow => FieldKind::Flow,
            FieldParams::Starfield(_) => FieldKind::Starfield,
            FieldParams::Ball(_) => FieldKind::Ball,
            FieldParams::Vortex(_) => FieldKind::Vortex,
            FieldParams::Pulse => FieldKind::Pulse,
            FieldParams::Gradient(_) => FieldKind::Gradient,
            FieldParams::ColorCycle => FieldKind::ColorCycle,
        }
    }

    /// Check the parameters against the frame they will be drawn into
    pub fn validate(&self, width: u32, height: u32) -> Result<(), SessionError> {
        let kind = self.kind();
        let invalid = |name: &'static str, reason: String| SessionError::InvalidParameter {
            field: kind,
            name,
            reason,
        };

        match self {
            FieldParams::Starfield(p) => {
                if p.stars == 0 {
                    return Err(invalid("stars", "must be at least 1".to_string()));
                }
            }
            FieldParams::Ball(p) => {
                if p.radius < 2 {
                    return Err(invalid("radius", format!("must be at least 2 (got {})", p.radius)));
                }
                if u64::from(p.radius) * 2 > u64::from(width.min(height)) {
                    return Err(invalid(
                        "radius",
                        format!("a {}px ball does not fit in {}x{}", p.radius, width, height),
                    ));
                }
                if !p.speed.is_finite() || p.speed < 1.0 {
                    return Err(invalid("speed", format!("must be at least 1 px/s (got {})", p.speed)));
                }
            }
            FieldParams::Vortex(p) => {
                if p.infalling_objects && p.object_count == 0 {
                    return Err(invalid("object_count", "must be at least 1 when objects are enabled".to_string()));
                }
            }
            FieldParams::Gradient(p) => {
                if !p.segment_seconds.is_finite() || p.segment_seconds <= 0.0 {
                    return Err(invalid(
                        "segment_seconds",
                        format!("must be greater than zero (got {})", p.segment_seconds),
                    ));
                }
            }
            FieldParams::Flow | FieldParams::Pulse | FieldParams::ColorCycle => {}
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldParams {
    /// Number of stars alive at any time
    pub stars: usize,
}

impl Default for StarfieldParams {
    fn default() -> Self {
        Self { stars: 500 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallParams {
    /// Ball radius in pixels
    pub radius: u32,
    /// Speed in pixels per second
    pub speed: f32,
}

impl Default for BallParams {
    fn default() -> Self {
        Self { radius: 40, speed: 450.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VortexParams {
    /// Draw point objects falling into the horizon
    pub infalling_objects: bool,
    pub object_count: usize,
}

impl Default for VortexParams {
    fn default() -> Self {
        Self {
            infalling_objects: false,
            object_count: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientParams {
    /// Logical seconds between gradient additions
    pub segment_seconds: f64,
}

impl Default for GradientParams {
    fn default() -> Self {
        Self { segment_seconds: 4.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(kind.as_str().parse::<FieldKind>().unwrap(), kind);
            assert_eq!(FieldParams::defaults_for(kind).kind(), kind);
        }
        assert_eq!("color-cycle".parse::<FieldKind>().unwrap(), FieldKind::ColorCycle);
        assert!("plasma".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_ball_must_fit() {
        let params = FieldParams::Ball(BallParams { radius: 40, speed: 100.0 });
        assert!(params.validate(100, 100).is_ok());
        assert!(params.validate(100, 60).is_err());

        let tiny = FieldParams::Ball(BallParams { radius: 1, speed: 100.0 });
        assert!(tiny.validate(100, 100).is_err());
    }

    #[test]
    fn test_parameter_bounds() {
        let none = FieldParams::Starfield(StarfieldParams { stars: 0 });
        assert!(none.validate(64, 64).is_err());

        let gradient = FieldParams::Gradient(GradientParams { segment_seconds: 0.0 });
        assert!(gradient.validate(64, 64).is_err());

        let vortex = FieldParams::Vortex(VortexParams { infalling_objects: true, object_count: 0 });
        assert!(vortex.validate(64, 64).is_err());
        let vortex = FieldParams::Vortex(VortexParams { infalling_objects: false, object_count: 0 });
        assert!(vortex.validate(64, 64).is_ok());
    }
}
