use serde::{Deserialize, Serialize};

use layers::labels::{LabelSpec, default_labels};
use scene::orbit::OrbitSettings;
use scene::prefabs::{GlobeStyle, LightingStyle, MarkerStyle, StarfieldStyle};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
    pub position: [f64; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 45.0,
            near: 0.1,
            far: 200.0,
            position: [0.0, 0.0, 4.0],
        }
    }
}

/// Everything tunable about the globe viewer.
///
/// Missing JSON fields fall back to the defaults, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub camera: CameraConfig,
    pub globe: GlobeStyle,
    pub markers: MarkerStyle,
    pub lighting: LightingStyle,
    pub stars: StarfieldStyle,
    pub orbit: OrbitSettings,
    pub labels: Vec<LabelSpec>,
    pub rotation_speed_rad_per_s: f64,
    /// Radius of the pick volume around each marker.
    pub hit_radius: f64,
    /// Markers behind the globe cannot be picked. Defaults to on; the
    /// original page raycast markers alone and so also picked far-side ones.
    /// Set to `false` to get that behavior back.
    pub occlude_far_side: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            globe: GlobeStyle::default(),
            markers: MarkerStyle::default(),
            lighting: LightingStyle::default(),
            stars: StarfieldStyle::default(),
            orbit: OrbitSettings::default(),
            labels: default_labels(),
            rotation_speed_rad_per_s: 0.1,
            hit_radius: 0.05,
            occlude_far_side: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "config is not valid JSON: {e}"),
            ConfigError::Invalid { field, reason } => write!(f, "config field `{field}` {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

fn positive(field: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be finite and > 0, got {v}"),
        })
    }
}

fn finite(field: &'static str, v: &[f64]) -> Result<(), ConfigError> {
    if v.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be finite, got {v:?}"),
        })
    }
}

impl ViewerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        if !(cam.fov_y_deg > 0.0 && cam.fov_y_deg < 180.0) {
            return Err(ConfigError::Invalid {
                field: "camera.fov_y_deg",
                reason: format!("must lie in (0, 180), got {}", cam.fov_y_deg),
            });
        }
        positive("camera.near", cam.near)?;
        positive("camera.far", cam.far)?;
        if cam.far <= cam.near {
            return Err(ConfigError::Invalid {
                field: "camera.far",
                reason: format!("must exceed near ({}), got {}", cam.near, cam.far),
            });
        }
        finite("camera.position", &cam.position)?;
        if cam.position == [0.0; 3] {
            return Err(ConfigError::Invalid {
                field: "camera.position",
                reason: "must not sit at the globe center".to_string(),
            });
        }

        positive("globe.radius", self.globe.radius)?;
        if self.globe.segments < 3 {
            return Err(ConfigError::Invalid {
                field: "globe.segments",
                reason: format!("needs at least 3, got {}", self.globe.segments),
            });
        }
        positive("markers.altitude_radius", self.markers.altitude_radius)?;
        positive("markers.size", self.markers.size)?;
        positive("hit_radius", self.hit_radius)?;
        finite("lighting.directional_position", &self.lighting.directional_position)?;
        positive("stars.spread", self.stars.spread)?;
        positive("stars.size", self.stars.size)?;
        finite("rotation_speed_rad_per_s", &[self.rotation_speed_rad_per_s])?;

        let orbit = &self.orbit;
        if !(orbit.damping_factor > 0.0 && orbit.damping_factor <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "orbit.damping_factor",
                reason: format!("must lie in (0, 1], got {}", orbit.damping_factor),
            });
        }
        if !(orbit.zoom_scale > 0.0 && orbit.zoom_scale < 1.0) {
            return Err(ConfigError::Invalid {
                field: "orbit.zoom_scale",
                reason: format!("must lie in (0, 1), got {}", orbit.zoom_scale),
            });
        }
        positive("orbit.min_distance", orbit.min_distance)?;
        if orbit.max_distance < orbit.min_distance {
            return Err(ConfigError::Invalid {
                field: "orbit.max_distance",
                reason: format!("must be >= min_distance ({}), got {}", orbit.min_distance, orbit.max_distance),
            });
        }

        for label in &self.labels {
            positive("labels.size", label.size)?;
            finite("labels.position", &label.position)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ViewerConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.position, [0.0, 0.0, 4.0]);
        assert_eq!(config.stars.count, 2000);
        assert_eq!(config.labels.len(), 3);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ViewerConfig::from_json_str(r#"{"rotation_speed_rad_per_s": 0.25, "camera": {"fov_y_deg": 60}}"#).unwrap();
        assert_eq!(config.rotation_speed_rad_per_s, 0.25);
        assert_eq!(config.camera.fov_y_deg, 60.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.markers.altitude_radius, 1.01);
    }

    #[test]
    fn rejects_bad_values() {
        let err = ViewerConfig::from_json_str(r#"{"camera": {"near": 5, "far": 1}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "camera.far", .. }));

        let err = ViewerConfig::from_json_str(r#"{"hit_radius": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "hit_radius", .. }));

        let err = ViewerConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn parse_error_keeps_json_source() {
        let err = ViewerConfig::from_json_str(r#"{"hit_radius": "wide"}"#).unwrap_err();
        let source = std::error::Error::source(&err).expect("json error as source");
        let json = source.downcast_ref::<serde_json::Error>().expect("serde_json::Error");
        assert_eq!(json.line(), 1);
        assert!(err.to_string().starts_with("config is not valid JSON"));
    }
}
