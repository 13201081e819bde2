use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{error::Error, lattice::PICK_RADIUS, persist::LoadPolicy};

/// Settings of an interactive deformation session.
///
/// Every field has a default, so a JSON config only needs to name the
/// settings it changes:
///
/// ```
/// use cagewarp::SessionConfig;
///
/// let config = SessionConfig::from_json_str(r#"{ "rows": 3, "load_policy": "strict" }"#)
///     .unwrap();
/// assert_eq!(config.rows, 3);
/// assert_eq!(config.cols, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Number of rows of control points.
    pub rows: usize,
    /// Number of columns of control points.
    pub cols: usize,
    /// Control points further than this from the pointer cannot be picked.
    pub pick_radius: f32,
    /// File used to save and load the control points.
    pub lattice_file: PathBuf,
    /// How strictly the lattice file is checked when loading.
    pub load_policy: LoadPolicy,
    /// Half height of the visible region in world units.
    pub view_extent: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            rows: 5,
            cols: 5,
            pick_radius: PICK_RADIUS,
            lattice_file: PathBuf::from("cps.txt"),
            load_policy: LoadPolicy::Permissive,
            view_extent: 1.1,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        let config: SessionConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.rows < 2 || self.cols < 2 {
            return Err(Error::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !(self.pick_radius > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "pick radius must be positive, got {}",
                self.pick_radius
            )));
        }
        if !(self.view_extent > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "view extent must be positive, got {}",
                self.view_extent
            )));
        }
        Ok(())
    }
}
