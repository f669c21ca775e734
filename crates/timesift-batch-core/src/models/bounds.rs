//! Geographic bounding box of a site.
//!
//! The four coordinates are kept in the order they were authored and are
//! never reordered or normalized. Job files in the wild mix a
//! west/south/east/north convention with an upper-left/lower-right one, so
//! orientation is reported by [`crate::validation`] instead of being fixed
//! here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered 4-tuple `(west, south, east, north)` as labelled by the job file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bounds([f64; 4]);

impl Bounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self([west, south, east, north])
    }

    pub fn west(&self) -> f64 {
        self.0[0]
    }

    pub fn south(&self) -> f64 {
        self.0[1]
    }

    pub fn east(&self) -> f64 {
        self.0[2]
    }

    pub fn north(&self) -> f64 {
        self.0[3]
    }

    pub fn as_array(&self) -> [f64; 4] {
        self.0
    }

    /// Render each coordinate for the command line.
    ///
    /// Uses the shortest representation that parses back to the same `f64`,
    /// so the pipeline receives exactly the authored values.
    pub fn to_args(&self) -> Vec<String> {
        self.0.iter().map(|c| c.to_string()).collect()
    }

    /// Check that the box has a non-zero extent and finite coordinates.
    pub fn check_degenerate(&self) -> Result<(), String> {
        if let Some(c) = self.0.iter().find(|c| !c.is_finite()) {
            return Err(format!("coordinate {} is not finite", c));
        }
        if self.west() == self.east() {
            return Err("longitude extent is zero".to_string());
        }
        if self.south() == self.north() {
            return Err("latitude extent is zero".to_string());
        }
        Ok(())
    }

    /// West coordinate is greater than east
    pub fn is_longitude_inverted(&self) -> bool {
        self.west() > self.east()
    }

    /// South coordinate is greater than north, as in upper-left/lower-right ordering
    pub fn is_latitude_inverted(&self) -> bool {
        self.south() > self.north()
    }
}

impl From<[f64; 4]> for Bounds {
    fn from(coords: [f64; 4]) -> Self {
        Self(coords)
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.west(),
            self.south(),
            self.east(),
            self.north()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_accessors_keep_authored_order() {
        let bounds = Bounds::new(-121.94, 48.84, -121.70, 48.70);
        assert_eq!(bounds.west(), -121.94);
        assert_eq!(bounds.south(), 48.84);
        assert_eq!(bounds.east(), -121.70);
        assert_eq!(bounds.north(), 48.70);
        assert_eq!(bounds.as_array(), [-121.94, 48.84, -121.70, 48.70]);
    }

    #[test]
    fn test_to_args() {
        let bounds = Bounds::new(-121.94, 48.84, -121.70, 48.70);
        assert_eq!(bounds.to_args(), vec!["-121.94", "48.84", "-121.7", "48.7"]);
    }

    #[test]
    fn test_orientation_flags() {
        let upper_left_lower_right = Bounds::new(-121.94, 48.84, -121.70, 48.70);
        assert!(!upper_left_lower_right.is_longitude_inverted());
        assert!(upper_left_lower_right.is_latitude_inverted());

        let swapped = Bounds::new(-121.70, 48.70, -121.94, 48.84);
        assert!(swapped.is_longitude_inverted());
        assert!(!swapped.is_latitude_inverted());
    }

    #[test]
    fn test_degenerate_bounds() {
        assert!(Bounds::new(-121.9, 48.7, -121.7, 48.8).check_degenerate().is_ok());
        assert!(Bounds::new(-121.9, 48.7, -121.9, 48.8).check_degenerate().is_err());
        assert!(Bounds::new(-121.9, 48.7, -121.7, 48.7).check_degenerate().is_err());
        assert!(Bounds::new(f64::NAN, 48.7, -121.7, 48.8).check_degenerate().is_err());
        assert!(Bounds::new(-121.9, f64::INFINITY, -121.7, 48.8).check_degenerate().is_err());
    }

    #[test]
    fn test_deserialize_from_array() {
        let bounds: Bounds = serde_json::from_str("[-121.94, 48.84, -121.70, 48.70]").unwrap();
        assert_eq!(bounds, Bounds::new(-121.94, 48.84, -121.70, 48.70));
        assert!(serde_json::from_str::<Bounds>("[1.0, 2.0, 3.0]").is_err());
    }

    proptest! {
        #[test]
        fn prop_args_parse_back_to_same_coordinates(
            w in -180.0f64..180.0,
            s in -90.0f64..90.0,
            e in -180.0f64..180.0,
            n in -90.0f64..90.0,
        ) {
            let bounds = Bounds::new(w, s, e, n);
            let parsed: Vec<f64> = bounds
                .to_args()
                .iter()
                .map(|a| a.parse::<f64>().unwrap())
                .collect();
            prop_assert_eq!(parsed, vec![w, s, e, n]);
        }
    }
}
