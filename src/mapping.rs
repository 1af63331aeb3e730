//! Range mapping from openness commands to servo positions.
//!
//! The mapping is plain integer arithmetic with truncating division:
//!
//! ```text
//! out_min + (value - in_min) * (out_max - out_min) / (in_max - in_min)
//! ```
//!
//! Truncation means some mid-scale values land one degree lower than a
//! rounded mapping would. That precision loss is part of the contract and
//! keeps positions identical to the servo travel users have calibrated
//! their blinds against.
//!
//! # Example
//!
//! ```rust
//! use smart_blinds::mapping::{map_to_actuator, ActuatorPosition, InputScale, RangeMap};
//!
//! assert_eq!(map_to_actuator(255, 0, 255, 0, 160), Ok(160));
//! assert_eq!(map_to_actuator(128, 0, 255, 0, 160), Ok(80));
//!
//! let map = RangeMap::new(InputScale::BYTE, ActuatorPosition::MIN, ActuatorPosition::MAX).unwrap();
//! assert_eq!(map.map(255).degrees(), 160);
//! ```

use core::fmt;

/// Errors raised when a mapping range is unusable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MappingError {
    /// Input range has zero width (`in_min == in_max`).
    DegenerateInput,
    /// Input scale bounds are inverted (`min > max`).
    InvertedScale,
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingError::DegenerateInput => write!(f, "input range has zero width"),
            MappingError::InvertedScale => write!(f, "input scale minimum exceeds maximum"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MappingError {}

/// Map `value` from `[in_min, in_max]` onto `[out_min, out_max]`.
///
/// The intermediate product is computed in 64-bit so it cannot overflow for
/// any `i32` inputs. The result is clamped to the output range, so values
/// outside the input range saturate at the output endpoints.
///
/// # Errors
///
/// Returns [`MappingError::DegenerateInput`] when `in_min == in_max`.
pub fn map_to_actuator(
    value: i32,
    in_min: i32,
    in_max: i32,
    out_min: i32,
    out_max: i32,
) -> Result<i32, MappingError> {
    if in_min == in_max {
        return Err(MappingError::DegenerateInput);
    }

    let span_in = in_max as i64 - in_min as i64;
    let span_out = out_max as i64 - out_min as i64;
    let raw = out_min as i64 + (value as i64 - in_min as i64) * span_out / span_in;

    let (lo, hi) = if out_min <= out_max {
        (out_min, out_max)
    } else {
        (out_max, out_min)
    };
    Ok(raw.clamp(lo as i64, hi as i64) as i32)
}

// ============================================================================
// Input Scale
// ============================================================================

/// Inclusive scale openness commands are expressed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputScale {
    min: u32,
    max: u32,
}

impl InputScale {
    /// 0 to 100.
    pub const PERCENT: InputScale = InputScale { min: 0, max: 100 };

    /// 0 to 255, the scale Home Assistant uses for light brightness.
    pub const BYTE: InputScale = InputScale { min: 0, max: 255 };

    /// Create a custom scale.
    ///
    /// # Errors
    ///
    /// Rejects zero-width and inverted scales.
    pub fn new(min: u32, max: u32) -> Result<Self, MappingError> {
        if min == max {
            return Err(MappingError::DegenerateInput);
        }
        if min > max {
            return Err(MappingError::InvertedScale);
        }
        Ok(Self { min, max })
    }

    /// Lowest accepted value.
    pub const fn min(&self) -> u32 {
        self.min
    }

    /// Highest accepted value.
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Whether `value` lies within the scale.
    pub const fn contains(&self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for InputScale {
    fn default() -> Self {
        Self::BYTE
    }
}

// ============================================================================
// Actuator Position
// ============================================================================

/// Servo target angle in degrees, always within `[0, 160]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ActuatorPosition(u8);

impl ActuatorPosition {
    /// Fully closed.
    pub const MIN: ActuatorPosition = ActuatorPosition(0);

    /// Furthest travel the blind linkage allows.
    pub const MAX: ActuatorPosition = ActuatorPosition(160);

    /// Create a position, or `None` if `degrees` exceeds [`Self::MAX`].
    pub const fn new(degrees: u8) -> Option<Self> {
        if degrees <= Self::MAX.0 {
            Some(Self(degrees))
        } else {
            None
        }
    }

    /// Create a position, saturating at the valid range.
    pub fn saturating(degrees: i32) -> Self {
        Self(degrees.clamp(Self::MIN.0 as i32, Self::MAX.0 as i32) as u8)
    }

    /// Angle in degrees.
    pub const fn degrees(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ActuatorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Range Map
// ============================================================================

/// Prevalidated mapping from an [`InputScale`] onto servo travel.
///
/// Building the map checks the ranges once, so [`RangeMap::map`] cannot fail
/// at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeMap {
    input: InputScale,
    closed: ActuatorPosition,
    open: ActuatorPosition,
}

impl RangeMap {
    /// Build a map from `input` onto `closed..=open`.
    ///
    /// `open` may be lower than `closed` for servos mounted in reverse.
    pub fn new(
        input: InputScale,
        closed: ActuatorPosition,
        open: ActuatorPosition,
    ) -> Result<Self, MappingError> {
        let input = InputScale::new(input.min, input.max)?;
        Ok(Self {
            input,
            closed,
            open,
        })
    }

    /// Input scale this map accepts.
    pub fn input(&self) -> InputScale {
        self.input
    }

    /// Map an openness value to a servo position.
    pub fn map(&self, value: u32) -> ActuatorPosition {
        let value = value.min(i32::MAX as u32) as i32;
        let mapped = map_to_actuator(
            value,
            self.input.min as i32,
            self.input.max as i32,
            self.closed.degrees() as i32,
            self.open.degrees() as i32,
        );
        match mapped {
            Ok(degrees) => ActuatorPosition::saturating(degrees),
            // Unreachable: the input scale was validated in `new`.
            Err(_) => self.closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_map_to_endpoints() {
        assert_eq!(map_to_actuator(0, 0, 255, 0, 160), Ok(0));
        assert_eq!(map_to_actuator(255, 0, 255, 0, 160), Ok(160));
        assert_eq!(map_to_actuator(0, 0, 100, 0, 160), Ok(0));
        assert_eq!(map_to_actuator(100, 0, 100, 0, 160), Ok(160));
    }

    #[test]
    fn truncating_division() {
        // 128 * 160 / 255 = 80.31
        assert_eq!(map_to_actuator(128, 0, 255, 0, 160), Ok(80));
        // 1 * 160 / 255 = 0.63
        assert_eq!(map_to_actuator(1, 0, 255, 0, 160), Ok(0));
        // 33 * 160 / 100 = 52.8
        assert_eq!(map_to_actuator(33, 0, 100, 0, 160), Ok(52));
    }

    #[test]
    fn monotonic_over_byte_scale() {
        let mut prev = map_to_actuator(0, 0, 255, 0, 160).unwrap();
        for v in 1..=255 {
            let next = map_to_actuator(v, 0, 255, 0, 160).unwrap();
            assert!(next >= prev, "{} mapped below its predecessor", v);
            prev = next;
        }
    }

    #[test]
    fn out_of_range_values_clamp() {
        assert_eq!(map_to_actuator(-50, 0, 255, 0, 160), Ok(0));
        assert_eq!(map_to_actuator(400, 0, 255, 0, 160), Ok(160));
        assert_eq!(map_to_actuator(i32::MAX, 0, 255, 0, 160), Ok(160));
        assert_eq!(map_to_actuator(i32::MIN, 0, 255, 0, 160), Ok(0));
    }

    #[test]
    fn reversed_output_clamps_to_its_span() {
        assert_eq!(map_to_actuator(0, 0, 255, 160, 0), Ok(160));
        assert_eq!(map_to_actuator(255, 0, 255, 160, 0), Ok(0));
        assert_eq!(map_to_actuator(999, 0, 255, 160, 0), Ok(0));
    }

    #[test]
    fn degenerate_input_is_an_error() {
        assert_eq!(
            map_to_actuator(5, 10, 10, 0, 160),
            Err(MappingError::DegenerateInput)
        );
    }

    #[test]
    fn input_scale_validation() {
        assert_eq!(InputScale::new(0, 0), Err(MappingError::DegenerateInput));
        assert_eq!(InputScale::new(10, 5), Err(MappingError::InvertedScale));
        let scale = InputScale::new(1, 10).unwrap();
        assert!(scale.contains(1));
        assert!(scale.contains(10));
        assert!(!scale.contains(0));
        assert!(!scale.contains(11));
    }

    #[test]
    fn position_bounds() {
        assert_eq!(ActuatorPosition::new(160), Some(ActuatorPosition::MAX));
        assert_eq!(ActuatorPosition::new(161), None);
        assert_eq!(ActuatorPosition::saturating(-3), ActuatorPosition::MIN);
        assert_eq!(ActuatorPosition::saturating(500), ActuatorPosition::MAX);
    }

    #[test]
    fn range_map_percent_scale() {
        let map =
            RangeMap::new(InputScale::PERCENT, ActuatorPosition::MIN, ActuatorPosition::MAX)
                .unwrap();
        assert_eq!(map.map(0).degrees(), 0);
        assert_eq!(map.map(50).degrees(), 80);
        assert_eq!(map.map(100).degrees(), 160);
        assert_eq!(map.map(u32::MAX).degrees(), 160);
    }

    #[test]
    fn range_map_custom_travel() {
        let closed = ActuatorPosition::new(20).unwrap();
        let open = ActuatorPosition::new(120).unwrap();
        let map = RangeMap::new(InputScale::PERCENT, closed, open).unwrap();
        assert_eq!(map.map(0), closed);
        assert_eq!(map.map(100), open);
        assert_eq!(map.map(50).degrees(), 70);
    }
}
