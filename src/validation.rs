//! Strict parsing of openness command payloads.
//!
//! Only plain ASCII digits are accepted. Signs, decimal points and any
//! whitespace are rejected rather than trimmed, so a payload either is a
//! valid command exactly as received or causes no motion at all.

use core::fmt;

use crate::mapping::InputScale;

/// Requested blind openness on the configured [`InputScale`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpennessCommand(u32);

impl OpennessCommand {
    /// Wrap a value already known to lie on the input scale.
    pub(crate) const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Requested openness.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Whether this command asks for any opening at all.
    pub const fn is_open(self) -> bool {
        self.0 > 0
    }
}

/// Why a payload was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidInput {
    /// Nothing to parse.
    Empty,
    /// A character other than `0`-`9` at byte offset `position`.
    NonDigit {
        /// Byte offset of the offending character.
        position: usize,
        /// The offending character.
        found: char,
    },
    /// Parsed value lies outside the input scale (or does not fit in `u32`).
    OutOfRange {
        /// Lowest accepted value.
        min: u32,
        /// Highest accepted value.
        max: u32,
    },
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidInput::Empty => write!(f, "empty command"),
            InvalidInput::NonDigit { position, found } => {
                write!(f, "unexpected {:?} at position {}", found, position)
            }
            InvalidInput::OutOfRange { min, max } => {
                write!(f, "value must be between {} and {}", min, max)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidInput {}

/// Validate a raw payload against `scale`.
///
/// # Examples
///
/// ```
/// use smart_blinds::mapping::InputScale;
/// use smart_blinds::validation::{validate, InvalidInput};
///
/// assert_eq!(validate("255", InputScale::BYTE).unwrap().value(), 255);
/// assert_eq!(validate("", InputScale::BYTE), Err(InvalidInput::Empty));
/// assert!(validate("-5", InputScale::BYTE).is_err());
/// assert!(validate("256", InputScale::BYTE).is_err());
/// ```
pub fn validate(raw: &str, scale: InputScale) -> Result<OpennessCommand, InvalidInput> {
    if raw.is_empty() {
        return Err(InvalidInput::Empty);
    }

    if let Some((position, found)) = raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        return Err(InvalidInput::NonDigit { position, found });
    }

    let out_of_range = InvalidInput::OutOfRange {
        min: scale.min(),
        max: scale.max(),
    };

    // Only digits remain, so the sole parse failure is overflow.
    let value: u32 = raw.parse().map_err(|_| out_of_range)?;
    if !scale.contains(value) {
        return Err(out_of_range);
    }

    Ok(OpennessCommand::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert_eq!(validate("", InputScale::BYTE), Err(InvalidInput::Empty));
    }

    #[test]
    fn rejects_letters() {
        assert_eq!(
            validate("abc", InputScale::BYTE),
            Err(InvalidInput::NonDigit {
                position: 0,
                found: 'a'
            })
        );
        assert_eq!(
            validate("12a", InputScale::BYTE),
            Err(InvalidInput::NonDigit {
                position: 2,
                found: 'a'
            })
        );
    }

    #[test]
    fn rejects_sign_and_decimal() {
        assert!(matches!(
            validate("-5", InputScale::BYTE),
            Err(InvalidInput::NonDigit { found: '-', .. })
        ));
        assert!(matches!(
            validate("+5", InputScale::BYTE),
            Err(InvalidInput::NonDigit { found: '+', .. })
        ));
        assert!(matches!(
            validate("5.0", InputScale::BYTE),
            Err(InvalidInput::NonDigit { found: '.', .. })
        ));
    }

    #[test]
    fn rejects_whitespace() {
        assert!(validate(" 5", InputScale::BYTE).is_err());
        assert!(validate("5 ", InputScale::BYTE).is_err());
        assert!(validate("5\r", InputScale::BYTE).is_err());
    }

    #[test]
    fn accepts_scale_bounds() {
        assert_eq!(validate("0", InputScale::BYTE).unwrap().value(), 0);
        assert_eq!(validate("255", InputScale::BYTE).unwrap().value(), 255);
        assert_eq!(validate("100", InputScale::PERCENT).unwrap().value(), 100);
    }

    #[test]
    fn leading_zeros_are_digits() {
        assert_eq!(validate("007", InputScale::BYTE).unwrap().value(), 7);
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            validate("256", InputScale::BYTE),
            Err(InvalidInput::OutOfRange { min: 0, max: 255 })
        );
        assert_eq!(
            validate("101", InputScale::PERCENT),
            Err(InvalidInput::OutOfRange { min: 0, max: 100 })
        );
    }

    #[test]
    fn overflow_is_out_of_range() {
        assert_eq!(
            validate("99999999999999999999", InputScale::BYTE),
            Err(InvalidInput::OutOfRange { min: 0, max: 255 })
        );
    }

    #[test]
    fn reports_non_ascii() {
        assert!(matches!(
            validate("1٣", InputScale::BYTE),
            Err(InvalidInput::NonDigit { position: 1, .. })
        ));
    }

    #[test]
    fn display_messages() {
        assert_eq!(InvalidInput::Empty.to_string(), "empty command");
        assert_eq!(
            InvalidInput::OutOfRange { min: 0, max: 255 }.to_string(),
            "value must be between 0 and 255"
        );
    }
}
