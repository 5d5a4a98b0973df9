//! Quantity text as printed under a material icon ("3", "1.5w", "2万").

use thiserror::Error;

/// Multiplier applied by the ten-thousand suffix.
pub const TEN_THOUSAND: f64 = 10_000.0;

/// The only magnitude suffixes the wiki uses.
const MAGNITUDE_SUFFIXES: [char; 2] = ['w', '万'];

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("cannot parse quantity '{text}'")]
pub struct QuantityFormatError {
    pub text: String,
}

impl QuantityFormatError {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// Converts a quantity token into an exact count.
///
/// A trailing `w` / `万` scales the (possibly fractional) number by 10,000
/// and truncates toward zero. Anything else must be a plain integer. Signs
/// are accepted in both forms.
pub fn parse_quantity(text: &str) -> Result<i64, QuantityFormatError> {
    let trimmed = text.trim();

    if let Some(number) = trimmed.strip_suffix(MAGNITUDE_SUFFIXES) {
        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| QuantityFormatError::new(text))?;
        let scaled = value * TEN_THOUSAND;
        // `as` saturates, so bounds are checked by hand.
        if !scaled.is_finite() || scaled <= i64::MIN as f64 || scaled >= i64::MAX as f64 {
            return Err(QuantityFormatError::new(text));
        }
        return Ok(scaled.trunc() as i64);
    }

    trimmed
        .parse::<i64>()
        .map_err(|_| QuantityFormatError::new(text))
}
