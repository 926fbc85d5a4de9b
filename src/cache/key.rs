//! Cache key derivation
//!
//! Requests are keyed by endpoint plus coordinates quantized to four
//! significant digits, so queries that differ only in sub-tolerance noise
//! share one entry. Rounding works on the decimal digit string (half to
//! even), never through binary floats, so every process derives the same
//! key for the same input.

use crate::error::{VientoError, VientoResult};
use std::fmt;

/// Significant digits kept when quantizing a coordinate
pub const SIGNIFICANT_DIGITS: usize = 4;

/// Separator between key components; rejected inside endpoints
pub const KEY_SEPARATOR: char = '|';

/// Key of one cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    endpoint: String,
    latitude: String,
    longitude: String,
}

impl CacheKey {
    /// Derive the key for a request
    ///
    /// # Arguments
    /// * `endpoint` - Upstream endpoint identity (e.g. "forecast")
    /// * `latitude` - Decimal latitude as given by the caller
    /// * `longitude` - Decimal longitude as given by the caller
    pub fn derive(endpoint: &str, latitude: &str, longitude: &str) -> VientoResult<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(VientoError::InvalidEndpoint("endpoint is empty".to_string()));
        }
        if endpoint.contains(KEY_SEPARATOR) {
            return Err(VientoError::InvalidEndpoint(format!(
                "'{}' contains the reserved character '{}'",
                endpoint, KEY_SEPARATOR
            )));
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            latitude: quantize(latitude)?,
            longitude: quantize(longitude)?,
        })
    }

    /// Parse the string form produced by `Display`
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.rsplitn(3, KEY_SEPARATOR);
        let longitude = parts.next()?;
        let latitude = parts.next()?;
        let endpoint = parts.next()?;
        Some(Self {
            endpoint: endpoint.to_string(),
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn latitude(&self) -> &str {
        &self.latitude
    }

    pub fn longitude(&self) -> &str {
        &self.longitude
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.endpoint,
            self.latitude,
            self.longitude,
            sep = KEY_SEPARATOR
        )
    }
}

/// Round a decimal coordinate string to `SIGNIFICANT_DIGITS` significant digits
///
/// Values with no more significant digits than that are returned as given
/// (minus a leading `+`), so quantizing twice yields the same string.
pub fn quantize(coordinate: &str) -> VientoResult<String> {
    let decimal = Decimal::parse(coordinate)?;
    Ok(decimal.round_significant(SIGNIFICANT_DIGITS).to_string())
}

/// Sign, coefficient digits and base-10 exponent of a decimal literal
#[derive(Debug, Clone, PartialEq, Eq)]
struct Decimal {
    negative: bool,
    digits: Vec<u8>,
    exponent: i32,
}

impl Decimal {
    fn parse(input: &str) -> VientoResult<Self> {
        let invalid = || VientoError::InvalidCoordinate(input.to_string());
        let s = input.trim();

        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let all: Vec<u8> = int_part
            .bytes()
            .chain(frac_part.bytes())
            .map(|b| b - b'0')
            .collect();
        let leading_zeros = all.iter().take_while(|d| **d == 0).count();
        let digits = if leading_zeros == all.len() {
            vec![0]
        } else {
            all[leading_zeros..].to_vec()
        };
        let exponent = -i32::try_from(frac_part.len()).map_err(|_| invalid())?;

        Ok(Self {
            negative,
            digits,
            exponent,
        })
    }

    fn round_significant(mut self, precision: usize) -> Self {
        if self.digits.len() <= precision {
            return self;
        }

        let dropped = self.digits.split_off(precision);
        self.exponent += dropped.len() as i32;

        let round_up = match dropped[0] {
            0..=4 => false,
            6..=9 => true,
            _ => {
                let beyond_half = dropped[1..].iter().any(|d| *d != 0);
                let last_odd = self.digits.last().is_some_and(|d| d % 2 == 1);
                beyond_half || last_odd
            }
        };

        if round_up {
            let mut carry = true;
            for digit in self.digits.iter_mut().rev() {
                if *digit == 9 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    carry = false;
                    break;
                }
            }
            if carry {
                // 9999 -> 10000, keep the precision and shift the exponent
                self.digits.insert(0, 1);
                self.digits.truncate(precision);
                self.exponent += 1;
            }
        }
        self
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        let digits: String = self.digits.iter().map(|d| char::from(b'0' + d)).collect();

        if self.exponent >= 0 {
            write!(f, "{}", digits)?;
            for _ in 0..self.exponent {
                write!(f, "0")?;
            }
            return Ok(());
        }

        let point = digits.len() as i32 + self.exponent;
        if point > 0 {
            let (int_part, frac_part) = digits.split_at(point as usize);
            write!(f, "{}.{}", int_part, frac_part)
        } else {
            write!(f, "0.")?;
            for _ in 0..-point {
                write!(f, "0")?;
            }
            write!(f, "{}", digits)
        }
    }
}
