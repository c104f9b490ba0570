//! [BSON Decimal128](https://github.com/mongodb/specifications/blob/master/source/bson-decimal128/decimal128.rst) data type representation

use std::{fmt, str::FromStr};

use crate::error::{Decimal128ErrorKind, Error, Result};

const EXPONENT_BIAS: i32 = 6176;
const MIN_EXPONENT: i32 = -6176;
const MAX_EXPONENT: i32 = 6111;
const MAX_DIGITS: usize = 34;
const EXPONENT_MASK: u128 = 0x3FFF;
const COEFFICIENT_MASK: u128 = (1 << 113) - 1;
const MAX_COEFFICIENT: u128 = 9_999_999_999_999_999_999_999_999_999_999_999;

const INFINITY_BITS: u128 = 0x1E << 122;
const NAN_BITS: u128 = 0x1F << 122;
const SIGN_BIT: u128 = 1 << 127;

/// Struct representing a BSON Decimal128 type.
///
/// This type supports conversion to and from the decimal strings used by Extended JSON's
/// `$numberDecimal` and the shell's `NumberDecimal(...)`; it does not implement arithmetic.
///
/// ```
/// use bson_codec::Decimal128;
///
/// let d: Decimal128 = "1.10".parse()?;
/// assert_eq!(d.to_string(), "1.10");
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
#[derive(Copy, Clone, Hash, PartialEq, Eq)]
pub struct Decimal128 {
    /// BSON bytes containing the decimal128. Stored for round tripping.
    pub(crate) bytes: [u8; 16],
}

enum Decoded {
    NaN,
    Infinity { negative: bool },
    Finite {
        negative: bool,
        exponent: i32,
        coefficient: u128,
    },
}

impl Decimal128 {
    /// Constructs a new `Decimal128` from the provided raw byte representation.
    pub fn from_bytes(bytes: [u8; 128 / 8]) -> Self {
        Self { bytes }
    }

    /// Returns the raw byte representation of this `Decimal128`.
    pub fn bytes(&self) -> [u8; 128 / 8] {
        self.bytes
    }

    fn bits(&self) -> u128 {
        u128::from_le_bytes(self.bytes)
    }

    fn from_bits(bits: u128) -> Self {
        Self {
            bytes: bits.to_le_bytes(),
        }
    }

    fn finite(negative: bool, exponent: i32, coefficient: u128) -> Self {
        let mut bits = coefficient & COEFFICIENT_MASK;
        bits |= (((exponent + EXPONENT_BIAS) as u128) & EXPONENT_MASK) << 113;
        if negative {
            bits |= SIGN_BIT;
        }
        Self::from_bits(bits)
    }

    fn decode(&self) -> Decoded {
        let bits = self.bits();
        let negative = bits & SIGN_BIT != 0;

        if (bits >> 125) & 0b11 == 0b11 {
            if (bits >> 122) & 0x1F == 0x1F {
                return Decoded::NaN;
            }
            if (bits >> 122) & 0x1F == 0x1E {
                return Decoded::Infinity { negative };
            }
            // The implicit 0b100 prefix puts the coefficient above the maximum, which the
            // format defines as zero.
            let exponent = ((bits >> 111) & EXPONENT_MASK) as i32 - EXPONENT_BIAS;
            return Decoded::Finite {
                negative,
                exponent,
                coefficient: 0,
            };
        }

        let exponent = ((bits >> 113) & EXPONENT_MASK) as i32 - EXPONENT_BIAS;
        let mut coefficient = bits & COEFFICIENT_MASK;
        if coefficient > MAX_COEFFICIENT {
            coefficient = 0;
        }
        Decoded::Finite {
            negative,
            exponent,
            coefficient,
        }
    }
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal128(\"{}\")", self)
    }
}

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, exponent, coefficient) = match self.decode() {
            Decoded::NaN => return f.write_str("NaN"),
            Decoded::Infinity { negative } => {
                return f.write_str(if negative { "-Infinity" } else { "Infinity" });
            }
            Decoded::Finite {
                negative,
                exponent,
                coefficient,
            } => (negative, exponent, coefficient),
        };

        if negative {
            f.write_str("-")?;
        }

        let digits = coefficient.to_string();
        let count = digits.len() as i32;
        let adjusted = exponent + count - 1;

        if exponent <= 0 && adjusted >= -6 {
            if exponent == 0 {
                return f.write_str(&digits);
            }
            let point = count + exponent;
            if point > 0 {
                let (int, frac) = digits.split_at(point as usize);
                write!(f, "{int}.{frac}")
            } else {
                write!(f, "0.{}{}", "0".repeat((-point) as usize), digits)
            }
        } else {
            let (first, rest) = digits.split_at(1);
            f.write_str(first)?;
            if !rest.is_empty() {
                write!(f, ".{rest}")?;
            }
            write!(f, "E{}{}", if adjusted >= 0 { "+" } else { "" }, adjusted)
        }
    }
}

impl FromStr for Decimal128 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let lower = unsigned.to_ascii_lowercase();
        if lower == "inf" || lower == "infinity" {
            let sign = if negative { SIGN_BIT } else { 0 };
            return Ok(Self::from_bits(INFINITY_BITS | sign));
        }
        if lower == "nan" {
            return Ok(Self::from_bits(NAN_BITS));
        }

        let (mantissa, exponent_text) = match unsigned.find(['e', 'E']) {
            Some(i) => (&unsigned[..i], Some(&unsigned[i + 1..])),
            None => (unsigned, None),
        };

        let mut exponent: i32 = match exponent_text {
            None => 0,
            Some("") => return Err(Error::decimal128(Decimal128ErrorKind::EmptyExponent)),
            Some(text) => text.parse().map_err(|e: std::num::ParseIntError| {
                Error::decimal128(Decimal128ErrorKind::InvalidExponent {
                    message: e.to_string(),
                })
            })?,
        };

        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(Error::decimal128(Decimal128ErrorKind::Unparseable {
                input: s.to_string(),
            }));
        }
        if !int_part
            .bytes()
            .chain(frac_part.bytes())
            .all(|b| b.is_ascii_digit())
        {
            return Err(Error::decimal128(Decimal128ErrorKind::InvalidCoefficient {
                message: format!("\"{mantissa}\" is not a decimal number"),
            }));
        }

        exponent = exponent
            .checked_sub(frac_part.len() as i32)
            .ok_or_else(|| Error::decimal128(Decimal128ErrorKind::Overflow))?;

        let all_digits: String = int_part.chars().chain(frac_part.chars()).collect();
        let mut significant = all_digits.trim_start_matches('0');

        // Trailing zeros past the 34th digit can be folded into the exponent exactly.
        while significant.len() > MAX_DIGITS {
            match significant.strip_suffix('0') {
                Some(rest) => {
                    significant = rest;
                    exponent = exponent.saturating_add(1);
                }
                None => return Err(Error::decimal128(Decimal128ErrorKind::InexactRounding)),
            }
        }

        let mut coefficient: u128 = if significant.is_empty() {
            0
        } else {
            significant.parse().map_err(|e: std::num::ParseIntError| {
                Error::decimal128(Decimal128ErrorKind::InvalidCoefficient {
                    message: e.to_string(),
                })
            })?
        };
        let mut digits = significant.len();

        while exponent > MAX_EXPONENT {
            if coefficient == 0 {
                exponent = MAX_EXPONENT;
                break;
            }
            if digits >= MAX_DIGITS {
                return Err(Error::decimal128(Decimal128ErrorKind::Overflow));
            }
            coefficient *= 10;
            digits += 1;
            exponent -= 1;
        }

        while exponent < MIN_EXPONENT {
            if coefficient == 0 {
                exponent = MIN_EXPONENT;
                break;
            }
            if coefficient % 10 != 0 {
                return Err(Error::decimal128(Decimal128ErrorKind::Underflow));
            }
            coefficient /= 10;
            exponent += 1;
        }

        Ok(Self::finite(negative, exponent, coefficient))
    }
}
