//! Exact decimal numbers
//!
//! Rule bounds and document values are compared without going through
//! `f64`, so `0.1` and `1e400` behave exactly. A number is kept as a sign, a
//! digit string without leading or trailing zeros and a power of ten.

use std::cmp::Ordering;
use std::fmt;

/// Zeros written out before `Display` switches to `<digits>e<exp>`
const PLAIN_LIMIT: i64 = 20;

/// Exact decimal value parsed from JSON number text.
#[derive(Debug, Clone)]
pub struct Number {
    negative: bool,
    /// Significant digits as ASCII, empty for zero
    digits: Vec<u8>,
    /// Power of ten applied to `digits`
    exponent: i64,
    /// Digits after the decimal point as written
    scale: u32,
}

impl Number {
    /// Parses strict JSON number text.
    pub fn parse(text: &str) -> Option<Number> {
        let bytes = text.as_bytes();
        let mut pos = 0;

        let negative = bytes.first() == Some(&b'-');
        if negative {
            pos += 1;
        }

        let int_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let int_part = &bytes[int_start..pos];
        if int_part.is_empty() || (int_part.len() > 1 && int_part[0] == b'0') {
            return None;
        }

        let mut frac_part: &[u8] = &[];
        if pos < bytes.len() && bytes[pos] == b'.' {
            pos += 1;
            let frac_start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            frac_part = &bytes[frac_start..pos];
            if frac_part.is_empty() {
                return None;
            }
        }

        let mut exp: i64 = 0;
        if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
            pos += 1;
            let exp_negative = match bytes.get(pos) {
                Some(b'-') => {
                    pos += 1;
                    true
                }
                Some(b'+') => {
                    pos += 1;
                    false
                }
                _ => false,
            };
            let exp_start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                exp = exp
                    .saturating_mul(10)
                    .saturating_add(i64::from(bytes[pos] - b'0'));
                pos += 1;
            }
            if pos == exp_start {
                return None;
            }
            if exp_negative {
                exp = -exp;
            }
        }

        if pos != bytes.len() {
            return None;
        }

        let frac_len = frac_part.len() as i64;
        let scale = frac_len
            .saturating_sub(exp)
            .clamp(0, i64::from(u32::MAX)) as u32;

        let mut digits: Vec<u8> = int_part.iter().chain(frac_part).copied().collect();
        let mut exponent = exp.saturating_sub(frac_len);

        let leading = digits.iter().take_while(|d| **d == b'0').count();
        digits.drain(..leading);
        while digits.last() == Some(&b'0') {
            digits.pop();
            exponent = exponent.saturating_add(1);
        }
        if digits.is_empty() {
            exponent = 0;
        }

        Some(Number {
            negative: negative && !digits.is_empty(),
            digits,
            exponent,
            scale,
        })
    }

    /// Creates a number from a count or length.
    pub fn from_usize(value: usize) -> Number {
        let mut digits = value.to_string().into_bytes();
        let mut exponent = 0;
        while digits.last() == Some(&b'0') {
            digits.pop();
            exponent += 1;
        }
        if digits.is_empty() {
            exponent = 0;
        }
        Number {
            negative: false,
            digits,
            exponent,
            scale: 0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Returns true if the value has no fractional part.
    pub fn is_integer(&self) -> bool {
        self.exponent >= 0
    }

    /// Number of digits after the decimal point as written, exponent applied.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Returns the value as `usize` if it is a non-negative integer in range.
    pub fn to_usize(&self) -> Option<usize> {
        if self.negative || !self.is_integer() {
            return None;
        }
        if self.is_zero() {
            return Some(0);
        }
        let mut value: usize = 0;
        for d in &self.digits {
            value = value.checked_mul(10)?.checked_add(usize::from(d - b'0'))?;
        }
        for _ in 0..self.exponent {
            value = value.checked_mul(10)?;
        }
        Some(value)
    }

    /// Position of the most significant digit, for magnitude comparison.
    fn magnitude(&self) -> i64 {
        (self.digits.len() as i64).saturating_add(self.exponent)
    }

    fn cmp_abs(&self, other: &Number) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            _ => {}
        }
        self.magnitude()
            .cmp(&other.magnitude())
            .then_with(|| self.digits.cmp(&other.digits))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_abs(other),
            (true, true) => other.cmp_abs(self),
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        if self.negative {
            write!(f, "-")?;
        }
        let digits = String::from_utf8_lossy(&self.digits);
        let point = self.magnitude();
        if self.exponent > PLAIN_LIMIT || point < -PLAIN_LIMIT {
            return write!(f, "{}e{}", digits, self.exponent);
        }
        if self.exponent >= 0 {
            write!(f, "{}{}", digits, "0".repeat(self.exponent as usize))
        } else {
            if point > 0 {
                let (int, frac) = digits.split_at(point as usize);
                write!(f, "{}.{}", int, frac)
            } else {
                write!(f, "0.{}{}", "0".repeat((-point) as usize), digits)
            }
        }
    }
}
