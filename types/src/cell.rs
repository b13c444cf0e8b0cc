//! `CellId`: an opaque identifier for a cell in the hex grid hierarchy.
//!
//! Per this, an internal dense encoding is permitted as long as the
//! canonical string form is used for sorting, hashing, and serialization.
//! This is that encoding: a 64-bit packed value (resolution, base cell, and
//! up to 15 per-resolution child digits), with a `"h3:<res>:<base>:<digits>"`
//! canonical string derived from it. The hex grid oracle (the [`grid`
//! crate](../geobatch_grid)) is the sole authority on validity and parent
//! relations; `CellId` itself is a dumb, comparable, serializable carrier.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use geobatch_error::GeoBatchError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Finest resolution the grid supports.
pub const MAX_RES: u8 = 15;
const DIGIT_BITS: u32 = 3;
/// Digit value meaning "unset" (beyond this cell's resolution).
const UNSET_DIGIT: u8 = 7;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(u64);

impl CellId {
    /// Builds a cell id from its parts. `digits[i]` is the child digit
    /// (0..=6) chosen at resolution `i + 1`; entries beyond `resolution`
    /// are ignored and stored as unset.
    pub fn from_parts(resolution: u8, base_cell: u8, digits: &[u8]) -> Self {
        debug_assert!(resolution <= MAX_RES, "resolution out of range");
        debug_assert!(base_cell <= 0x7F, "base cell out of range");
        let mut bits: u64 = 0;
        for i in 0..(MAX_RES as u32) {
            let d = if i < resolution as u32 {
                digits.get(i as usize).copied().unwrap_or(UNSET_DIGIT)
            } else {
                UNSET_DIGIT
            };
            bits |= (d as u64 & 0b111) << (i * DIGIT_BITS);
        }
        bits |= (base_cell as u64 & 0x7F) << 45;
        bits |= (resolution as u64 & 0x0F) << 52;
        CellId(bits)
    }

    pub fn resolution(&self) -> u8 {
        ((self.0 >> 52) & 0x0F) as u8
    }

    pub fn base_cell(&self) -> u8 {
        ((self.0 >> 45) & 0x7F) as u8
    }

    /// The child digit chosen at resolution `i + 1` (0-indexed), or
    /// [`UNSET_DIGIT`] if `i >= self.resolution()`.
    pub fn digit(&self, i: u8) -> u8 {
        ((self.0 >> (i as u32 * DIGIT_BITS)) & 0b111) as u8
    }

    pub fn digits(&self) -> Vec<u8> {
        (0..self.resolution()).map(|i| self.digit(i)).collect()
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn from_raw(v: u64) -> Self {
        CellId(v)
    }

    /// The code-point-sortable string form used for all JSON keys, Merkle
    /// leaf ordering, and cell comparisons.
    pub fn canonical_string(&self) -> String {
        let res = self.resolution();
        let mut digits = String::with_capacity(res as usize);
        for i in 0..res {
            digits.push(std::char::from_digit(self.digit(i) as u32, 8).expect("digit < 8"));
        }
        format!("h3:{:02}:{:03}:{}", res, self.base_cell(), digits)
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({})", self.canonical_string())
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

/// Sort order is code-point ascending on the canonical string form, not on
/// the packed integer representation.
impl Ord for CellId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical_string().cmp(&other.canonical_string())
    }
}

impl PartialOrd for CellId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for CellId {
    type Err = GeoBatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let tag = parts.next().ok_or_else(|| invalid(s))?;
        if tag != "h3" {
            return Err(invalid(s));
        }
        let res: u8 = parts
            .next()
            .ok_or_else(|| invalid(s))?
            .parse()
            .map_err(|_| invalid(s))?;
        let base: u8 = parts
            .next()
            .ok_or_else(|| invalid(s))?
            .parse()
            .map_err(|_| invalid(s))?;
        let digits_str = parts.next().ok_or_else(|| invalid(s))?;
        if parts.next().is_some() {
            return Err(invalid(s));
        }
        if digits_str.len() != res as usize {
            return Err(invalid(s));
        }
        let mut digits = Vec::with_capacity(res as usize);
        for c in digits_str.chars() {
            let d = c.to_digit(8).ok_or_else(|| invalid(s))? as u8;
            if d == UNSET_DIGIT {
                return Err(invalid(s));
            }
            digits.push(d);
        }
        Ok(CellId::from_parts(res, base, &digits))
    }
}

fn invalid(s: &str) -> GeoBatchError {
    GeoBatchError::hierarchy(format!("malformed cell id: {s:?}"))
}

impl Serialize for CellId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.canonical_string())
    }
}

impl<'de> Deserialize<'de> for CellId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_canonical_string() {
        let c = CellId::from_parts(5, 34, &[1, 0, 2, 3, 5]);
        let s = c.canonical_string();
        let back: CellId = s.parse().unwrap();
        assert_eq!(c, back);
    }

    #[test]
    fn resolution_zero_has_no_digits() {
        let c = CellId::from_parts(0, 10, &[]);
        assert_eq!(c.canonical_string(), "h3:00:010:");
        assert_eq!(c.digits(), Vec::<u8>::new());
    }

    #[test]
    fn ordering_is_lexicographic_on_canonical_string() {
        let a = CellId::from_parts(1, 1, &[0]);
        let b = CellId::from_parts(1, 1, &[1]);
        assert!(a < b);
        assert_eq!(a.canonical_string() < b.canonical_string(), a < b);
    }
}
