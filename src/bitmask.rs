//! Fixed-width bitmask over canonical field indices.
//!
//! Bit `i` set means the field at registry index `i` is covered. The width is
//! 128 bits; the registry asserts at compile time that no entity table is wider.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bitmask(u128);

impl Bitmask {
    pub const BITS: u32 = u128::BITS;
    pub const EMPTY: Bitmask = Bitmask(0);

    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u128 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Mask with every bit below `count` set.
    pub const fn all(count: usize) -> Self {
        if count >= Self::BITS as usize {
            Self(u128::MAX)
        } else {
            Self((1u128 << count) - 1)
        }
    }

    pub fn set(&mut self, bit: u32) {
        if let Some(b) = 1u128.checked_shl(bit) {
            self.0 |= b;
        }
    }

    pub fn union(self, other: Bitmask) -> Bitmask {
        Bitmask(self.0 | other.0)
    }

    /// Set bits in ascending order.
    pub fn bits(self) -> impl Iterator<Item = u32> {
        (0..Self::BITS).filter(move |b| has_bit(self, *b))
    }
}

/// Bitwise OR of `1 << bit` for every bit. Bits outside the mask width are ignored.
pub fn mask<I: IntoIterator<Item = u32>>(bits: I) -> Bitmask {
    let mut m = Bitmask::EMPTY;
    for bit in bits {
        m.set(bit);
    }
    m
}

pub fn has_bit(mask: Bitmask, bit: u32) -> bool {
    match 1u128.checked_shl(bit) {
        Some(b) => mask.0 & b != 0,
        None => false,
    }
}

impl fmt::Display for Bitmask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for Bitmask {
    type Err = std::num::ParseIntError;

    /// Accepts decimal or `0x`-prefixed hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let raw = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u128::from_str_radix(hex, 16)?,
            None => s.parse()?,
        };
        Ok(Self(raw))
    }
}

impl FromIterator<u32> for Bitmask {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        mask(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_mask_is_zero() {
        assert_eq!(mask(std::iter::empty()), Bitmask::EMPTY);
        assert_eq!(mask(Vec::<u32>::new()).raw(), 0);
    }

    #[test]
    fn test_has_bit_for_listed_bits_only() {
        let m = mask([0, 3, 64, 127]);
        for b in [0, 3, 64, 127] {
            assert!(has_bit(m, b), "bit {b} should be set");
        }
        for b in [1, 2, 4, 63, 65, 126] {
            assert!(!has_bit(m, b), "bit {b} should be clear");
        }
    }

    #[test]
    fn test_duplicates_are_harmless() {
        assert_eq!(mask([5, 5, 5]), mask([5]));
    }

    #[test]
    fn test_out_of_range_bits_are_ignored() {
        let m = mask([1, 128, 500]);
        assert_eq!(m, mask([1]));
        assert!(!has_bit(m, 128));
        assert!(!has_bit(Bitmask::from_raw(u128::MAX), 200));
    }

    #[test]
    fn test_bits_iterates_ascending() {
        let m = mask([9, 2, 100]);
        assert_eq!(m.bits().collect::<Vec<_>>(), vec![2, 9, 100]);
    }

    #[test]
    fn test_all() {
        assert_eq!(Bitmask::all(0), Bitmask::EMPTY);
        assert_eq!(Bitmask::all(3).raw(), 0b111);
        assert_eq!(Bitmask::all(128).raw(), u128::MAX);
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!("10".parse::<Bitmask>().unwrap(), mask([1, 3]));
        assert_eq!("0xa".parse::<Bitmask>().unwrap(), mask([1, 3]));
        assert_eq!(mask([1, 3]).to_string(), "0xa");
        assert!("nope".parse::<Bitmask>().is_err());
    }

    #[test]
    fn test_serde_as_integer() {
        let m = mask([0, 2]);
        assert_eq!(serde_json::to_string(&m).unwrap(), "5");
        let back: Bitmask = serde_json::from_str("5").unwrap();
        assert_eq!(back, m);
    }
}
