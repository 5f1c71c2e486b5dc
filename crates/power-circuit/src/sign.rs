// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Three-valued sign digit used for every marking entry.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Neg;

/// A balanced-ternary digit.
///
/// `Zero` never appears inside a marking; it means "absent" and is only
/// produced transiently by arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sign {
    /// `-1`
    Minus,
    /// `0`
    #[default]
    Zero,
    /// `+1`
    Plus,
}

impl Sign {
    /// Ternary full adder: returns `(sum, carry)` with `a + b == sum + 2 * carry`.
    ///
    /// ```
    /// use power_circuit::Sign;
    /// assert_eq!(Sign::Plus.add_with_carry(Sign::Plus), (Sign::Zero, Sign::Plus));
    /// assert_eq!(Sign::Plus.add_with_carry(Sign::Minus), (Sign::Zero, Sign::Zero));
    /// ```
    pub const fn add_with_carry(self, other: Self) -> (Self, Self) {
        match (self, other) {
            (Self::Zero, s) | (s, Self::Zero) => (s, Self::Zero),
            (Self::Plus, Self::Minus) | (Self::Minus, Self::Plus) => (Self::Zero, Self::Zero),
            (Self::Plus, Self::Plus) => (Self::Zero, Self::Plus),
            (Self::Minus, Self::Minus) => (Self::Zero, Self::Minus),
        }
    }

    /// Integer value of the digit.
    pub const fn to_i8(self) -> i8 {
        match self {
            Self::Minus => -1,
            Self::Zero => 0,
            Self::Plus => 1,
        }
    }

    /// Sign of an arbitrary integer.
    pub const fn of(value: i64) -> Self {
        if value > 0 {
            Self::Plus
        } else if value < 0 {
            Self::Minus
        } else {
            Self::Zero
        }
    }

    /// Maps an [`Ordering`] to `Minus`/`Zero`/`Plus`.
    pub const fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Self::Minus,
            Ordering::Equal => Self::Zero,
            Ordering::Greater => Self::Plus,
        }
    }

    /// `true` for `Zero`.
    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Zero)
    }
}

impl Neg for Sign {
    type Output = Self;

    fn neg(self) -> Self {
        match self {
            Self::Minus => Self::Plus,
            Self::Zero => Self::Zero,
            Self::Plus => Self::Minus,
        }
    }
}

impl PartialOrd for Sign {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Sign {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_i8().cmp(&other.to_i8())
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Minus => "-",
            Self::Zero => "0",
            Self::Plus => "+",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Sign; 3] = [Sign::Minus, Sign::Zero, Sign::Plus];

    #[test]
    fn full_adder_preserves_value() {
        for a in ALL {
            for b in ALL {
                let (sum, carry) = a.add_with_carry(b);
                assert_eq!(
                    a.to_i8() + b.to_i8(),
                    sum.to_i8() + 2 * carry.to_i8(),
                    "{a} + {b}"
                );
                assert_eq!((sum, carry), b.add_with_carry(a));
            }
        }
    }

    #[test]
    fn ordering_follows_integer_value() {
        assert!(Sign::Minus < Sign::Zero);
        assert!(Sign::Zero < Sign::Plus);
        assert_eq!(Sign::from_ordering(Sign::Plus.cmp(&Sign::Minus)), Sign::Plus);
    }

    #[test]
    fn negation_is_an_involution() {
        for s in ALL {
            assert_eq!(-(-s), s);
        }
        assert_eq!(-Sign::Zero, Sign::Zero);
        assert_eq!(Sign::of(-17), Sign::Minus);
        assert_eq!(Sign::of(0), Sign::Zero);
    }
}
