//! Core types: SecurityId, Cents

use std::fmt;

/// Stable identifier of a tradable instrument (a brokerage instrument id or ticker).
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SecurityId(String);

impl SecurityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SecurityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SecurityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Amount in whole cents.
///
/// Planning converts dollar amounts to `Cents` once, up front, so the knapsack
/// never accumulates floating-point drift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cents(pub i64);

/// Float noise tolerated before truncating (in cents).
const CENT_TOLERANCE: f64 = 1e-6;

impl Cents {
    pub const ZERO: Cents = Cents(0);

    /// Truncate a dollar amount to whole cents.
    ///
    /// Values within a millionth of a cent of the next whole cent snap to it,
    /// so `59.99999999999999` becomes 6000 rather than 5999.
    pub fn from_dollars(dollars: f64) -> Self {
        let cents = dollars * 100.0;
        let nearest = cents.round();
        if (cents - nearest).abs() < CENT_TOLERANCE {
            Cents(nearest as i64)
        } else {
            Cents(cents.floor() as i64)
        }
    }

    /// Round a dollar amount up to whole cents, with the same float-noise snap
    /// as [`Cents::from_dollars`].
    ///
    /// Share prices go through this so a planned purchase never costs more
    /// than its whole-cent estimate.
    pub fn from_dollars_ceil(dollars: f64) -> Self {
        let cents = dollars * 100.0;
        let nearest = cents.round();
        if (cents - nearest).abs() < CENT_TOLERANCE {
            Cents(nearest as i64)
        } else {
            Cents(cents.ceil() as i64)
        }
    }

    #[inline]
    pub fn to_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = self.0 / 100;
        let cents = (self.0 % 100).abs();
        if self.0 < 0 {
            write!(f, "-${}.{:02}", dollars.abs(), cents)
        } else {
            write!(f, "${}.{:02}", dollars, cents)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cents_display() {
        assert_eq!(format!("{}", Cents(10050)), "$100.50");
        assert_eq!(format!("{}", Cents(100)), "$1.00");
        assert_eq!(format!("{}", Cents(5)), "$0.05");
        assert_eq!(format!("{}", Cents(-250)), "-$2.50");
    }

    #[test]
    fn from_dollars_truncates() {
        assert_eq!(Cents::from_dollars(10.0), Cents(1000));
        assert_eq!(Cents::from_dollars(10.129), Cents(1012));
        assert_eq!(Cents::from_dollars(0.004), Cents(0));
        assert_eq!(Cents::from_dollars(-1.5), Cents(-150));
    }

    #[test]
    fn from_dollars_absorbs_float_noise() {
        assert_eq!(Cents::from_dollars(59.999_999_999_999_99), Cents(6000));
        assert_eq!(Cents::from_dollars(0.29), Cents(29));
        assert_eq!(Cents::from_dollars(0.1 + 0.2), Cents(30));
    }

    #[test]
    fn from_dollars_ceil_rounds_up() {
        assert_eq!(Cents::from_dollars_ceil(10.0), Cents(1000));
        assert_eq!(Cents::from_dollars_ceil(10.125), Cents(1013));
        assert_eq!(Cents::from_dollars_ceil(0.999), Cents(100));
        assert_eq!(Cents::from_dollars_ceil(0.004), Cents(1));
        assert_eq!(Cents::from_dollars_ceil(-1.505), Cents(-150));
    }

    #[test]
    fn from_dollars_ceil_absorbs_float_noise() {
        assert_eq!(Cents::from_dollars_ceil(0.1 + 0.2), Cents(30));
        assert_eq!(Cents::from_dollars_ceil(1.15), Cents(115));
        assert_eq!(Cents::from_dollars_ceil(59.999_999_999_999_99), Cents(6000));
    }

    #[test]
    fn to_dollars() {
        assert_eq!(Cents(12_345).to_dollars(), 123.45);
    }

    #[test]
    fn security_id_ordering() {
        assert!(SecurityId::new("VTI") < SecurityId::new("VXUS"));
        assert_eq!(SecurityId::from("SPY").as_str(), "SPY");
        assert_eq!(format!("{}", SecurityId::from("BND")), "BND");
    }
}
