//! `Period`: a signed length of calendar time, e.g. `3M` or `-1Y`.

use crate::frequency::Frequency;
use crate::time_unit::TimeUnit;
use ql_core::errors::{Error, Result};

/// A time span made up of an integer length and a [`TimeUnit`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    /// Number of units.
    pub length: i32,
    /// The unit of time.
    pub unit: TimeUnit,
}

impl Period {
    /// Create a new period.
    pub fn new(length: i32, unit: TimeUnit) -> Self {
        Self { length, unit }
    }

    /// The tenor between two payments at `freq`.
    ///
    /// # Errors
    /// [`Error::Precondition`] for `NoFrequency`.
    pub fn from_frequency(freq: Frequency) -> Result<Self> {
        match freq {
            Frequency::NoFrequency => Err(Error::Precondition(format!(
                "cannot convert {freq} to a period"
            ))),
            Frequency::Once => Ok(Period::new(0, TimeUnit::Years)),
            Frequency::Annual => Ok(Period::new(1, TimeUnit::Years)),
            Frequency::Semiannual => Ok(Period::new(6, TimeUnit::Months)),
            Frequency::Quarterly => Ok(Period::new(3, TimeUnit::Months)),
            Frequency::Monthly => Ok(Period::new(1, TimeUnit::Months)),
            Frequency::Weekly => Ok(Period::new(1, TimeUnit::Weeks)),
            Frequency::Daily => Ok(Period::new(1, TimeUnit::Days)),
        }
    }

    /// Approximate length in years (months / 12, days / 365).
    pub fn years(self) -> f64 {
        let n = self.length as f64;
        match self.unit {
            TimeUnit::Days => n / 365.0,
            TimeUnit::Weeks => n * 7.0 / 365.0,
            TimeUnit::Months => n / 12.0,
            TimeUnit::Years => n,
        }
    }
}

impl std::ops::Neg for Period {
    type Output = Self;
    fn neg(self) -> Self {
        Period::new(-self.length, self.unit)
    }
}

impl std::ops::Mul<i32> for Period {
    type Output = Self;
    fn mul(self, rhs: i32) -> Self {
        Period::new(self.length * rhs, self.unit)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.length, self.unit)
    }
}

impl std::fmt::Debug for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Period({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Period::new(3, TimeUnit::Months).to_string(), "3M");
        assert_eq!((-Period::new(6, TimeUnit::Months)).to_string(), "-6M");
        assert_eq!((Period::new(1, TimeUnit::Years) * 5).to_string(), "5Y");
    }

    #[test]
    fn from_frequency() {
        assert_eq!(
            Period::from_frequency(Frequency::Quarterly).unwrap(),
            Period::new(3, TimeUnit::Months)
        );
        assert!(Period::from_frequency(Frequency::NoFrequency).is_err());
    }
}
