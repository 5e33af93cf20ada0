//! `Frequency`: how often a rate compounds or a coupon pays.

/// Compounding / payment frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// No frequency; used with simple and continuous compounding.
    NoFrequency,
    /// Once, at maturity.
    Once,
    /// Once per year.
    Annual,
    /// Twice per year.
    Semiannual,
    /// Four times per year.
    Quarterly,
    /// Twelve times per year.
    Monthly,
    /// Fifty-two times per year.
    Weekly,
    /// Every calendar day.
    Daily,
}

impl Frequency {
    /// Number of periods per year; `None` for `NoFrequency` and `Once`.
    pub fn periods_per_year(self) -> Option<u32> {
        match self {
            Frequency::NoFrequency | Frequency::Once => None,
            Frequency::Annual => Some(1),
            Frequency::Semiannual => Some(2),
            Frequency::Quarterly => Some(4),
            Frequency::Monthly => Some(12),
            Frequency::Weekly => Some(52),
            Frequency::Daily => Some(365),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Frequency::NoFrequency => "no-frequency",
            Frequency::Once => "once",
            Frequency::Annual => "annual",
            Frequency::Semiannual => "semiannual",
            Frequency::Quarterly => "quarterly",
            Frequency::Monthly => "monthly",
            Frequency::Weekly => "weekly",
            Frequency::Daily => "daily",
        };
        f.write_str(s)
    }
}
