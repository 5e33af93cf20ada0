//! `TimeUnit`: the unit a [`Period`](crate::Period) is measured in.

/// A unit of calendar time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    /// Calendar days.
    Days,
    /// Calendar weeks (7 days).
    Weeks,
    /// Calendar months.
    Months,
    /// Calendar years (12 months).
    Years,
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimeUnit::Days => "D",
            TimeUnit::Weeks => "W",
            TimeUnit::Months => "M",
            TimeUnit::Years => "Y",
        };
        f.write_str(s)
    }
}
