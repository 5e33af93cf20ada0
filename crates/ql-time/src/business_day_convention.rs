//! Business-day conventions.

/// How a date falling on a holiday is rolled to a business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusinessDayConvention {
    /// First business day after the holiday.
    Following,
    /// First business day after, unless that crosses into the next month;
    /// then the first business day before.
    ModifiedFollowing,
    /// First business day before the holiday.
    Preceding,
    /// First business day before, unless that crosses into the previous
    /// month; then the first business day after.
    ModifiedPreceding,
    /// Keep the date as is.
    Unadjusted,
}

impl std::fmt::Display for BusinessDayConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BusinessDayConvention::Following => "Following",
            BusinessDayConvention::ModifiedFollowing => "Modified Following",
            BusinessDayConvention::Preceding => "Preceding",
            BusinessDayConvention::ModifiedPreceding => "Modified Preceding",
            BusinessDayConvention::Unadjusted => "Unadjusted",
        };
        f.write_str(s)
    }
}
