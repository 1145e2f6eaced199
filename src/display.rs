use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

pub struct DisplayRangeInclusive<'a, D: Display> {
    range: &'a RangeInclusive<D>,
}

impl<'a, D: Display> From<&'a RangeInclusive<D>> for DisplayRangeInclusive<'a, D> {
    fn from(range: &'a RangeInclusive<D>) -> Self {
        DisplayRangeInclusive { range }
    }
}

impl<D: Display> Display for DisplayRangeInclusive<'_, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.range.start(), self.range.end())
    }
}

/// Renders a probability (or any fraction) as a percentage with two decimals.
pub struct DisplayPercent(pub f64);

impl Display for DisplayPercent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}%", self.0 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_range_inclusive() {
        assert_eq!("4-6", format!("{}", DisplayRangeInclusive::from(&(4..=6))));
        assert_eq!("0-0", format!("{}", DisplayRangeInclusive::from(&(0u16..=0))));
    }

    #[test]
    fn display_percent() {
        assert_eq!("36.50%", format!("{}", DisplayPercent(0.365)));
        assert_eq!("0.00%", format!("{}", DisplayPercent(0.0)));
    }
}
