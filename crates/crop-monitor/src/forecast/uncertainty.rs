use serde::{Deserialize, Serialize};

/// Half-width of the forecast interval in bu/acre. A step function of the
/// week that never widens as the season advances, whatever model is in use.
pub const fn half_width(week_of_season: u32) -> f64 {
    match week_of_season {
        0..=4 => 40.0,
        5..=10 => 30.0,
        11..=14 => 22.0,
        15..=21 => 14.0,
        _ => 8.0,
    }
}

/// Symmetric interval around a point forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub half_width: f64,
}

impl ConfidenceBand {
    pub fn around(predicted_yield: f64, week_of_season: u32) -> Self {
        let half_width = half_width(week_of_season);
        Self {
            lower_bound: predicted_yield - half_width,
            upper_bound: predicted_yield + half_width,
            half_width,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_width_never_increases_through_the_season() {
        let mut previous = f64::MAX;
        for week in 0..=40 {
            let current = half_width(week);
            assert!(current <= previous, "week {week} widened the band");
            previous = current;
        }
        assert_eq!(half_width(26), 8.0);
    }

    #[test]
    fn band_width_does_not_depend_on_the_prediction() {
        let early = ConfidenceBand::around(120.0, 3);
        let late = ConfidenceBand::around(230.0, 20);
        assert_eq!(early.width(), 80.0);
        assert_eq!(late.width(), 28.0);
        assert!(late.width() < early.width());
    }
}
