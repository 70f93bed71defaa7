use serde::{Deserialize, Serialize};

/// Severity band shared by the sub-indices and the composite index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressStatus {
    Healthy,
    Mild,
    Moderate,
    Severe,
    Critical,
}

impl StressStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Healthy,
            Self::Mild,
            Self::Moderate,
            Self::Severe,
            Self::Critical,
        ]
    }

    /// Bands are inclusive-low, exclusive-high; the critical band is closed at 100.
    pub fn from_score(score: f64) -> Self {
        let score = round_score(score);
        if score < 20.0 {
            Self::Healthy
        } else if score < 40.0 {
            Self::Mild
        } else if score < 60.0 {
            Self::Moderate
        } else if score < 80.0 {
            Self::Severe
        } else {
            Self::Critical
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
            Self::Critical => "Critical",
        }
    }
}

/// Clamp to [0, 100] and round to one decimal. Non-finite input scores as 0.
pub fn round_score(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_are_inclusive_low_exclusive_high() {
        assert_eq!(StressStatus::from_score(0.0), StressStatus::Healthy);
        assert_eq!(StressStatus::from_score(19.9), StressStatus::Healthy);
        assert_eq!(StressStatus::from_score(20.0), StressStatus::Mild);
        assert_eq!(StressStatus::from_score(40.0), StressStatus::Moderate);
        assert_eq!(StressStatus::from_score(59.9), StressStatus::Moderate);
        assert_eq!(StressStatus::from_score(60.0), StressStatus::Severe);
        assert_eq!(StressStatus::from_score(80.0), StressStatus::Critical);
        assert_eq!(StressStatus::from_score(100.0), StressStatus::Critical);
    }

    #[test]
    fn rounding_stabilises_boundaries() {
        assert_eq!(StressStatus::from_score(19.96), StressStatus::Mild);
        assert_eq!(StressStatus::from_score(39.999_999), StressStatus::Moderate);
        assert_eq!(StressStatus::from_score(59.94), StressStatus::Moderate);
    }

    #[test]
    fn round_score_clamps_out_of_range_values() {
        assert_eq!(round_score(-3.0), 0.0);
        assert_eq!(round_score(140.0), 100.0);
        assert_eq!(round_score(f64::NAN), 0.0);
        assert_eq!(round_score(42.26), 42.3);
    }
}
