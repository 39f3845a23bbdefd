/// A half-open quality band `[min, max)` mapping to a retention policy.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub min: f64,
    pub max: f64,
    pub retention_days: u32,
    pub archive_after_days: u32,
}

impl Band {
    fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }
}

/// Ordered list of bands; the last entry is the catch-all for any value no
/// earlier band matched ("the last entry serving as a catch-all
/// if no band matches").
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    bands: Vec<Band>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            bands: vec![
                Band {
                    min: 0.7,
                    max: 1.1,
                    retention_days: 365,
                    archive_after_days: 180,
                },
                Band {
                    min: 0.5,
                    max: 0.7,
                    retention_days: 180,
                    archive_after_days: 90,
                },
                Band {
                    min: 0.0,
                    max: 0.5,
                    retention_days: 90,
                    archive_after_days: 30,
                },
            ],
        }
    }
}

impl RetentionPolicy {
    pub fn new(bands: Vec<Band>) -> Self {
        Self { bands }
    }

    /// Returns the first band whose `[min, max)` contains `score`, falling
    /// back to the last configured band.
    pub fn band_for(&self, score: f64) -> Band {
        self.bands
            .iter()
            .find(|band| band.contains(score))
            .copied()
            .or_else(|| self.bands.last().copied())
            .unwrap_or(Band {
                min: 0.0,
                max: 1.0,
                retention_days: 90,
                archive_after_days: 30,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_score_gets_longest_retention() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.band_for(0.70).retention_days, 365);
    }

    #[test]
    fn just_below_top_band_gets_middle_retention() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.band_for(0.69).retention_days, 180);
    }

    #[test]
    fn low_score_gets_shortest_retention() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.band_for(0.30).retention_days, 90);
    }

    #[test]
    fn out_of_range_value_falls_to_catch_all() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.band_for(5.0).retention_days, 90);
    }
}
