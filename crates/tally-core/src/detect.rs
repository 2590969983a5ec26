//! Spending anomaly detection
//!
//! Flags days whose expense total is more than `threshold` times the average
//! daily total across the user's history. Purely local arithmetic - no AI
//! call is involved, so results are deterministic and cheap to recompute.

use crate::models::Anomaly;

/// Detection configuration
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// A day is anomalous when its spend exceeds `threshold` x the average
    pub threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self { threshold: 2.0 }
    }
}

/// Scan per-day expense totals for unusually high days
///
/// `daily` holds (day, expense total) pairs covering every day with any
/// activity; days with only income count toward the average with a zero
/// total. An empty history yields no anomalies.
pub fn detect_anomalies(daily: &[(String, f64)], config: &DetectionConfig) -> Vec<Anomaly> {
    if daily.is_empty() {
        return Vec::new();
    }

    let total: f64 = daily.iter().map(|(_, amount)| amount).sum();
    let average = total / daily.len() as f64;

    daily
        .iter()
        .filter(|(_, amount)| *amount > average * config.threshold)
        .map(|(day, amount)| Anomaly {
            day: day.clone(),
            amount: *amount,
            message: format!(
                "Your spending on {} was unusually high ({}), more than {}x your average daily spending.",
                day, amount, config.threshold
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: &str, amount: f64) -> (String, f64) {
        (d.to_string(), amount)
    }

    #[test]
    fn test_empty_history_has_no_anomalies() {
        assert!(detect_anomalies(&[], &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn test_flags_day_above_twice_average() {
        let daily = vec![
            day("2025-11-01", 10.0),
            day("2025-11-02", 10.0),
            day("2025-11-03", 10.0),
            day("2025-11-04", 100.0),
        ];
        // average = 32.5, threshold = 65.0
        let anomalies = detect_anomalies(&daily, &DetectionConfig::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].day, "2025-11-04");
        assert_eq!(anomalies[0].amount, 100.0);
        assert!(anomalies[0].message.contains("2025-11-04"));
    }

    #[test]
    fn test_uniform_spending_is_quiet() {
        let daily = vec![
            day("2025-11-01", 50.0),
            day("2025-11-02", 50.0),
            day("2025-11-03", 50.0),
        ];
        assert!(detect_anomalies(&daily, &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn test_income_only_days_dilute_average() {
        // A zero-spend day pulls the average down, so the big day stands out
        let daily = vec![day("2025-11-01", 0.0), day("2025-11-02", 30.0)];
        // average = 15, threshold = 30; 30 is not strictly greater
        assert!(detect_anomalies(&daily, &DetectionConfig::default()).is_empty());

        let daily = vec![day("2025-11-01", 0.0), day("2025-11-02", 31.0)];
        let anomalies = detect_anomalies(&daily, &DetectionConfig::default());
        assert_eq!(anomalies.len(), 1);
    }
}
