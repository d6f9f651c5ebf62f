// Aggregated statistics domain model
use serde::Deserialize;
use std::fmt;

/// Aggregates served by `/api/stats`. Every field may be absent or null.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatisticsSnapshot {
    #[serde(default)]
    pub avg_voltage: Option<f64>,
    #[serde(default)]
    pub avg_current: Option<f64>,
    #[serde(default)]
    pub max_power: Option<f64>,
    #[serde(default)]
    pub total_energy_kwh: Option<f64>,
    #[serde(default)]
    pub avg_power: Option<f64>,
    #[serde(default)]
    pub min_power: Option<f64>,
    #[serde(default)]
    pub total_readings: Option<u64>,
}

/// Rolling window the server aggregates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    #[default]
    Day,
    Week,
    Month,
}

impl StatsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsPeriod::Day => "day",
            StatsPeriod::Week => "week",
            StatsPeriod::Month => "month",
        }
    }
}

impl fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_snapshot() {
        let snapshot: StatisticsSnapshot =
            serde_json::from_str(r#"{"avg_voltage": 230.1}"#).unwrap();
        assert_eq!(snapshot.avg_voltage, Some(230.1));
        assert_eq!(snapshot.total_energy_kwh, None);
        assert_eq!(snapshot.max_power, None);
    }

    #[test]
    fn test_null_aggregates_on_empty_window() {
        let json = r#"{
            "total_readings": 0,
            "avg_voltage": null,
            "avg_current": null,
            "avg_power": null,
            "max_power": null,
            "min_power": null,
            "total_energy_kwh": 0
        }"#;
        let snapshot: StatisticsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.total_readings, Some(0));
        assert_eq!(snapshot.avg_voltage, None);
        assert_eq!(snapshot.total_energy_kwh, Some(0.0));
    }

    #[test]
    fn test_period_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            period: StatsPeriod,
        }

        let parsed: Wrapper = serde_json::from_str(r#"{"period": "week"}"#).unwrap();
        assert_eq!(parsed.period, StatsPeriod::Week);
        assert_eq!(StatsPeriod::default().as_str(), "day");
        assert_eq!(StatsPeriod::Month.to_string(), "month");
        assert!(serde_json::from_str::<Wrapper>(r#"{"period": "year"}"#).is_err());
    }
}
