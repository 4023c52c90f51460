use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One body-composition measurement as read from a CSV row.
///
/// `time`, `weight` and `height` always come from non-empty columns; every
/// other field falls back to zero when its column is absent or unparsable.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyCompositionRecord {
    pub time: DateTime<FixedOffset>,
    /// kg
    pub weight: f64,
    /// cm
    pub height: f64,
    pub bmi: f64,
    /// percentage (0-100)
    pub fat_rate: f64,
    /// percentage (0-100)
    pub body_water_rate: f64,
    /// kg
    pub bone_mass: f64,
    /// kcal
    pub metabolism: i32,
    /// percentage (0-100)
    pub muscle_rate: f64,
    pub visceral_fat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Weight,
    Height,
    BodyFat,
    BoneMass,
    BasalMetabolicRate,
    LeanBodyMass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Kilograms,
    Meters,
    Percent,
    KilocaloriesPerDay,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Weight,
        MetricKind::Height,
        MetricKind::BodyFat,
        MetricKind::BoneMass,
        MetricKind::BasalMetabolicRate,
        MetricKind::LeanBodyMass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Weight => "weight",
            MetricKind::Height => "height",
            MetricKind::BodyFat => "body_fat",
            MetricKind::BoneMass => "bone_mass",
            MetricKind::BasalMetabolicRate => "basal_metabolic_rate",
            MetricKind::LeanBodyMass => "lean_body_mass",
        }
    }

    pub fn unit(&self) -> Unit {
        match self {
            MetricKind::Weight | MetricKind::BoneMass | MetricKind::LeanBodyMass => {
                Unit::Kilograms
            }
            MetricKind::Height => Unit::Meters,
            MetricKind::BodyFat => Unit::Percent,
            MetricKind::BasalMetabolicRate => Unit::KilocaloriesPerDay,
        }
    }

    /// Inclusive range the health store accepts for this metric.
    pub fn valid_range(&self) -> (f64, f64) {
        match self {
            MetricKind::Weight | MetricKind::BoneMass | MetricKind::LeanBodyMass => (0.0, 1000.0),
            MetricKind::Height => (0.0, 3.0),
            MetricKind::BodyFat => (0.0, 100.0),
            MetricKind::BasalMetabolicRate => (0.0, 10_000.0),
        }
    }

    pub fn read_permission(&self) -> String {
        format!("READ_{}", self.as_str().to_uppercase())
    }

    pub fn write_permission(&self) -> String {
        format!("WRITE_{}", self.as_str().to_uppercase())
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Unit::Kilograms => "kg",
            Unit::Meters => "m",
            Unit::Percent => "%",
            Unit::KilocaloriesPerDay => "kcal/day",
        };
        f.write_str(symbol)
    }
}

/// A single normalized fact submitted to the health store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetricEntry {
    pub kind: MetricKind,
    pub value: f64,
    pub unit: Unit,
    pub time: DateTime<Utc>,
    pub zone_offset_seconds: i32,
}

impl DerivedMetricEntry {
    pub fn zone_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.zone_offset_seconds)
    }
}

/// Summary of one import call, handed back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub total_records: usize,
    pub successful_records: usize,
    pub failed_records: usize,
    pub errors: Vec<String>,
    pub is_success: bool,
}

impl ImportOutcome {
    pub fn completed(total_records: usize, successful_records: usize, errors: Vec<String>) -> Self {
        Self {
            total_records,
            successful_records,
            failed_records: errors.len(),
            errors,
            is_success: true,
        }
    }

    /// The store rejected the whole batch: nothing counts as imported.
    pub fn submission_failed(total_records: usize, message: String) -> Self {
        Self {
            total_records,
            successful_records: 0,
            failed_records: total_records,
            errors: vec![message],
            is_success: false,
        }
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_success {
            writeln!(f, "Import completed")?;
        } else {
            writeln!(f, "Import failed")?;
        }
        writeln!(f, "Total records: {}", self.total_records)?;
        writeln!(f, "Successful: {}", self.successful_records)?;
        write!(f, "Failed: {}", self.failed_records)?;
        if !self.errors.is_empty() {
            write!(f, "\nErrors:")?;
            for error in &self.errors {
                write!(f, "\n  • {}", error)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Idle,
    Transforming,
    Submitting,
    Completed { success: bool },
}

impl fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportPhase::Idle => f.write_str("idle"),
            ImportPhase::Transforming => f.write_str("transforming"),
            ImportPhase::Submitting => f.write_str("submitting"),
            ImportPhase::Completed { success: true } => f.write_str("completed"),
            ImportPhase::Completed { success: false } => f.write_str("failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display_lists_errors() {
        let outcome = ImportOutcome::completed(
            3,
            2,
            vec!["Error processing data at 2024-04-29T12:12:32+00:00: bad".to_string()],
        );

        let rendered = outcome.to_string();
        assert!(rendered.starts_with("Import completed"));
        assert!(rendered.contains("Total records: 3"));
        assert!(rendered.contains("Successful: 2"));
        assert!(rendered.contains("Failed: 1"));
        assert!(rendered.contains("  • Error processing data at"));
    }

    #[test]
    fn test_submission_failed_outcome() {
        let outcome = ImportOutcome::submission_failed(4, "store down".to_string());

        assert_eq!(outcome.successful_records, 0);
        assert_eq!(outcome.failed_records, 4);
        assert_eq!(outcome.errors, vec!["store down".to_string()]);
        assert!(!outcome.is_success);
        assert!(outcome.to_string().starts_with("Import failed"));
    }

    #[test]
    fn test_permission_names() {
        assert_eq!(MetricKind::BodyFat.write_permission(), "WRITE_BODY_FAT");
        assert_eq!(
            MetricKind::BasalMetabolicRate.read_permission(),
            "READ_BASAL_METABOLIC_RATE"
        );
    }

    #[test]
    fn test_entry_serializes_snake_case() {
        let entry = DerivedMetricEntry {
            kind: MetricKind::LeanBodyMass,
            value: 42.5,
            unit: Unit::Kilograms,
            time: DateTime::parse_from_rfc3339("2024-04-29T12:12:32Z")
                .unwrap()
                .with_timezone(&Utc),
            zone_offset_seconds: 3600,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "lean_body_mass");
        assert_eq!(json["unit"], "kilograms");
        assert_eq!(json["zone_offset_seconds"], 3600);
        assert_eq!(entry.zone_offset().unwrap().local_minus_utc(), 3600);
    }
}
