use crate::domain::model::{
    BodyCompositionRecord, DerivedMetricEntry, ImportOutcome, ImportPhase, MetricKind,
};
use crate::domain::ports::HealthStore;
use crate::utils::error::{ImportError, Result};
use chrono::Utc;

/// Maps parsed records to health entries and submits them as one batch.
pub struct HealthDataImporter<H: HealthStore> {
    store: H,
}

impl<H: HealthStore> HealthDataImporter<H> {
    pub fn new(store: H) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &H {
        &self.store
    }

    /// Never fails: per-record problems and a rejected submission are both
    /// reported through the returned outcome.
    pub async fn import(&self, records: &[BodyCompositionRecord]) -> ImportOutcome {
        let mut phase = ImportPhase::Idle;
        advance(&mut phase, ImportPhase::Transforming);

        let mut batch = Vec::with_capacity(records.len() * MetricKind::ALL.len());
        let mut successful = 0;
        let mut errors = Vec::new();

        for record in records {
            match derive_entries(record) {
                Ok(entries) => {
                    batch.extend(entries);
                    successful += 1;
                }
                Err(e) => {
                    let message = format!(
                        "Error processing data at {}: {}",
                        record.time.to_rfc3339(),
                        e
                    );
                    tracing::warn!("{}", message);
                    errors.push(message);
                }
            }
        }

        advance(&mut phase, ImportPhase::Submitting);
        tracing::info!(
            "Submitting {} entries from {} of {} records",
            batch.len(),
            successful,
            records.len()
        );

        match self.store.insert_batch(&batch).await {
            Ok(()) => {
                advance(&mut phase, ImportPhase::Completed { success: true });
                ImportOutcome::completed(records.len(), successful, errors)
            }
            Err(e) => {
                advance(&mut phase, ImportPhase::Completed { success: false });
                tracing::error!("Health store rejected batch of {} entries: {}", batch.len(), e);
                ImportOutcome::submission_failed(
                    records.len(),
                    format!("Failed to insert records into the health store: {}", e),
                )
            }
        }
    }
}

fn advance(phase: &mut ImportPhase, next: ImportPhase) {
    tracing::debug!("Import phase: {} -> {}", phase, next);
    *phase = next;
}

/// Six entries per record, all stamped with the record's instant and offset.
///
/// All-or-nothing: if any value is outside its accepted range the record
/// yields no entries.
pub fn derive_entries(record: &BodyCompositionRecord) -> Result<Vec<DerivedMetricEntry>> {
    let lean_body_mass = record.weight * (record.muscle_rate / 100.0);

    [
        (MetricKind::Weight, record.weight),
        (MetricKind::Height, record.height / 100.0),
        (MetricKind::BodyFat, record.fat_rate),
        (MetricKind::BoneMass, record.bone_mass),
        (MetricKind::BasalMetabolicRate, f64::from(record.metabolism)),
        (MetricKind::LeanBodyMass, lean_body_mass),
    ]
    .into_iter()
    .map(|(kind, value)| entry(record, kind, value))
    .collect()
}

fn entry(record: &BodyCompositionRecord, kind: MetricKind, value: f64) -> Result<DerivedMetricEntry> {
    let (min, max) = kind.valid_range();
    // NaN 也會落在這裡
    if !(min..=max).contains(&value) {
        return Err(ImportError::MetricOutOfRange {
            metric: kind.to_string(),
            value,
            min,
            max,
            unit: kind.unit().to_string(),
        });
    }

    Ok(DerivedMetricEntry {
        kind,
        value,
        unit: kind.unit(),
        time: record.time.with_timezone(&Utc),
        zone_offset_seconds: record.time.offset().local_minus_utc(),
    })
}
