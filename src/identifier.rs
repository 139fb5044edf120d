//! Volume Identifier Generator
//!
//! Builds human-readable volume ids:
//!
//! ```text
//! NF{invoice}-{seq:3}-{ddMMyyyy}-{HHmm}[-{batch:4}]
//! NF111007-001-11082025-2313
//! ```
//!
//! The date/time part is a legibility aid rendered in a fixed civil zone,
//! not a logical clock. Two batches for the same invoice and sequence in the
//! same minute collide unless `IdSuffix::BatchCounter` is configured.

use chrono::{DateTime, FixedOffset, Utc};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;
use wms_labels_types::{ParentLabelKind, Volume};

use crate::config::{EngineConfig, IdSuffix};

const STAMP_FORMAT: &str = "%d%m%Y-%H%M";

/// Largest value of the four-digit batch suffix
const MAX_BATCH_COUNTER: u32 = 9_999;

/// Id for one volume, using the ambient clock
pub fn generate_volume_id(
    invoice_number: &str,
    sequence_number: u32,
    total_volumes: u32,
    zone: &FixedOffset,
) -> String {
    generate_volume_id_at(invoice_number, sequence_number, total_volumes, Utc::now(), zone)
}

/// Deterministic variant of [`generate_volume_id`]
pub fn generate_volume_id_at(
    invoice_number: &str,
    sequence_number: u32,
    total_volumes: u32,
    instant: DateTime<Utc>,
    zone: &FixedOffset,
) -> String {
    debug_assert!(sequence_number >= 1 && sequence_number <= total_volumes.max(1));
    format!(
        "NF{}-{:03}-{}",
        invoice_number.trim(),
        sequence_number,
        civil_stamp(instant, zone)
    )
}

/// Prefix every id of an invoice starts with
pub fn invoice_prefix(invoice_number: &str) -> String {
    format!("NF{}-", invoice_number.trim())
}

fn civil_stamp(instant: DateTime<Utc>, zone: &FixedOffset) -> String {
    instant.with_timezone(zone).format(STAMP_FORMAT).to_string()
}

/// Instant and optional counter shared by every id of one generation batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStamp {
    pub instant: DateTime<Utc>,
    pub counter: Option<u32>,
}

/// Stateful generator owned by a single caller (no shared state)
#[derive(Debug, Clone)]
pub struct IdentifierGenerator {
    zone: FixedOffset,
    suffix: IdSuffix,
    batch_counter: u32,
}

impl IdentifierGenerator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            zone: config.timezone(),
            suffix: config.id_suffix,
            batch_counter: 0,
        }
    }

    pub fn zone(&self) -> &FixedOffset {
        &self.zone
    }

    /// Open a new batch at `instant`. Advances the counter when suffixes are
    /// enabled; the counter cycles through `0001..=9999`.
    pub fn next_batch(&mut self, instant: DateTime<Utc>) -> BatchStamp {
        let counter = match self.suffix {
            IdSuffix::None => None,
            IdSuffix::BatchCounter => {
                self.batch_counter = self.batch_counter % MAX_BATCH_COUNTER + 1;
                Some(self.batch_counter)
            }
        };
        BatchStamp { instant, counter }
    }

    pub fn volume_id(
        &self,
        invoice_number: &str,
        sequence_number: u32,
        total_volumes: u32,
        stamp: &BatchStamp,
    ) -> String {
        let base = generate_volume_id_at(
            invoice_number,
            sequence_number,
            total_volumes,
            stamp.instant,
            &self.zone,
        );
        match stamp.counter {
            Some(counter) => format!("{}-{:04}", base, counter),
            None => base,
        }
    }

    /// System-generated parent label id: `EM-{ddMMyyyy}-{HHmm}-{hex4}` / `PAL-...`
    pub fn parent_label_id(&self, kind: ParentLabelKind, instant: DateTime<Utc>) -> String {
        let nonce = Uuid::new_v4().simple().to_string();
        format!(
            "{}-{}-{}",
            kind.id_prefix(),
            civil_stamp(instant, &self.zone),
            nonce[..4].to_uppercase()
        )
    }

    /// Reconcile a regenerated batch with volumes already stored for the invoice.
    ///
    /// Position `i` of `fresh` keeps the stored id at position `i` when that id
    /// already carries the `NF{invoice}-` prefix; otherwise the id is rebuilt
    /// from the stored volume's creation instant. Positions without a stored
    /// volume keep their fresh id. The stored printed flag, parent link, area
    /// and hazard profile carry over.
    pub fn reconcile_ids(
        &self,
        invoice_number: &str,
        fresh: Vec<Volume>,
        existing: &[Volume],
    ) -> Vec<Volume> {
        let prefix = invoice_prefix(invoice_number);
        let stored = stored_batch(invoice_number, existing);

        fresh
            .into_iter()
            .enumerate()
            .map(|(index, mut volume)| {
                if let Some(old) = stored.get(index) {
                    volume.id = if old.id.starts_with(&prefix) {
                        old.id.clone()
                    } else {
                        generate_volume_id_at(
                            invoice_number,
                            volume.sequence_number,
                            volume.total_volumes_in_batch,
                            old.generated_at,
                            &self.zone,
                        )
                    };
                    volume.generated_at = old.generated_at;
                    volume.printed = volume.printed || old.printed;
                    volume.parent_label_id = old.parent_label_id.clone();
                    volume.area = old.area.clone();
                    volume.cargo_kind = old.cargo_kind;
                    volume.hazard_class = old.hazard_class;
                    volume.un_number = old.un_number.clone();
                    volume.risk_code = old.risk_code.clone();
                    debug!(volume_id = %volume.id, "reconciled with stored volume");
                }
                volume
            })
            .collect()
    }
}

/// Stored volumes of an invoice, oldest batch first and in sequence order
/// within a batch: the positions [`IdentifierGenerator::reconcile_ids`]
/// matches against
pub fn stored_batch<'a>(invoice_number: &str, existing: &'a [Volume]) -> Vec<&'a Volume> {
    let invoice_number = invoice_number.trim();
    let mut stored: Vec<&Volume> = existing
        .iter()
        .filter(|v| v.belongs_to_invoice(invoice_number))
        .collect();
    stored.sort_by_key(|v| (v.generated_at, v.sequence_number));
    stored
}

/// Re-stamp `batch` so none of its ids is already taken in `existing`.
///
/// A colliding batch gets the smallest `-{n:04}` suffix under which every id
/// is free, so the batch keeps one shared stamp.
pub fn disambiguate_ids(batch: Vec<Volume>, existing: &[Volume]) -> Vec<Volume> {
    let taken: HashSet<&str> = existing.iter().map(|v| v.id.as_str()).collect();
    if !batch.iter().any(|v| taken.contains(v.id.as_str())) {
        return batch;
    }

    let suffix = (1u32..)
        .find(|n| {
            batch
                .iter()
                .all(|v| !taken.contains(format!("{}-{:04}", v.id, n).as_str()))
        })
        .unwrap_or(0);

    debug!(suffix, "batch ids collide with stored volumes, re-stamping");
    batch
        .into_iter()
        .map(|mut volume| {
            volume.id = format!("{}-{:04}", volume.id, suffix);
            volume
        })
        .collect()
}

impl Default for IdentifierGenerator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        // 2025-08-12 02:13 UTC == 2025-08-11 23:13 at UTC-03:00
        Utc.with_ymd_and_hms(2025, 8, 12, 2, 13, 0).unwrap()
    }

    fn sao_paulo() -> FixedOffset {
        EngineConfig::default().timezone()
    }

    #[test]
    fn test_id_uses_fixed_civil_zone() {
        let id = generate_volume_id_at("111007", 1, 3, instant(), &sao_paulo());
        assert_eq!(id, "NF111007-001-11082025-2313");
    }

    #[test]
    fn test_sequence_is_zero_padded() {
        let id = generate_volume_id_at("5", 42, 120, instant(), &sao_paulo());
        assert!(id.starts_with("NF5-042-"));
        let id = generate_volume_id_at("5", 120, 120, instant(), &sao_paulo());
        assert!(id.starts_with("NF5-120-"));
    }

    #[test]
    fn test_batch_counter_suffix() {
        let config = EngineConfig {
            id_suffix: IdSuffix::BatchCounter,
            ..EngineConfig::default()
        };
        let mut generator = IdentifierGenerator::new(&config);
        let first = generator.next_batch(instant());
        let second = generator.next_batch(instant());

        let a = generator.volume_id("7", 1, 1, &first);
        let b = generator.volume_id("7", 1, 1, &second);
        assert_eq!(a, "NF7-001-11082025-2313-0001");
        assert_eq!(b, "NF7-001-11082025-2313-0002");
    }

    #[test]
    fn test_no_suffix_collides_within_minute() {
        let mut generator = IdentifierGenerator::default();
        let first = generator.next_batch(instant());
        let second = generator.next_batch(instant());
        assert_eq!(
            generator.volume_id("7", 1, 1, &first),
            generator.volume_id("7", 1, 1, &second)
        );
    }

    #[test]
    fn test_batch_counter_skips_zero_on_wrap() {
        let config = EngineConfig {
            id_suffix: IdSuffix::BatchCounter,
            ..EngineConfig::default()
        };
        let mut generator = IdentifierGenerator::new(&config);
        let mut last = None;
        for _ in 0..MAX_BATCH_COUNTER {
            last = generator.next_batch(instant()).counter;
        }
        assert_eq!(last, Some(MAX_BATCH_COUNTER));
        assert_eq!(generator.next_batch(instant()).counter, Some(1));
    }

    #[test]
    fn test_disambiguate_leaves_free_ids() {
        let stored = vec![Volume::new("NF7-001-11082025-2313", "7", 1, 1, instant())];
        let batch = vec![Volume::new("NF8-001-11082025-2313", "8", 1, 1, instant())];
        assert_eq!(disambiguate_ids(batch.clone(), &stored), batch);
    }

    #[test]
    fn test_disambiguate_restamps_whole_batch() {
        let stored = vec![
            Volume::new("NF7-001-11082025-2313", "7", 1, 2, instant()),
            Volume::new("NF7-002-11082025-2313", "7", 2, 2, instant()),
            Volume::new("NF7-001-11082025-2313-0001", "7", 1, 1, instant()),
        ];
        let batch = vec![
            Volume::new("NF7-001-11082025-2313", "7", 1, 3, instant()),
            Volume::new("NF7-002-11082025-2313", "7", 2, 3, instant()),
            Volume::new("NF7-003-11082025-2313", "7", 3, 3, instant()),
        ];
        let ids: Vec<String> = disambiguate_ids(batch, &stored)
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "NF7-001-11082025-2313-0002",
                "NF7-002-11082025-2313-0002",
                "NF7-003-11082025-2313-0002",
            ]
        );
    }

    #[test]
    fn test_parent_label_id_shape() {
        let generator = IdentifierGenerator::default();
        let id = generator.parent_label_id(ParentLabelKind::Pallet, instant());
        assert!(id.starts_with("PAL-11082025-2313-"));
        assert_eq!(id.len(), "PAL-11082025-2313-".len() + 4);

        let id = generator.parent_label_id(ParentLabelKind::General, instant());
        assert!(id.starts_with("EM-"));
    }
}
