//! Print workflow
//!
//! ```text
//!  request_print ──► existing printed volumes of another batch?
//!        │                 │ yes                     │ no
//!        │                 ▼                         ▼
//!        │        NeedsConfirmation ──confirm──► execute_print ──► Printed
//!        │
//!  reprint_single ───────────────────────────────────────────────► Printed
//! ```
//!
//! `printed` only ever goes false -> true, and only here.

use std::collections::HashSet;
use tracing::{debug, info};
use wms_labels_types::{
    FormatSpec, LabelKind, ParentLabel, ParentLabelKind, ParentPrint, PendingPrint, PrintJob,
    PrintOutcome, PrintValidationResult, Volume,
};

use super::payload::{parent_header, representative_volume, volume_header};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::identifier::IdentifierGenerator;
use crate::invoice::InvoiceData;
use crate::linkage::{create_parent_label, linked_volumes};

fn same_batch(a: &Volume, b: &Volume) -> bool {
    a.batch_id.is_some() && a.batch_id == b.batch_id
}

/// Printed volumes of `volume`'s invoice, other than `volume` itself and
/// outside its generation batch
pub fn existing_volumes_count(volume: &Volume, volumes: &[Volume]) -> usize {
    volumes
        .iter()
        .filter(|v| v.belongs_to_invoice(&volume.invoice_number))
        .filter(|v| v.printed && v.id != volume.id)
        .filter(|v| !same_batch(v, volume))
        .count()
}

/// Fresh print request: either prints straight away or parks the request
/// until [`confirm_print`] is called.
pub fn request_print(
    volume: &Volume,
    volumes: &[Volume],
    invoice: Option<&InvoiceData>,
    format: &FormatSpec,
    config: &EngineConfig,
) -> PrintValidationResult {
    let existing = existing_volumes_count(volume, volumes);
    if existing > 0 {
        info!(
            invoice = %volume.invoice_number,
            existing,
            "Printed volumes already exist, confirmation required"
        );
        return PrintValidationResult::NeedsConfirmation {
            pending: PendingPrint {
                volume: volume.clone(),
                invoice_number: volume.invoice_number.clone(),
                existing_volumes_count: existing,
            },
            existing_volumes_count: existing,
        };
    }
    PrintValidationResult::Printed(execute_print(volume, volumes, invoice, format, config))
}

/// Operator confirmed a parked request; prints without re-checking
pub fn confirm_print(
    pending: &PendingPrint,
    volumes: &[Volume],
    invoice: Option<&InvoiceData>,
    format: &FormatSpec,
    config: &EngineConfig,
) -> PrintOutcome {
    debug!(
        invoice = %pending.invoice_number,
        existing = pending.existing_volumes_count,
        "print confirmed"
    );
    execute_print(&pending.volume, volumes, invoice, format, config)
}

/// Print every volume of `volume`'s invoice.
///
/// Targets are stamped with the resolved carrier and marked printed in the
/// returned collection; volumes of other invoices are returned unchanged.
/// A `volume` missing from the collection is appended to it.
pub fn execute_print(
    volume: &Volume,
    volumes: &[Volume],
    invoice: Option<&InvoiceData>,
    format: &FormatSpec,
    config: &EngineConfig,
) -> PrintOutcome {
    let header = volume_header(volume, invoice, format, config);

    let mut updated: Vec<Volume> = volumes.to_vec();
    if !updated.iter().any(|v| v.id == volume.id) {
        updated.push(volume.clone());
    }

    let mut targets = Vec::new();
    for v in updated
        .iter_mut()
        .filter(|v| v.belongs_to_invoice(&volume.invoice_number))
    {
        v.carrier = header.carrier.clone();
        v.mark_printed();
        targets.push(v.clone());
    }

    info!(
        invoice = %volume.invoice_number,
        volumes = targets.len(),
        carrier = %header.carrier,
        layout = %format.layout_style,
        "Printing volume labels"
    );

    PrintOutcome {
        job: PrintJob::new(LabelKind::Volume, format.clone(), header, targets, None),
        volumes: updated,
    }
}

/// Reprint exactly one volume. Siblings are left untouched and no
/// confirmation is asked for.
pub fn reprint_single(
    volume_id: &str,
    volumes: &[Volume],
    invoice: Option<&InvoiceData>,
    format: &FormatSpec,
    config: &EngineConfig,
) -> EngineResult<PrintOutcome> {
    let target = volumes
        .iter()
        .find(|v| v.id == volume_id)
        .ok_or_else(|| EngineError::NothingToReprint {
            volume_id: volume_id.to_string(),
        })?;

    let header = volume_header(target, invoice, format, config);
    let mut reprinted = target.clone();
    reprinted.carrier = header.carrier.clone();
    reprinted.mark_printed();

    info!(volume_id, carrier = %header.carrier, "Reprinting volume label");

    let updated = volumes
        .iter()
        .map(|v| {
            if v.id == volume_id {
                reprinted.clone()
            } else {
                v.clone()
            }
        })
        .collect();

    Ok(PrintOutcome {
        job: PrintJob::new(LabelKind::Volume, format.clone(), header, vec![reprinted], None),
        volumes: updated,
    })
}

/// Print a parent label over its currently linked volumes. Linked volumes
/// are not modified; the returned label is marked printed.
pub fn print_parent_label(
    label: &ParentLabel,
    volumes: &[Volume],
    format: &FormatSpec,
    config: &EngineConfig,
) -> ParentPrint {
    let linked = linked_volumes(&label.id, volumes);
    let header = parent_header(label, &linked, format, config);
    let representative = representative_volume(label, &linked, &header);

    info!(
        parent_label_id = %label.id,
        kind = %label.kind,
        linked = linked.len(),
        weight = %header.gross_weight,
        "Printing parent label"
    );

    let mut printed = label.clone();
    printed.printed = true;
    ParentPrint {
        job: PrintJob::new(
            LabelKind::ParentLabel,
            format.clone(),
            header,
            vec![representative],
            Some(label.id.clone()),
        ),
        label: printed,
    }
}

/// Mint a standalone parent label (no invoice, nothing linked) and print it
pub fn create_and_print_parent_label(
    generator: &IdentifierGenerator,
    id: Option<&str>,
    description: &str,
    kind: ParentLabelKind,
    format: &FormatSpec,
    config: &EngineConfig,
) -> EngineResult<ParentPrint> {
    let label = create_parent_label(generator, id, description, kind, "", &config.fallbacks)?;
    Ok(print_parent_label(&label, &[], format, config))
}

/// Ids whose `printed` flag differs between two collections
pub fn newly_printed(before: &[Volume], after: &[Volume]) -> HashSet<String> {
    let was_printed: HashSet<&str> = before
        .iter()
        .filter(|v| v.printed)
        .map(|v| v.id.as_str())
        .collect();
    after
        .iter()
        .filter(|v| v.printed && !was_printed.contains(v.id.as_str()))
        .map(|v| v.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn batch(invoice: &str, n: u32, printed: bool) -> Vec<Volume> {
        let batch_id = Some(Uuid::new_v4());
        (1..=n)
            .map(|i| {
                let id = format!("NF{}-{:03}-{}", invoice, i, Uuid::new_v4());
                let mut v = Volume::new(id, invoice, i, n, Utc::now());
                v.batch_id = batch_id;
                v.printed = printed;
                v
            })
            .collect()
    }

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_fresh_batch_with_printed_history_needs_confirmation() {
        let mut volumes = batch("100", 3, true);
        let fresh = batch("100", 2, false);
        volumes.extend(fresh.clone());

        let result = request_print(&fresh[0], &volumes, None, &FormatSpec::default(), &config());
        assert!(result.needs_confirmation());
        assert_eq!(result.existing_volumes_count(), 3);
        assert!(volumes.iter().filter(|v| !v.printed).count() == 2);
    }

    #[test]
    fn test_same_batch_prints_directly() {
        let mut volumes = batch("100", 3, false);
        volumes[0].printed = true;
        let result = request_print(&volumes[1], &volumes, None, &FormatSpec::default(), &config());
        let outcome = result.into_outcome().unwrap();
        assert_eq!(outcome.job.label_count(), 3);
        assert!(outcome.volumes.iter().all(|v| v.printed));
    }

    #[test]
    fn test_other_invoices_untouched() {
        let mut volumes = batch("100", 2, false);
        volumes.extend(batch("200", 1, false));
        let outcome = execute_print(&volumes[0], &volumes, None, &FormatSpec::default(), &config());
        assert_eq!(outcome.job.label_count(), 2);
        assert!(!outcome.volumes[2].printed);
        assert_eq!(
            newly_printed(&volumes, &outcome.volumes),
            volumes[..2].iter().map(|v| v.id.clone()).collect()
        );
    }

    #[test]
    fn test_confirm_executes_pending() {
        let mut volumes = batch("100", 1, true);
        let fresh = batch("100", 1, false);
        volumes.extend(fresh.clone());

        let result = request_print(&fresh[0], &volumes, None, &FormatSpec::default(), &config());
        let PrintValidationResult::NeedsConfirmation { pending, .. } = result else {
            panic!("expected confirmation");
        };
        let outcome = confirm_print(&pending, &volumes, None, &FormatSpec::default(), &config());
        assert!(outcome.volumes.iter().all(|v| v.printed));
    }

    #[test]
    fn test_reprint_touches_only_target() {
        let volumes = batch("100", 3, false);
        let outcome = reprint_single(
            &volumes[1].id,
            &volumes,
            None,
            &FormatSpec::new("A4", "transul"),
            &config(),
        )
        .unwrap();
        assert_eq!(outcome.job.label_count(), 1);
        assert_eq!(outcome.job.header.carrier, "Transul Transporte");
        assert!(outcome.volumes[1].printed);
        assert!(!outcome.volumes[0].printed);
        assert!(!outcome.volumes[2].printed);
    }

    #[test]
    fn test_reprint_unknown_volume() {
        let err =
            reprint_single("missing", &[], None, &FormatSpec::default(), &config()).unwrap_err();
        assert_eq!(
            err,
            EngineError::NothingToReprint {
                volume_id: "missing".into()
            }
        );
    }

    #[test]
    fn test_create_and_print_standalone_parent() {
        let generator = IdentifierGenerator::default();
        let print = create_and_print_parent_label(
            &generator,
            Some("PAL-7"),
            "Palete expedição",
            ParentLabelKind::Pallet,
            &FormatSpec::default(),
            &config(),
        )
        .unwrap();
        assert!(print.label.printed);
        assert!(print.label.is_standalone());
        assert_eq!(print.job.kind, LabelKind::ParentLabel);
        assert_eq!(print.job.parent_label_id.as_deref(), Some("PAL-7"));
        assert_eq!(print.job.header.gross_weight, "0 Kg");
        assert_eq!(print.job.volumes[0].quantity, 0);
    }
}
