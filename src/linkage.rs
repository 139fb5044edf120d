//! Linkage Service
//!
//! Volumes reference their parent label through `parent_label_id`; the
//! parent never stores its members. Every operation takes the caller's
//! collection and returns a new one.

use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, info};
use wms_labels_types::{ParentLabel, ParentLabelKind, Volume};

use crate::config::Fallbacks;
use crate::error::{EngineError, EngineResult};
use crate::identifier::IdentifierGenerator;

/// Point every volume in `volume_ids` at `parent_label_id`.
///
/// Idempotent; an already-linked volume is reassigned. Invoice membership
/// is not checked, see [`same_invoice_candidates`].
pub fn link_volumes(
    parent_label_id: &str,
    volume_ids: &HashSet<String>,
    volumes: &[Volume],
) -> Vec<Volume> {
    let mut matched = 0usize;
    let linked: Vec<Volume> = volumes
        .iter()
        .map(|volume| {
            let mut volume = volume.clone();
            if volume_ids.contains(&volume.id) {
                matched += 1;
                volume.parent_label_id = Some(parent_label_id.to_string());
            }
            volume
        })
        .collect();

    info!(parent_label_id, requested = volume_ids.len(), matched, "Linked volumes");
    linked
}

/// Clear the parent reference of every volume in `volume_ids`
pub fn unlink_volumes(volume_ids: &HashSet<String>, volumes: &[Volume]) -> Vec<Volume> {
    volumes
        .iter()
        .map(|volume| {
            let mut volume = volume.clone();
            if volume_ids.contains(&volume.id) {
                volume.parent_label_id = None;
            }
            volume
        })
        .collect()
}

pub fn linked_volumes(parent_label_id: &str, volumes: &[Volume]) -> Vec<Volume> {
    volumes
        .iter()
        .filter(|v| v.is_linked_to(parent_label_id))
        .cloned()
        .collect()
}

pub fn linked_count(parent_label_id: &str, volumes: &[Volume]) -> usize {
    volumes
        .iter()
        .filter(|v| v.is_linked_to(parent_label_id))
        .count()
}

/// Volumes an operator may attach to `parent`: those of the parent's invoice
/// (any invoice for a standalone parent) not already linked to another parent.
pub fn same_invoice_candidates<'a>(parent: &ParentLabel, volumes: &'a [Volume]) -> Vec<&'a Volume> {
    let invoice = parent.invoice_number.trim();
    volumes
        .iter()
        .filter(|v| parent.is_standalone() || v.belongs_to_invoice(invoice))
        .filter(|v| !v.is_linked() || v.is_linked_to(&parent.id))
        .collect()
}

/// Replace the volume with the same id, leaving the rest untouched
pub fn replace_volume(volumes: &[Volume], updated: &Volume) -> Vec<Volume> {
    volumes
        .iter()
        .map(|v| {
            if v.id == updated.id {
                updated.clone()
            } else {
                v.clone()
            }
        })
        .collect()
}

/// Build a parent label. A supplied id must not be blank; without one an
/// id is generated. A blank description becomes the configured default.
pub fn create_parent_label(
    generator: &IdentifierGenerator,
    id: Option<&str>,
    description: &str,
    kind: ParentLabelKind,
    invoice_number: &str,
    fallbacks: &Fallbacks,
) -> EngineResult<ParentLabel> {
    let now = Utc::now();
    let id = match id {
        Some(id) if id.trim().is_empty() => return Err(EngineError::InvalidParentLabelId),
        Some(id) => id.trim().to_string(),
        None => generator.parent_label_id(kind, now),
    };
    let description = match description.trim() {
        "" => fallbacks.parent_description.clone(),
        d => d.to_string(),
    };

    debug!(parent_label_id = %id, kind = %kind, "parent label created");
    let mut label = ParentLabel::new(id, kind, description, invoice_number.trim());
    label.created_at = now;
    Ok(label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(invoice: &str, n: u32) -> Vec<Volume> {
        (1..=n)
            .map(|i| Volume::new(format!("NF{}-{:03}", invoice, i), invoice, i, n, Utc::now()))
            .collect()
    }

    fn ids(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_link_only_touches_selected() {
        let volumes = batch("1", 3);
        let linked = link_volumes("EM-1", &ids(&["NF1-001", "NF1-003"]), &volumes);
        assert!(linked[0].is_linked_to("EM-1"));
        assert!(!linked[1].is_linked());
        assert!(linked[2].is_linked_to("EM-1"));
        assert_eq!(linked_count("EM-1", &linked), 2);
        assert!(!volumes[0].is_linked());
    }

    #[test]
    fn test_link_is_idempotent() {
        let volumes = batch("1", 3);
        let selection = ids(&["NF1-002"]);
        let once = link_volumes("EM-1", &selection, &volumes);
        let twice = link_volumes("EM-1", &selection, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_relink_reassigns() {
        let volumes = batch("1", 2);
        let selection = ids(&["NF1-001"]);
        let first = link_volumes("EM-1", &selection, &volumes);
        let second = link_volumes("PAL-2", &selection, &first);
        assert!(second[0].is_linked_to("PAL-2"));
        assert_eq!(linked_count("EM-1", &second), 0);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let volumes = batch("1", 2);
        let linked = link_volumes("EM-1", &ids(&["NF9-001"]), &volumes);
        assert_eq!(linked, volumes);
    }

    #[test]
    fn test_unlink() {
        let volumes = link_volumes("EM-1", &ids(&["NF1-001", "NF1-002"]), &batch("1", 2));
        let unlinked = unlink_volumes(&ids(&["NF1-002"]), &volumes);
        assert_eq!(linked_volumes("EM-1", &unlinked).len(), 1);
    }

    #[test]
    fn test_candidates_exclude_other_invoices_and_parents() {
        let mut volumes = batch("1", 2);
        volumes.extend(batch("2", 1));
        volumes[1].parent_label_id = Some("OTHER".into());
        let parent = ParentLabel::new("EM-1", ParentLabelKind::General, "", "1");

        let candidates = same_invoice_candidates(&parent, &volumes);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "NF1-001");
    }

    #[test]
    fn test_create_parent_label_validation() {
        let generator = IdentifierGenerator::default();
        let fallbacks = Fallbacks::default();
        let err = create_parent_label(
            &generator,
            Some("  "),
            "",
            ParentLabelKind::General,
            "",
            &fallbacks,
        )
        .unwrap_err();
        assert_eq!(err, EngineError::InvalidParentLabelId);

        let label =
            create_parent_label(&generator, None, "", ParentLabelKind::Pallet, "1", &fallbacks)
                .unwrap();
        assert!(label.id.starts_with("PAL-"));
        assert_eq!(label.description, "Etiqueta Mãe");
        assert_eq!(label.invoice_number, "1");
    }

    #[test]
    fn test_replace_volume() {
        let volumes = batch("1", 2);
        let mut updated = volumes[1].clone();
        updated.area = "09".into();
        let replaced = replace_volume(&volumes, &updated);
        assert_eq!(replaced[1].area, "09");
        assert_eq!(replaced[0], volumes[0]);
    }
}
