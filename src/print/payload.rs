//! Print payload assembly
//!
//! Turns volumes plus invoice data into the resolved header the renderer
//! prints, and synthesizes the representative volume of a parent label.

use chrono::Utc;
use wms_labels_types::{FormatSpec, HazardClass, ParentLabel, PrintHeader, Volume};

use crate::config::EngineConfig;
use crate::invoice::{InvoiceData, ResolvedParties};
use crate::weight::total_weight;

/// Carrier printed on a label: a partner layout forces its own name,
/// otherwise the resolved value is used.
pub fn resolve_carrier(resolved: &str, format: &FormatSpec, config: &EngineConfig) -> String {
    match config.forced_carrier(&format.layout_style) {
        Some(forced) => forced.to_string(),
        None => resolved.to_string(),
    }
}

/// Header for a volume print, resolved from `representative` then `invoice`
pub fn volume_header(
    representative: &Volume,
    invoice: Option<&InvoiceData>,
    format: &FormatSpec,
    config: &EngineConfig,
) -> PrintHeader {
    let parties = ResolvedParties::for_volume(representative, invoice, &config.fallbacks);
    PrintHeader {
        city_full: parties.city_full(),
        carrier: resolve_carrier(&parties.carrier, format, config),
        origin: parties.origin,
        destination: parties.destination,
        address: parties.address,
        city: parties.city,
        state: parties.state,
        gross_weight: parties.gross_weight,
        invoice_key: parties.invoice_key,
        parent_kind: None,
    }
}

/// Header for a parent label print.
///
/// Party fields are resolved from the first linked volume through the usual
/// volume -> fallback chain; the weight is the sum over every linked volume.
/// With nothing linked, every field is empty and the weight is the
/// configured zero weight.
pub fn parent_header(
    label: &ParentLabel,
    linked: &[Volume],
    format: &FormatSpec,
    config: &EngineConfig,
) -> PrintHeader {
    let fallbacks = &config.fallbacks;
    let mut header = match linked.first() {
        Some(first) => {
            let parties = ResolvedParties::for_volume(first, None, fallbacks);
            PrintHeader {
                city_full: parties.city_full(),
                carrier: parties.carrier,
                origin: parties.origin,
                destination: parties.destination,
                address: parties.address,
                city: parties.city,
                state: parties.state,
                gross_weight: total_weight(linked, &config.weight_unit),
                invoice_key: parties.invoice_key,
                parent_kind: None,
            }
        }
        None => PrintHeader {
            gross_weight: fallbacks.gross_weight.clone(),
            carrier: fallbacks.carrier.clone(),
            ..PrintHeader::default()
        },
    };
    header.carrier = resolve_carrier(&header.carrier, format, config);
    header.parent_kind = Some(label.kind);
    header
}

/// Single printable volume standing in for a parent label
pub fn representative_volume(
    label: &ParentLabel,
    linked: &[Volume],
    header: &PrintHeader,
) -> Volume {
    let invoice_number = linked
        .first()
        .map(|v| v.invoice_number.clone())
        .unwrap_or_else(|| label.invoice_number.clone());

    let mut volume = Volume::new(label.id.clone(), invoice_number, 1, 1, Utc::now());
    volume.description = label.description.clone();
    volume.quantity = u32::try_from(linked.len()).unwrap_or(u32::MAX);
    volume.origin = header.origin.clone();
    volume.destination = header.destination.clone();
    volume.address = header.address.clone();
    volume.city = header.city.clone();
    volume.state = header.state.clone();
    volume.gross_weight = header.gross_weight.clone();
    volume.invoice_key = header.invoice_key.clone();
    volume.carrier = header.carrier.clone();
    volume.hazard_class = HazardClass::Unclassified;
    volume.parent_label_id = Some(label.id.clone());
    volume
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wms_labels_types::ParentLabelKind;

    fn volume(id: &str, weight: &str) -> Volume {
        let mut v = Volume::new(id, "10", 1, 2, Utc::now());
        v.gross_weight = weight.into();
        v.city = "Santos".into();
        v.state = "SP".into();
        v.carrier = "Rapido Sul".into();
        v.parent_label_id = Some("EM-1".into());
        v
    }

    #[test]
    fn test_partner_layout_forces_carrier() {
        let config = EngineConfig::default();
        let v = volume("a", "1 Kg");
        let header = volume_header(&v, None, &FormatSpec::new("A4", "transul_enhanced"), &config);
        assert_eq!(header.carrier, "Transul Transporte");
        let header = volume_header(&v, None, &FormatSpec::default(), &config);
        assert_eq!(header.carrier, "Rapido Sul");
    }

    #[test]
    fn test_volume_header_uses_invoice_then_fallback() {
        let config = EngineConfig::default();
        let v = Volume::new("NF10-001", "10", 1, 1, Utc::now());
        let invoice = InvoiceData::from_json(json!({"transportadora": "Jamef"})).unwrap();
        let header = volume_header(&v, Some(&invoice), &FormatSpec::default(), &config);
        assert_eq!(header.carrier, "Jamef");
        assert_eq!(header.city, "CIDADE");
        assert_eq!(header.city_full, "CIDADE - UF");
        assert_eq!(header.invoice_key, "10");
    }

    #[test]
    fn test_parent_header_aggregates_linked() {
        let config = EngineConfig::default();
        let label = ParentLabel::new("EM-1", ParentLabelKind::Pallet, "Palete 1", "10");
        let linked = vec![volume("a", "10.00 Kg"), volume("b", "5,50 Kg")];
        let header = parent_header(&label, &linked, &FormatSpec::default(), &config);
        assert_eq!(header.gross_weight, "15.50 Kg");
        assert_eq!(header.city_full, "Santos - SP");
        assert_eq!(header.carrier, "Rapido Sul");
        assert_eq!(header.parent_kind, Some(ParentLabelKind::Pallet));

        let rep = representative_volume(&label, &linked, &header);
        assert_eq!(rep.quantity, 2);
        assert_eq!(rep.id, "EM-1");
        assert_eq!(rep.description, "Palete 1");
    }

    #[test]
    fn test_parent_header_fills_blank_parties() {
        let config = EngineConfig::default();
        let label = ParentLabel::new("EM-3", ParentLabelKind::General, "Mix", "10");
        let bare = Volume::new("NF10-001", "10", 1, 1, Utc::now());
        let mut linked = bare.clone();
        linked.parent_label_id = Some("EM-3".into());

        let header = parent_header(&label, &[linked], &FormatSpec::default(), &config);
        assert_eq!(header.city, "CIDADE");
        assert_eq!(header.origin, "REMETENTE");
        assert_eq!(header.city_full, "CIDADE - UF");
        assert_eq!(header.carrier, "Transportadora não especificada");
        assert_eq!(header.invoice_key, "10");
    }

    #[test]
    fn test_parent_header_without_links() {
        let config = EngineConfig::default();
        let label = ParentLabel::new("EM-2", ParentLabelKind::General, "Mix", "");
        let header = parent_header(&label, &[], &FormatSpec::default(), &config);
        assert_eq!(header.origin, "");
        assert_eq!(header.city_full, "");
        assert_eq!(header.gross_weight, "0 Kg");
        assert_eq!(header.carrier, "Transportadora não especificada");
        assert_eq!(representative_volume(&label, &[], &header).quantity, 0);
    }
}
