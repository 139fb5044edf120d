//! Store-facing label record
//!
//! The shape the persistence collaborator writes to its `etiquetas` table.
//! Field names follow the store's columns; empty strings become `null`.

use serde::{Deserialize, Serialize};

use crate::{HazardClass, Volume};

/// Status written for freshly generated labels
pub const STATUS_GENERATED: &str = "gerada";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "tipo")]
    pub label_type: String,
    pub area: Option<String>,
    #[serde(rename = "remetente")]
    pub origin: Option<String>,
    #[serde(rename = "destinatario")]
    pub destination: Option<String>,
    #[serde(rename = "endereco")]
    pub address: Option<String>,
    #[serde(rename = "cidade")]
    pub city: Option<String>,
    #[serde(rename = "uf")]
    pub state: Option<String>,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "transportadora")]
    pub carrier: Option<String>,
    #[serde(rename = "chave_nf")]
    pub invoice_key: Option<String>,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "peso_total_bruto")]
    pub gross_weight: Option<String>,
    #[serde(rename = "numero_pedido")]
    pub order_number: Option<String>,
    #[serde(rename = "volume_numero")]
    pub sequence_number: u32,
    #[serde(rename = "total_volumes")]
    pub total_volumes: u32,
    #[serde(rename = "codigo_onu")]
    pub un_number: Option<String>,
    #[serde(rename = "codigo_risco")]
    pub risk_code: Option<String>,
    #[serde(rename = "classificacao_quimica")]
    pub hazard_class: Option<HazardClass>,
    #[serde(rename = "etiqueta_mae_id")]
    pub parent_label_id: Option<String>,
    pub status: String,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl LabelRecord {
    pub fn from_volume(volume: &Volume) -> Self {
        let description = if volume.description.trim().is_empty() {
            Volume::default_description(
                volume.sequence_number.max(1),
                volume.total_volumes_in_batch.max(1),
            )
        } else {
            volume.description.clone()
        };

        Self {
            code: volume.id.clone(),
            label_type: "volume".to_string(),
            area: non_empty(&volume.area),
            origin: non_empty(&volume.origin),
            destination: non_empty(&volume.destination),
            address: non_empty(&volume.address),
            city: non_empty(&volume.city),
            state: non_empty(&volume.state),
            description,
            carrier: non_empty(&volume.carrier),
            invoice_key: non_empty(&volume.invoice_key)
                .or_else(|| non_empty(&volume.invoice_number)),
            quantity: volume.quantity.max(1),
            gross_weight: non_empty(&volume.gross_weight),
            order_number: non_empty(&volume.order_number),
            sequence_number: volume.sequence_number.max(1),
            total_volumes: volume.total_volumes_in_batch.max(1),
            un_number: non_empty(&volume.un_number),
            risk_code: non_empty(&volume.risk_code),
            hazard_class: match volume.hazard_class {
                HazardClass::Unclassified => None,
                other => Some(other),
            },
            parent_label_id: volume.parent_label_id.clone(),
            status: STATUS_GENERATED.to_string(),
        }
    }
}
