//! Volume Factory
//!
//! Expands a receiving document and a requested count into a batch of
//! volumes. All-or-nothing: invalid input yields an error and no volumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use wms_labels_types::{CargoKind, Volume};

use crate::classification::HazardProfile;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::identifier::IdentifierGenerator;
use crate::invoice::{Field, InvoiceData, ResolvedParties};

/// Operator input for one generation batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub invoice_number: String,
    /// Signed so that non-positive operator input can be reported as-is
    pub volume_count: i64,
    #[serde(default)]
    pub gross_weight: String,
    #[serde(default)]
    pub cargo_kind: CargoKind,
    #[serde(default)]
    pub un_number: Option<String>,
    #[serde(default)]
    pub risk_code: Option<String>,
    #[serde(default = "default_area")]
    pub area: String,
}

fn default_area() -> String {
    "01".to_string()
}

impl GenerateRequest {
    pub fn new(invoice_number: impl Into<String>, volume_count: i64) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            volume_count,
            gross_weight: String::new(),
            cargo_kind: CargoKind::General,
            un_number: None,
            risk_code: None,
            area: default_area(),
        }
    }

    pub fn with_weight(mut self, gross_weight: impl Into<String>) -> Self {
        self.gross_weight = gross_weight.into();
        self
    }

    pub fn chemical(mut self, un_number: Option<&str>, risk_code: Option<&str>) -> Self {
        self.cargo_kind = CargoKind::Chemical;
        self.un_number = un_number.map(str::to_string);
        self.risk_code = risk_code.map(str::to_string);
        self
    }

    fn validate(&self) -> EngineResult<(String, u32)> {
        let invoice_number = self.invoice_number.trim();
        if invoice_number.is_empty() {
            return Err(EngineError::MissingInvoiceNumber);
        }
        let count = u32::try_from(self.volume_count)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(EngineError::InvalidVolumeCount(self.volume_count))?;
        Ok((invoice_number.to_string(), count))
    }

    pub fn hazard_profile(&self) -> HazardProfile {
        HazardProfile::from_cargo(
            self.cargo_kind,
            self.un_number.as_deref(),
            self.risk_code.as_deref(),
        )
    }
}

/// Generate a batch at the current instant
pub fn generate_volumes(
    generator: &mut IdentifierGenerator,
    request: &GenerateRequest,
    invoice: Option<&InvoiceData>,
    config: &EngineConfig,
) -> EngineResult<Vec<Volume>> {
    generate_volumes_at(generator, request, invoice, config, Utc::now())
}

pub fn generate_volumes_at(
    generator: &mut IdentifierGenerator,
    request: &GenerateRequest,
    invoice: Option<&InvoiceData>,
    config: &EngineConfig,
    instant: DateTime<Utc>,
) -> EngineResult<Vec<Volume>> {
    let (invoice_number, count) = request.validate()?;

    let stamp = generator.next_batch(instant);
    let batch_id = Uuid::new_v4();
    let parties = ResolvedParties::for_invoice(invoice, &config.fallbacks);
    let gross_weight = if request.gross_weight.trim().is_empty() {
        parties.gross_weight.clone()
    } else {
        request.gross_weight.trim().to_string()
    };
    let invoice_key = invoice
        .and_then(|i| i.first(Field::InvoiceKey))
        .unwrap_or(invoice_number.as_str())
        .to_string();
    let hazard = request.hazard_profile();

    info!(
        invoice = %invoice_number,
        count,
        cargo_kind = %request.cargo_kind,
        "Generating volumes"
    );

    let volumes: Vec<Volume> = (1..=count)
        .map(|seq| {
            let id = generator.volume_id(&invoice_number, seq, count, &stamp);
            let mut volume = Volume::new(id, invoice_number.clone(), seq, count, stamp.instant);
            volume.batch_id = Some(batch_id);
            volume.gross_weight = gross_weight.clone();
            volume.origin = parties.origin.clone();
            volume.destination = parties.destination.clone();
            volume.address = parties.address.clone();
            volume.city = parties.city.clone();
            volume.state = parties.state.clone();
            volume.carrier = parties.carrier.clone();
            volume.invoice_key = invoice_key.clone();
            volume.order_number = parties.order_number.clone();
            volume.area = request.area.clone();
            volume.cargo_kind = request.cargo_kind;
            volume.hazard_class = hazard.class;
            if hazard.class.carries_codes() {
                volume.un_number = hazard.un_number.clone();
                volume.risk_code = hazard.risk_code.clone();
            }
            volume
        })
        .collect();

    debug!(batch_id = %batch_id, first = ?volumes.first().map(|v| &v.id), "batch generated");
    Ok(volumes)
}
