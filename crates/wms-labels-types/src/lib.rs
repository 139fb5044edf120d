//! Shared Types for the Receiving Label Engine
//!
//! This crate is the SINGLE SOURCE OF TRUTH for every record crossing the
//! engine boundary: volumes and parent labels held by the caller, and the
//! print payloads handed to the external renderer.
//!
//! ## Boundaries
//!
//! ```text
//! ┌──────────────────┐  Volume[] / PrintJob  ┌──────────────────┐
//! │  Label engine    │ ────────────────────► │  Renderer / UI   │
//! │  (wms-labels)    │ ◄──────────────────── │  Document store  │
//! └──────────────────┘   invoice JSON        └──────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. Enums serialize as `snake_case` strings
//! 2. Records are plain data - no behavior that mutates engine state
//! 3. Store-facing shapes (`LabelRecord`) carry the store's column names via serde renames

pub mod print;
pub mod record;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub use print::*;
pub use record::LabelRecord;

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Hazard classification of a single volume.
///
/// At most one classification is effective at a time; re-classification
/// overwrites the previous value wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardClass {
    None,
    NonHazardous,
    Hazardous,
    #[default]
    Unclassified,
}

impl HazardClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::NonHazardous => "non_hazardous",
            Self::Hazardous => "hazardous",
            Self::Unclassified => "unclassified",
        }
    }

    /// Only hazardous volumes carry UN number / risk code.
    pub fn carries_codes(&self) -> bool {
        matches!(self, Self::Hazardous)
    }
}

impl std::fmt::Display for HazardClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HazardClass {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "non_hazardous" | "nao_perigosa" => Ok(Self::NonHazardous),
            "hazardous" | "perigosa" => Ok(Self::Hazardous),
            "unclassified" | "nao_classificada" => Ok(Self::Unclassified),
            _ => Err(UnknownVariant::new("hazard class", s)),
        }
    }
}

/// Operator-supplied cargo type for a receiving batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CargoKind {
    #[default]
    #[serde(alias = "geral")]
    General,
    #[serde(alias = "quimico")]
    Chemical,
}

impl CargoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Chemical => "chemical",
        }
    }
}

impl std::fmt::Display for CargoKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CargoKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" | "geral" => Ok(Self::General),
            "chemical" | "quimico" => Ok(Self::Chemical),
            _ => Err(UnknownVariant::new("cargo kind", s)),
        }
    }
}

/// Kind of parent ("mother") label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentLabelKind {
    #[default]
    #[serde(alias = "geral")]
    General,
    #[serde(alias = "palete")]
    Pallet,
}

impl ParentLabelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Pallet => "pallet",
        }
    }

    /// Prefix used for system-generated ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::General => "EM",
            Self::Pallet => "PAL",
        }
    }
}

impl std::fmt::Display for ParentLabelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParentLabelKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" | "geral" => Ok(Self::General),
            "pallet" | "palete" => Ok(Self::Pallet),
            _ => Err(UnknownVariant::new("parent label kind", s)),
        }
    }
}

/// Returned by the `FromStr` impls in this crate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

// ============================================================================
// VOLUME
// ============================================================================

/// One physically identifiable unit of a shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    /// `NF{invoice}-{seq:3}-{ddMMyyyy}-{HHmm}`
    pub id: String,
    pub invoice_number: String,
    pub sequence_number: u32,
    pub total_volumes_in_batch: u32,
    /// Shared by every volume produced in one generation call.
    /// `None` for synthetic parent-label volumes.
    #[serde(default)]
    pub batch_id: Option<Uuid>,

    pub description: String,
    /// Numeric text with unit, e.g. `"12.50 Kg"`
    #[serde(default)]
    pub gross_weight: String,

    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub carrier: String,
    #[serde(default)]
    pub invoice_key: String,
    #[serde(default)]
    pub order_number: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub area: String,

    #[serde(default)]
    pub cargo_kind: CargoKind,
    #[serde(default)]
    pub hazard_class: HazardClass,
    #[serde(default)]
    pub un_number: String,
    #[serde(default)]
    pub risk_code: String,

    #[serde(default)]
    pub parent_label_id: Option<String>,
    /// One-way flag, only the print workflow sets it
    #[serde(default)]
    pub printed: bool,
    pub generated_at: DateTime<Utc>,
}

fn default_quantity() -> u32 {
    1
}

impl Volume {
    /// Bare volume with the default description and every optional field empty
    pub fn new(
        id: impl Into<String>,
        invoice_number: impl Into<String>,
        sequence_number: u32,
        total_volumes_in_batch: u32,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            invoice_number: invoice_number.into(),
            sequence_number,
            total_volumes_in_batch,
            batch_id: None,
            description: Self::default_description(sequence_number, total_volumes_in_batch),
            gross_weight: String::new(),
            origin: String::new(),
            destination: String::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            carrier: String::new(),
            invoice_key: String::new(),
            order_number: String::new(),
            quantity: default_quantity(),
            area: String::new(),
            cargo_kind: CargoKind::default(),
            hazard_class: HazardClass::default(),
            un_number: String::new(),
            risk_code: String::new(),
            parent_label_id: None,
            printed: false,
            generated_at,
        }
    }

    /// `"Volume {seq}/{total}"`
    pub fn default_description(sequence_number: u32, total: u32) -> String {
        format!("Volume {}/{}", sequence_number, total)
    }

    pub fn is_linked(&self) -> bool {
        self.parent_label_id.is_some()
    }

    pub fn is_linked_to(&self, parent_label_id: &str) -> bool {
        self.parent_label_id.as_deref() == Some(parent_label_id)
    }

    pub fn belongs_to_invoice(&self, invoice_number: &str) -> bool {
        self.invoice_number == invoice_number
    }

    /// Flip the printed flag. It never reverts.
    pub fn mark_printed(&mut self) {
        self.printed = true;
    }
}

// ============================================================================
// PARENT LABEL
// ============================================================================

/// Logical grouping of volumes (pallet or consolidated shipment).
///
/// Membership is derived: a volume belongs to this label when its
/// `parent_label_id` equals `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentLabel {
    pub id: String,
    #[serde(default)]
    pub kind: ParentLabelKind,
    #[serde(default)]
    pub description: String,
    /// May be empty - a parent label can exist independently of any invoice
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub printed: bool,
    pub created_at: DateTime<Utc>,
}

impl ParentLabel {
    pub fn new(
        id: impl Into<String>,
        kind: ParentLabelKind,
        description: impl Into<String>,
        invoice_number: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            description: description.into(),
            invoice_number: invoice_number.into(),
            printed: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_standalone(&self) -> bool {
        self.invoice_number.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazard_class_serde_is_snake_case() {
        let json = serde_json::to_string(&HazardClass::NonHazardous).unwrap();
        assert_eq!(json, "\"non_hazardous\"");
        let parsed: HazardClass = serde_json::from_str("\"hazardous\"").unwrap();
        assert_eq!(parsed, HazardClass::Hazardous);
    }

    #[test]
    fn test_legacy_aliases_parse() {
        assert_eq!("quimico".parse::<CargoKind>().unwrap(), CargoKind::Chemical);
        assert_eq!(
            "palete".parse::<ParentLabelKind>().unwrap(),
            ParentLabelKind::Pallet
        );
        assert_eq!(
            "nao_classificada".parse::<HazardClass>().unwrap(),
            HazardClass::Unclassified
        );
        let kind: CargoKind = serde_json::from_str("\"geral\"").unwrap();
        assert_eq!(kind, CargoKind::General);
    }

    #[test]
    fn test_unknown_variant_message() {
        let err = "bogus".parse::<CargoKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown cargo kind: bogus");
    }

    #[test]
    fn test_only_hazardous_carries_codes() {
        assert!(HazardClass::Hazardous.carries_codes());
        assert!(!HazardClass::NonHazardous.carries_codes());
        assert!(!HazardClass::Unclassified.carries_codes());
    }

    #[test]
    fn test_volume_deserializes_with_defaults() {
        let json = serde_json::json!({
            "id": "NF123-001-01012025-1000",
            "invoice_number": "123",
            "sequence_number": 1,
            "total_volumes_in_batch": 2,
            "description": "Volume 1/2",
            "generated_at": "2025-01-01T13:00:00Z"
        });
        let volume: Volume = serde_json::from_value(json).unwrap();
        assert_eq!(volume.quantity, 1);
        assert_eq!(volume.hazard_class, HazardClass::Unclassified);
        assert!(!volume.printed);
        assert!(!volume.is_linked());
    }

    #[test]
    fn test_parent_label_standalone() {
        let label = ParentLabel::new("EM-1", ParentLabelKind::General, "Mix", "");
        assert!(label.is_standalone());
        assert!(!label.printed);
    }
}
