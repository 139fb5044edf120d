//! Print payload types
//!
//! Everything the engine hands to the external renderer. The renderer owns
//! layout, fonts and barcode symbology; these records only carry resolved data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ParentLabel, ParentLabelKind, Volume};

/// Paper size + layout variant selected by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    /// Opaque to the engine, passed through (e.g. `"50x100"`, `"A4"`)
    pub paper_format: String,
    /// Layout token; may name a partner (e.g. `"transul_enhanced"`)
    pub layout_style: String,
}

impl FormatSpec {
    pub fn new(paper_format: impl Into<String>, layout_style: impl Into<String>) -> Self {
        Self {
            paper_format: paper_format.into(),
            layout_style: layout_style.into(),
        }
    }
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self::new("50x100", "enhanced")
    }
}

/// What a print job renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    Volume,
    ParentLabel,
}

/// Resolved party/address/weight data printed on every label of a job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintHeader {
    pub origin: String,
    pub destination: String,
    pub address: String,
    pub city: String,
    pub state: String,
    /// `"{city} - {state}"`, empty when there is nothing to show
    pub city_full: String,
    pub gross_weight: String,
    pub invoice_key: String,
    pub carrier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_kind: Option<ParentLabelKind>,
}

/// Opaque payload for the external renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintJob {
    pub job_id: Uuid,
    pub kind: LabelKind,
    pub format: FormatSpec,
    pub header: PrintHeader,
    /// Volumes to render, already stamped with the resolved carrier
    pub volumes: Vec<Volume>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_label_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PrintJob {
    pub fn new(
        kind: LabelKind,
        format: FormatSpec,
        header: PrintHeader,
        volumes: Vec<Volume>,
        parent_label_id: Option<String>,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            kind,
            format,
            header,
            volumes,
            parent_label_id,
            created_at: Utc::now(),
        }
    }

    pub fn label_count(&self) -> usize {
        self.volumes.len()
    }
}

/// A print request parked until the operator confirms it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPrint {
    pub volume: Volume,
    pub invoice_number: String,
    pub existing_volumes_count: usize,
}

/// Result of a print: the job plus the caller's full, updated collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintOutcome {
    pub job: PrintJob,
    pub volumes: Vec<Volume>,
}

/// Outcome of a fresh print request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PrintValidationResult {
    /// Printed volumes from another batch already exist for the invoice
    NeedsConfirmation {
        pending: PendingPrint,
        existing_volumes_count: usize,
    },
    Printed(PrintOutcome),
}

impl PrintValidationResult {
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Self::NeedsConfirmation { .. })
    }

    pub fn existing_volumes_count(&self) -> usize {
        match self {
            Self::NeedsConfirmation {
                existing_volumes_count,
                ..
            } => *existing_volumes_count,
            Self::Printed(_) => 0,
        }
    }

    pub fn outcome(&self) -> Option<&PrintOutcome> {
        match self {
            Self::Printed(outcome) => Some(outcome),
            Self::NeedsConfirmation { .. } => None,
        }
    }

    pub fn into_outcome(self) -> Option<PrintOutcome> {
        match self {
            Self::Printed(outcome) => Some(outcome),
            Self::NeedsConfirmation { .. } => None,
        }
    }
}

/// Result of printing a parent label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentPrint {
    pub job: PrintJob,
    pub label: ParentLabel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format() {
        let format = FormatSpec::default();
        assert_eq!(format.paper_format, "50x100");
        assert_eq!(format.layout_style, "enhanced");
    }

    #[test]
    fn test_validation_result_is_tagged() {
        let json = serde_json::json!({
            "status": "needs_confirmation",
            "pending": {
                "volume": {
                    "id": "NF1-001-01012025-1000",
                    "invoice_number": "1",
                    "sequence_number": 1,
                    "total_volumes_in_batch": 1,
                    "description": "Volume 1/1",
                    "generated_at": "2025-01-01T13:00:00Z"
                },
                "invoice_number": "1",
                "existing_volumes_count": 3
            },
            "existing_volumes_count": 3
        });
        let result: PrintValidationResult = serde_json::from_value(json).unwrap();
        assert!(result.needs_confirmation());
        assert_eq!(result.existing_volumes_count(), 3);
        assert!(result.outcome().is_none());
    }
}
