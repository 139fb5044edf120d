//! Dangerous goods catalog
//!
//! UN-number lookup used to complete hazard profiles typed by the operator.
//! The built-in table is a small subset of the ANTT listing; deployments
//! replace it through `hazmat_catalog` in the engine config.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use wms_labels_types::HazardClass;

use crate::classification::HazardProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazmatEntry {
    pub un_number: String,
    pub product: String,
    pub risk_class: String,
    /// Hazard identification number printed on the label; empty for some classes
    #[serde(default)]
    pub risk_number: String,
    #[serde(default)]
    pub packing_group: String,
}

impl HazmatEntry {
    fn new(un: &str, product: &str, class: &str, risk: &str, group: &str) -> Self {
        Self {
            un_number: un.to_string(),
            product: product.to_string(),
            risk_class: class.to_string(),
            risk_number: risk.to_string(),
            packing_group: group.to_string(),
        }
    }
}

fn builtin_entries() -> Vec<HazmatEntry> {
    vec![
        HazmatEntry::new("1001", "ACETILENO, DISSOLVIDO", "2.1", "", ""),
        HazmatEntry::new("1088", "ACETAL", "3", "33", "II"),
        HazmatEntry::new("1090", "ACETONA", "3", "33", "II"),
        HazmatEntry::new("1173", "ACETATO DE ETILA", "3", "33", "II"),
        HazmatEntry::new("1203", "GASOLINA", "3", "33", "II"),
        HazmatEntry::new("1230", "METANOL", "3", "336", "II"),
        HazmatEntry::new("1263", "TINTA", "3", "30", "II"),
        HazmatEntry::new("1301", "ACETATO DE VINILA, INIBIDO", "3", "339", "II"),
        HazmatEntry::new("1789", "ÁCIDO CLORÍDRICO, SOLUÇÃO", "8", "80", ""),
        HazmatEntry::new("1790", "ÁCIDO FLUORÍDRICO, SOLUÇÃO", "8", "886", ""),
        HazmatEntry::new("1824", "SOLUÇÃO DE HIDRÓXIDO DE SÓDIO", "8", "80", "II"),
        HazmatEntry::new("1830", "ÁCIDO SULFÚRICO", "8", "80", "II"),
        HazmatEntry::new("1993", "LÍQUIDO INFLAMÁVEL, N.E.", "3", "30", "III"),
        HazmatEntry::new("2031", "ÁCIDO NÍTRICO", "8", "856", "II"),
        HazmatEntry::new("2218", "ÁCIDO ACRÍLICO, INIBIDO", "8", "89", "II"),
        HazmatEntry::new(
            "3082",
            "SUBSTÂNCIA PERIGOSA AO MEIO AMBIENTE, LÍQUIDA, N.E.",
            "9",
            "90",
            "III",
        ),
        HazmatEntry::new("3480", "BATERIAS DE ÍON LÍTIO", "9", "", "II"),
    ]
}

/// Lookup table keyed by UN number
#[derive(Debug, Clone)]
pub struct HazmatCatalog {
    entries: HashMap<String, HazmatEntry>,
}

impl HazmatCatalog {
    pub fn builtin() -> Self {
        Self::from_entries(builtin_entries())
    }

    pub fn from_entries(entries: impl IntoIterator<Item = HazmatEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| (normalize_un(&e.un_number), e))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accepts `"1090"`, `"UN1090"` or `"UN 1090"`
    pub fn lookup(&self, un_number: &str) -> Option<&HazmatEntry> {
        self.entries.get(&normalize_un(un_number))
    }

    /// Fill an empty risk code from the catalog. Non-hazardous profiles and
    /// profiles that already carry a risk code are returned unchanged.
    pub fn complete(&self, profile: HazardProfile) -> HazardProfile {
        if profile.class != HazardClass::Hazardous || !profile.risk_code.is_empty() {
            return profile;
        }
        match self.lookup(&profile.un_number) {
            Some(entry) if !entry.risk_number.is_empty() => HazardProfile {
                risk_code: entry.risk_number.clone(),
                ..profile
            },
            _ => profile,
        }
    }
}

impl Default for HazmatCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize_un(un_number: &str) -> String {
    let trimmed = un_number.trim();
    let digits = trimmed
        .strip_prefix("UN")
        .or_else(|| trimmed.strip_prefix("un"))
        .unwrap_or(trimmed);
    digits.trim().to_string()
}
