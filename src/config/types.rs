//! Engine configuration types
//!
//! Every field is defaulted so an empty (or missing) YAML file yields a
//! working configuration.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use wms_labels_types::FormatSpec;

use crate::hazmat::HazmatEntry;

/// UTC-03:00. `America/Sao_Paulo` has had no DST since 2019, so the
/// identifier clock uses it as a fixed offset.
pub const DEFAULT_TIMEZONE_OFFSET_MINUTES: i32 = -180;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Civil-time offset used for the date/time part of volume ids
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset_minutes: i32,

    #[serde(default)]
    pub id_suffix: IdSuffix,

    #[serde(default)]
    pub fallbacks: Fallbacks,

    #[serde(default = "default_weight_unit")]
    pub weight_unit: String,

    /// Layout tokens that force a fixed carrier name
    #[serde(default = "default_partner_layouts")]
    pub partner_layouts: Vec<PartnerLayout>,

    #[serde(default)]
    pub default_format: FormatSpec,

    /// Replaces the built-in dangerous goods table when present
    #[serde(default)]
    pub hazmat_catalog: Option<Vec<HazmatEntry>>,
}

fn default_timezone_offset() -> i32 {
    DEFAULT_TIMEZONE_OFFSET_MINUTES
}

fn default_weight_unit() -> String {
    "Kg".to_string()
}

fn default_partner_layouts() -> Vec<PartnerLayout> {
    vec![PartnerLayout {
        token: "transul".to_string(),
        carrier: "Transul Transporte".to_string(),
    }]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone_offset_minutes: default_timezone_offset(),
            id_suffix: IdSuffix::default(),
            fallbacks: Fallbacks::default(),
            weight_unit: default_weight_unit(),
            partner_layouts: default_partner_layouts(),
            default_format: FormatSpec::default(),
            hazmat_catalog: None,
        }
    }
}

impl EngineConfig {
    /// Fixed civil zone for identifiers; falls back to UTC if the offset is out of range
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Carrier forced by a partner layout, matched case-insensitively as a substring
    pub fn forced_carrier(&self, layout_style: &str) -> Option<&str> {
        let layout = layout_style.to_lowercase();
        self.partner_layouts
            .iter()
            .find(|p| !p.token.is_empty() && layout.contains(&p.token.to_lowercase()))
            .map(|p| p.carrier.as_str())
    }
}

/// Collision-avoidance strategy for volume ids generated in the same minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSuffix {
    /// Exact `NF{invoice}-{seq:3}-{ddMMyyyy}-{HHmm}` format
    #[default]
    None,
    /// Appends `-{counter:04}` from the generator's batch counter
    BatchCounter,
}

/// A layout variant designed for a specific carrier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerLayout {
    pub token: String,
    pub carrier: String,
}

/// Literal placeholders used when neither volume nor invoice has a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fallbacks {
    pub origin: String,
    pub destination: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub carrier: String,
    pub gross_weight: String,
    pub parent_description: String,
}

impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            origin: "REMETENTE".to_string(),
            destination: "DESTINATÁRIO".to_string(),
            address: "ENDEREÇO".to_string(),
            city: "CIDADE".to_string(),
            state: "UF".to_string(),
            carrier: "Transportadora não especificada".to_string(),
            gross_weight: "0 Kg".to_string(),
            parent_description: "Etiqueta Mãe".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.timezone().local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn test_forced_carrier_matches_token_substring() {
        let config = EngineConfig::default();
        assert_eq!(
            config.forced_carrier("transul_enhanced"),
            Some("Transul Transporte")
        );
        assert_eq!(config.forced_carrier("TRANSUL"), Some("Transul Transporte"));
        assert_eq!(config.forced_carrier("enhanced"), None);
    }

    #[test]
    fn test_partial_fallbacks_keep_other_defaults() {
        let yaml = "fallbacks:\n  city: SEM CIDADE\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.fallbacks.city, "SEM CIDADE");
        assert_eq!(config.fallbacks.origin, "REMETENTE");
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let config = EngineConfig {
            timezone_offset_minutes: 100_000,
            ..EngineConfig::default()
        };
        assert_eq!(config.timezone().local_minus_utc(), 0);
    }
}
