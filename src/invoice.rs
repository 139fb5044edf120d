//! Invoice adapter and field resolution
//!
//! Invoice data arrives from the document store as a loosely shaped JSON
//! record: the same logical attribute shows up under several key spellings
//! depending on which importer produced it. `InvoiceData` keeps one optional
//! field per observed spelling; each logical [`Field`] has an ordered chain of
//! accessors over it, and the first non-blank value wins.
//!
//! Precedence for printable data is always:
//! volume value -> invoice chain -> literal fallback.

use serde::{Deserialize, Deserializer, Serialize};
use wms_labels_types::Volume;

use crate::config::Fallbacks;

/// Typed view of a heterogeneous invoice record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvoiceData {
    #[serde(deserialize_with = "lenient_string")]
    pub numero_nota: Option<String>,
    #[serde(rename = "notaFiscal", deserialize_with = "lenient_string")]
    pub nota_fiscal: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub numero: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub remetente: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub emitente_razao_social: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub fornecedor: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub destinatario: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub destinatario_razao_social: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub endereco: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub destinatario_endereco: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub cidade: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub destinatario_cidade: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub uf: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub destinatario_uf: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub transportadora: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub transportadora_razao_social: Option<String>,

    #[serde(rename = "chaveNF", deserialize_with = "lenient_string")]
    pub chave_nf: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub chave_nota_fiscal: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub chave_acesso: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub peso_bruto: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub peso_total_bruto: Option<String>,
    #[serde(rename = "pesoTotal", deserialize_with = "lenient_string")]
    pub peso_total: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub quantidade_volumes: Option<String>,

    #[serde(deserialize_with = "lenient_string")]
    pub numero_pedido: Option<String>,
    #[serde(rename = "numeroPedido", deserialize_with = "lenient_string")]
    pub numero_pedido_alt: Option<String>,
}

/// Accept strings, numbers and booleans; anything else (including null) is absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Logical invoice attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    InvoiceNumber,
    Origin,
    Destination,
    Address,
    City,
    State,
    Carrier,
    InvoiceKey,
    GrossWeight,
    VolumeCount,
    OrderNumber,
}

type Accessor = fn(&InvoiceData) -> Option<&str>;

static INVOICE_NUMBER_CHAIN: [Accessor; 3] = [
    |i| i.numero_nota.as_deref(),
    |i| i.nota_fiscal.as_deref(),
    |i| i.numero.as_deref(),
];
static ORIGIN_CHAIN: [Accessor; 3] = [
    |i| i.remetente.as_deref(),
    |i| i.emitente_razao_social.as_deref(),
    |i| i.fornecedor.as_deref(),
];
static DESTINATION_CHAIN: [Accessor; 2] = [
    |i| i.destinatario.as_deref(),
    |i| i.destinatario_razao_social.as_deref(),
];
static ADDRESS_CHAIN: [Accessor; 2] = [
    |i| i.endereco.as_deref(),
    |i| i.destinatario_endereco.as_deref(),
];
static CITY_CHAIN: [Accessor; 2] = [
    |i| i.cidade.as_deref(),
    |i| i.destinatario_cidade.as_deref(),
];
static STATE_CHAIN: [Accessor; 2] = [|i| i.uf.as_deref(), |i| i.destinatario_uf.as_deref()];
static CARRIER_CHAIN: [Accessor; 2] = [
    |i| i.transportadora.as_deref(),
    |i| i.transportadora_razao_social.as_deref(),
];
static INVOICE_KEY_CHAIN: [Accessor; 3] = [
    |i| i.chave_nf.as_deref(),
    |i| i.chave_nota_fiscal.as_deref(),
    |i| i.chave_acesso.as_deref(),
];
static GROSS_WEIGHT_CHAIN: [Accessor; 3] = [
    |i| i.peso_bruto.as_deref(),
    |i| i.peso_total_bruto.as_deref(),
    |i| i.peso_total.as_deref(),
];
static VOLUME_COUNT_CHAIN: [Accessor; 1] = [|i| i.quantidade_volumes.as_deref()];
static ORDER_NUMBER_CHAIN: [Accessor; 2] = [
    |i| i.numero_pedido.as_deref(),
    |i| i.numero_pedido_alt.as_deref(),
];

impl Field {
    /// Accessors in priority order
    pub fn chain(&self) -> &'static [Accessor] {
        match self {
            Self::InvoiceNumber => &INVOICE_NUMBER_CHAIN,
            Self::Origin => &ORIGIN_CHAIN,
            Self::Destination => &DESTINATION_CHAIN,
            Self::Address => &ADDRESS_CHAIN,
            Self::City => &CITY_CHAIN,
            Self::State => &STATE_CHAIN,
            Self::Carrier => &CARRIER_CHAIN,
            Self::InvoiceKey => &INVOICE_KEY_CHAIN,
            Self::GrossWeight => &GROSS_WEIGHT_CHAIN,
            Self::VolumeCount => &VOLUME_COUNT_CHAIN,
            Self::OrderNumber => &ORDER_NUMBER_CHAIN,
        }
    }

    /// Literal placeholder for this field; empty where none is printed
    pub fn fallback<'a>(&self, fallbacks: &'a Fallbacks) -> &'a str {
        match self {
            Self::Origin => &fallbacks.origin,
            Self::Destination => &fallbacks.destination,
            Self::Address => &fallbacks.address,
            Self::City => &fallbacks.city,
            Self::State => &fallbacks.state,
            Self::Carrier => &fallbacks.carrier,
            Self::GrossWeight => &fallbacks.gross_weight,
            Self::InvoiceNumber | Self::InvoiceKey | Self::VolumeCount | Self::OrderNumber => "",
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl InvoiceData {
    /// Adapter from the raw store record
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// First non-blank value along the field's chain
    pub fn first(&self, field: Field) -> Option<&str> {
        field
            .chain()
            .iter()
            .find_map(|accessor| accessor(self).and_then(non_blank))
    }

    pub fn invoice_number(&self) -> Option<&str> {
        self.first(Field::InvoiceNumber)
    }

    pub fn volume_count(&self) -> Option<u32> {
        self.first(Field::VolumeCount)
            .and_then(|v| v.parse::<u32>().ok())
    }
}

/// Resolve one field: volume value, then invoice chain, then fallback.
///
/// A volume value equal to the field's placeholder counts as blank, so
/// invoice data supplied after generation still wins over it.
pub fn resolve(
    volume_value: &str,
    invoice: Option<&InvoiceData>,
    field: Field,
    fallbacks: &Fallbacks,
) -> String {
    let placeholder = field.fallback(fallbacks);
    non_blank(volume_value)
        .filter(|value| *value != placeholder.trim())
        .or_else(|| invoice.and_then(|i| i.first(field)))
        .unwrap_or(placeholder)
        .to_string()
}

/// Every printable party/address field of a volume, resolved at once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedParties {
    pub origin: String,
    pub destination: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub carrier: String,
    pub invoice_key: String,
    pub gross_weight: String,
    pub order_number: String,
}

impl ResolvedParties {
    pub fn for_volume(
        volume: &Volume,
        invoice: Option<&InvoiceData>,
        fallbacks: &Fallbacks,
    ) -> Self {
        let invoice_key = resolve(&volume.invoice_key, invoice, Field::InvoiceKey, fallbacks);
        Self {
            origin: resolve(&volume.origin, invoice, Field::Origin, fallbacks),
            destination: resolve(&volume.destination, invoice, Field::Destination, fallbacks),
            address: resolve(&volume.address, invoice, Field::Address, fallbacks),
            city: resolve(&volume.city, invoice, Field::City, fallbacks),
            state: resolve(&volume.state, invoice, Field::State, fallbacks),
            carrier: resolve(&volume.carrier, invoice, Field::Carrier, fallbacks),
            invoice_key: if invoice_key.is_empty() {
                volume.invoice_number.clone()
            } else {
                invoice_key
            },
            gross_weight: resolve(&volume.gross_weight, invoice, Field::GrossWeight, fallbacks),
            order_number: resolve(&volume.order_number, invoice, Field::OrderNumber, fallbacks),
        }
    }

    /// Resolution from invoice data alone (no volume-level values)
    pub fn for_invoice(invoice: Option<&InvoiceData>, fallbacks: &Fallbacks) -> Self {
        let field = |f: Field| resolve("", invoice, f, fallbacks);
        Self {
            origin: field(Field::Origin),
            destination: field(Field::Destination),
            address: field(Field::Address),
            city: field(Field::City),
            state: field(Field::State),
            carrier: field(Field::Carrier),
            invoice_key: field(Field::InvoiceKey),
            gross_weight: field(Field::GrossWeight),
            order_number: field(Field::OrderNumber),
        }
    }

    /// `"{city} - {state}"`
    pub fn city_full(&self) -> String {
        city_full(&self.city, &self.state)
    }
}

/// `"{city} - {state}"`, or whichever part is present
pub fn city_full(city: &str, state: &str) -> String {
    match (non_blank(city), non_blank(state)) {
        (Some(c), Some(s)) => format!("{} - {}", c, s),
        (Some(c), None) => c.to_string(),
        (None, Some(s)) => s.to_string(),
        (None, None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_adapter_accepts_numbers_and_nulls() {
        let invoice = InvoiceData::from_json(json!({
            "numero_nota": 417536,
            "quantidade_volumes": "3",
            "destinatario_cidade": null,
            "unrelated": {"nested": true}
        }))
        .unwrap();
        assert_eq!(invoice.invoice_number(), Some("417536"));
        assert_eq!(invoice.volume_count(), Some(3));
        assert_eq!(invoice.first(Field::City), None);
    }

    #[test]
    fn test_chain_skips_blank_values() {
        let invoice = InvoiceData::from_json(json!({
            "remetente": "   ",
            "emitente_razao_social": "ACME QUIMICA LTDA"
        }))
        .unwrap();
        assert_eq!(invoice.first(Field::Origin), Some("ACME QUIMICA LTDA"));
    }

    #[test]
    fn test_chain_respects_priority() {
        let invoice = InvoiceData::from_json(json!({
            "chave_acesso": "third",
            "chaveNF": "first",
            "chave_nota_fiscal": "second"
        }))
        .unwrap();
        assert_eq!(invoice.first(Field::InvoiceKey), Some("first"));
    }

    #[test]
    fn test_resolve_city_from_invoice() {
        let invoice = InvoiceData::from_json(json!({"destinatario_cidade": "Santos"})).unwrap();
        let fallbacks = Fallbacks::default();
        assert_eq!(resolve("", Some(&invoice), Field::City, &fallbacks), "Santos");
        assert_eq!(resolve("", None, Field::City, &fallbacks), "CIDADE");
        assert_eq!(
            resolve("Guarulhos", Some(&invoice), Field::City, &fallbacks),
            "Guarulhos"
        );
    }

    #[test]
    fn test_placeholder_yields_to_later_invoice_data() {
        let invoice = InvoiceData::from_json(json!({"uf": "SP", "remetente": "ACME"})).unwrap();
        let fallbacks = Fallbacks::default();
        assert_eq!(resolve("UF", Some(&invoice), Field::State, &fallbacks), "SP");
        assert_eq!(resolve("REMETENTE", Some(&invoice), Field::Origin, &fallbacks), "ACME");
        assert_eq!(resolve("CIDADE", Some(&invoice), Field::City, &fallbacks), "CIDADE");
    }

    #[test]
    fn test_city_full() {
        assert_eq!(city_full("Santos", "SP"), "Santos - SP");
        assert_eq!(city_full("Santos", ""), "Santos");
        assert_eq!(city_full("", ""), "");
    }

    #[test]
    fn test_for_invoice_uses_placeholders() {
        let resolved = ResolvedParties::for_invoice(None, &Fallbacks::default());
        assert_eq!(resolved.origin, "REMETENTE");
        assert_eq!(resolved.destination, "DESTINATÁRIO");
        assert_eq!(resolved.state, "UF");
        assert_eq!(resolved.invoice_key, "");
    }
}
