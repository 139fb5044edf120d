//! Label Engine
//!
//! Facade bundling configuration, the identifier generator and the hazmat
//! catalog. Every operation is collection-in, collection-out: the engine
//! never keeps volumes of its own.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use wms_labels_types::{
    FormatSpec, ParentLabel, ParentLabelKind, ParentPrint, PendingPrint, PrintOutcome,
    PrintValidationResult, Volume,
};

use crate::classification::{self, HazardProfile};
use crate::config::{ConfigLoader, EngineConfig};
use crate::error::EngineResult;
use crate::factory::{self, GenerateRequest};
use crate::hazmat::HazmatCatalog;
use crate::identifier::{self, IdentifierGenerator};
use crate::invoice::{InvoiceData, ResolvedParties};
use crate::linkage;
use crate::print;
use crate::weight;

/// The label engine
#[derive(Debug, Clone)]
pub struct LabelEngine {
    config: EngineConfig,
    generator: IdentifierGenerator,
    catalog: HazmatCatalog,
}

impl LabelEngine {
    pub fn new(config: EngineConfig) -> Self {
        let catalog = match &config.hazmat_catalog {
            Some(entries) => HazmatCatalog::from_entries(entries.clone()),
            None => HazmatCatalog::builtin(),
        };
        Self {
            generator: IdentifierGenerator::new(&config),
            catalog,
            config,
        }
    }

    /// Build from `label_engine.yaml` in the loader's directory
    pub fn from_loader(loader: &ConfigLoader) -> Result<Self> {
        Ok(Self::new(loader.load()?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &HazmatCatalog {
        &self.catalog
    }

    pub fn generator(&self) -> &IdentifierGenerator {
        &self.generator
    }

    pub fn default_format(&self) -> &FormatSpec {
        &self.config.default_format
    }

    // ------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------

    pub fn generate_volumes(
        &mut self,
        request: &GenerateRequest,
        invoice: Option<&InvoiceData>,
    ) -> EngineResult<Vec<Volume>> {
        factory::generate_volumes(&mut self.generator, request, invoice, &self.config)
    }

    pub fn generate_volumes_at(
        &mut self,
        request: &GenerateRequest,
        invoice: Option<&InvoiceData>,
        instant: DateTime<Utc>,
    ) -> EngineResult<Vec<Volume>> {
        factory::generate_volumes_at(&mut self.generator, request, invoice, &self.config, instant)
    }

    /// Generate a batch that joins `existing`; colliding ids are re-stamped
    pub fn generate_batch(
        &mut self,
        request: &GenerateRequest,
        invoice: Option<&InvoiceData>,
        existing: &[Volume],
    ) -> EngineResult<Vec<Volume>> {
        let batch = self.generate_volumes(request, invoice)?;
        Ok(identifier::disambiguate_ids(batch, existing))
    }

    /// Keep stored ids when a batch is regenerated for the same invoice
    pub fn reconcile_ids(
        &self,
        invoice_number: &str,
        fresh: Vec<Volume>,
        existing: &[Volume],
    ) -> Vec<Volume> {
        self.generator.reconcile_ids(invoice_number, fresh, existing)
    }

    // ------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------

    pub fn classify_volume(
        &self,
        volume: &Volume,
        area: &str,
        hazard: Option<HazardProfile>,
    ) -> Volume {
        classification::classify_volume(volume, area, hazard)
    }

    /// Fill a missing risk code from the hazmat catalog
    pub fn complete_hazard(&self, profile: HazardProfile) -> HazardProfile {
        self.catalog.complete(profile)
    }

    // ------------------------------------------------------------------
    // Linkage
    // ------------------------------------------------------------------

    pub fn link_volumes(
        &self,
        parent_label_id: &str,
        volume_ids: &HashSet<String>,
        volumes: &[Volume],
    ) -> Vec<Volume> {
        linkage::link_volumes(parent_label_id, volume_ids, volumes)
    }

    pub fn unlink_volumes(&self, volume_ids: &HashSet<String>, volumes: &[Volume]) -> Vec<Volume> {
        linkage::unlink_volumes(volume_ids, volumes)
    }

    pub fn create_parent_label(
        &self,
        id: Option<&str>,
        description: &str,
        kind: ParentLabelKind,
        invoice_number: &str,
    ) -> EngineResult<ParentLabel> {
        linkage::create_parent_label(
            &self.generator,
            id,
            description,
            kind,
            invoice_number,
            &self.config.fallbacks,
        )
    }

    /// Aggregated weight of a parent label's linked volumes
    pub fn parent_weight(&self, parent_label_id: &str, volumes: &[Volume]) -> String {
        weight::total_weight(
            &linkage::linked_volumes(parent_label_id, volumes),
            &self.config.weight_unit,
        )
    }

    pub fn total_weight(&self, volumes: &[Volume]) -> String {
        weight::total_weight(volumes, &self.config.weight_unit)
    }

    pub fn resolve_parties(
        &self,
        volume: &Volume,
        invoice: Option<&InvoiceData>,
    ) -> ResolvedParties {
        ResolvedParties::for_volume(volume, invoice, &self.config.fallbacks)
    }

    // ------------------------------------------------------------------
    // Printing
    // ------------------------------------------------------------------

    pub fn request_print(
        &self,
        volume: &Volume,
        volumes: &[Volume],
        invoice: Option<&InvoiceData>,
        format: &FormatSpec,
    ) -> PrintValidationResult {
        print::request_print(volume, volumes, invoice, format, &self.config)
    }

    pub fn confirm_print(
        &self,
        pending: &PendingPrint,
        volumes: &[Volume],
        invoice: Option<&InvoiceData>,
        format: &FormatSpec,
    ) -> PrintOutcome {
        print::confirm_print(pending, volumes, invoice, format, &self.config)
    }

    pub fn execute_print(
        &self,
        volume: &Volume,
        volumes: &[Volume],
        invoice: Option<&InvoiceData>,
        format: &FormatSpec,
    ) -> PrintOutcome {
        print::execute_print(volume, volumes, invoice, format, &self.config)
    }

    pub fn reprint_single(
        &self,
        volume_id: &str,
        volumes: &[Volume],
        invoice: Option<&InvoiceData>,
        format: &FormatSpec,
    ) -> EngineResult<PrintOutcome> {
        print::reprint_single(volume_id, volumes, invoice, format, &self.config)
    }

    pub fn print_parent_label(
        &self,
        label: &ParentLabel,
        volumes: &[Volume],
        format: &FormatSpec,
    ) -> ParentPrint {
        print::print_parent_label(label, volumes, format, &self.config)
    }

    pub fn create_and_print_parent_label(
        &self,
        id: Option<&str>,
        description: &str,
        kind: ParentLabelKind,
        format: &FormatSpec,
    ) -> EngineResult<ParentPrint> {
        print::create_and_print_parent_label(
            &self.generator,
            id,
            description,
            kind,
            format,
            &self.config,
        )
    }
}

impl Default for LabelEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
