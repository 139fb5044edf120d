//! Receiving session
//!
//! `LabelSession` is the caller-owned arena: it holds the authoritative
//! volume and parent label collections and replaces them with each engine
//! result before the next operation runs.
//!
//! Concurrent callers must not share a session directly. `spawn_session`
//! moves it into a single owning task and hands out a cloneable
//! `SessionHandle`; commands are applied strictly in arrival order.

use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wms_labels_types::{
    FormatSpec, LabelRecord, ParentLabel, ParentLabelKind, ParentPrint, PendingPrint,
    PrintOutcome, PrintValidationResult, Volume,
};

use crate::classification::HazardProfile;
use crate::engine::LabelEngine;
use crate::error::{EngineError, EngineResult};
use crate::factory::GenerateRequest;
use crate::identifier::{self, stored_batch};
use crate::invoice::InvoiceData;
use crate::linkage::{linked_count, replace_volume, same_invoice_candidates};

/// Command channel capacity
const DEFAULT_BUFFER_SIZE: usize = 64;

pub struct LabelSession {
    engine: LabelEngine,
    format: FormatSpec,
    volumes: Vec<Volume>,
    parent_labels: Vec<ParentLabel>,
    invoices: HashMap<String, InvoiceData>,
    pending: Option<PendingPrint>,
}

impl LabelSession {
    pub fn new(engine: LabelEngine) -> Self {
        let format = engine.default_format().clone();
        Self {
            engine,
            format,
            volumes: Vec::new(),
            parent_labels: Vec::new(),
            invoices: HashMap::new(),
            pending: None,
        }
    }

    /// Start from collections loaded by the persistence collaborator
    pub fn with_state(
        engine: LabelEngine,
        volumes: Vec<Volume>,
        parent_labels: Vec<ParentLabel>,
    ) -> Self {
        Self {
            volumes,
            parent_labels,
            ..Self::new(engine)
        }
    }

    pub fn engine(&self) -> &LabelEngine {
        &self.engine
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    pub fn parent_labels(&self) -> &[ParentLabel] {
        &self.parent_labels
    }

    pub fn format(&self) -> &FormatSpec {
        &self.format
    }

    pub fn set_format(&mut self, format: FormatSpec) {
        self.format = format;
    }

    pub fn pending(&self) -> Option<&PendingPrint> {
        self.pending.as_ref()
    }

    pub fn set_invoice(&mut self, invoice_number: impl Into<String>, invoice: InvoiceData) {
        self.invoices.insert(invoice_number.into(), invoice);
    }

    pub fn invoice(&self, invoice_number: &str) -> Option<&InvoiceData> {
        self.invoices.get(invoice_number)
    }

    pub fn volume(&self, volume_id: &str) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.id == volume_id)
    }

    pub fn parent_label(&self, parent_label_id: &str) -> Option<&ParentLabel> {
        self.parent_labels.iter().find(|p| p.id == parent_label_id)
    }

    fn require_volume(&self, volume_id: &str) -> EngineResult<Volume> {
        self.volume(volume_id)
            .cloned()
            .ok_or_else(|| EngineError::VolumeNotFound(volume_id.to_string()))
    }

    fn require_parent(&self, parent_label_id: &str) -> EngineResult<ParentLabel> {
        self.parent_label(parent_label_id)
            .cloned()
            .ok_or_else(|| EngineError::ParentLabelNotFound(parent_label_id.to_string()))
    }

    fn insert_parent(&mut self, label: ParentLabel) -> EngineResult<()> {
        if self.parent_label(&label.id).is_some() {
            warn!(parent_label_id = %label.id, "Parent label id already in session");
            return Err(EngineError::DuplicateParentLabel(label.id));
        }
        self.parent_labels.push(label);
        Ok(())
    }

    fn upsert_parent(&mut self, label: ParentLabel) {
        match self.parent_labels.iter_mut().find(|p| p.id == label.id) {
            Some(existing) => *existing = label,
            None => self.parent_labels.push(label),
        }
    }

    /// Generate a new batch and append it. Sequence numbers of the new batch
    /// start at 1 independently of earlier batches; ids already stored are
    /// never reused.
    pub fn generate(&mut self, request: &GenerateRequest) -> EngineResult<Vec<Volume>> {
        let invoice = self.invoices.get(request.invoice_number.trim());
        let batch = self
            .engine
            .generate_batch(request, invoice, &self.volumes)?;
        self.volumes.extend(batch.iter().cloned());
        Ok(batch)
    }

    /// Regenerate the invoice's volumes position by position.
    ///
    /// Matched stored volumes are replaced in place by their reconciled
    /// counterpart; stored volumes beyond the new count stay as they are.
    /// Returns every volume of the invoice afterwards.
    pub fn regenerate(&mut self, request: &GenerateRequest) -> EngineResult<Vec<Volume>> {
        let invoice_number = request.invoice_number.trim().to_string();
        let invoice = self.invoices.get(&invoice_number);
        let fresh = self.engine.generate_volumes(request, invoice)?;
        let stored_ids: Vec<String> = stored_batch(&invoice_number, &self.volumes)
            .into_iter()
            .map(|v| v.id.clone())
            .collect();
        let reconciled = self
            .engine
            .reconcile_ids(&invoice_number, fresh, &self.volumes);

        let mut replacements: HashMap<String, Volume> = stored_ids
            .iter()
            .cloned()
            .zip(reconciled.iter().cloned())
            .collect();
        self.volumes = self
            .volumes
            .iter()
            .map(|v| replacements.remove(&v.id).unwrap_or_else(|| v.clone()))
            .collect();
        let appended = reconciled.iter().skip(stored_ids.len()).cloned();
        let appended = identifier::disambiguate_ids(appended.collect(), &self.volumes);
        self.volumes.extend(appended);

        info!(
            invoice = %invoice_number,
            count = reconciled.len(),
            kept = stored_ids.len().saturating_sub(reconciled.len()),
            "Regenerated volumes"
        );
        Ok(self
            .volumes
            .iter()
            .filter(|v| v.belongs_to_invoice(&invoice_number))
            .cloned()
            .collect())
    }

    pub fn classify(
        &mut self,
        volume_id: &str,
        area: &str,
        hazard: Option<HazardProfile>,
    ) -> EngineResult<Volume> {
        let volume = self.require_volume(volume_id)?;
        let updated = self.engine.classify_volume(&volume, area, hazard);
        self.volumes = replace_volume(&self.volumes, &updated);
        Ok(updated)
    }

    pub fn create_parent_label(
        &mut self,
        id: Option<&str>,
        description: &str,
        kind: ParentLabelKind,
        invoice_number: &str,
    ) -> EngineResult<ParentLabel> {
        let label = self
            .engine
            .create_parent_label(id, description, kind, invoice_number)?;
        self.insert_parent(label.clone())?;
        Ok(label)
    }

    /// Link volumes to a known parent label; returns the parent's linked count
    pub fn link(
        &mut self,
        parent_label_id: &str,
        volume_ids: &HashSet<String>,
    ) -> EngineResult<usize> {
        self.require_parent(parent_label_id)?;
        self.volumes = self
            .engine
            .link_volumes(parent_label_id, volume_ids, &self.volumes);
        Ok(linked_count(parent_label_id, &self.volumes))
    }

    pub fn unlink(&mut self, volume_ids: &HashSet<String>) {
        self.volumes = self.engine.unlink_volumes(volume_ids, &self.volumes);
    }

    /// Ids an operator may attach to the parent label
    pub fn candidates(&self, parent_label_id: &str) -> EngineResult<Vec<String>> {
        let parent = self.require_parent(parent_label_id)?;
        Ok(same_invoice_candidates(&parent, &self.volumes)
            .into_iter()
            .map(|v| v.id.clone())
            .collect())
    }

    pub fn parent_weight(&self, parent_label_id: &str) -> EngineResult<String> {
        self.require_parent(parent_label_id)?;
        Ok(self.engine.parent_weight(parent_label_id, &self.volumes))
    }

    /// Fresh print request. A request needing confirmation is parked until
    /// [`Self::confirm_print`] or [`Self::cancel_print`].
    pub fn request_print(&mut self, volume_id: &str) -> EngineResult<PrintValidationResult> {
        let volume = self.require_volume(volume_id)?;
        let invoice = self.invoices.get(&volume.invoice_number);
        let result = self
            .engine
            .request_print(&volume, &self.volumes, invoice, &self.format);

        match &result {
            PrintValidationResult::NeedsConfirmation { pending, .. } => {
                self.pending = Some(pending.clone());
            }
            PrintValidationResult::Printed(outcome) => {
                self.volumes = outcome.volumes.clone();
                self.pending = None;
            }
        }
        Ok(result)
    }

    pub fn confirm_print(&mut self) -> EngineResult<PrintOutcome> {
        let pending = self.pending.take().ok_or(EngineError::NoPendingPrint)?;
        let invoice = self.invoices.get(&pending.invoice_number);
        let outcome = self
            .engine
            .confirm_print(&pending, &self.volumes, invoice, &self.format);
        self.volumes = outcome.volumes.clone();
        Ok(outcome)
    }

    /// Drop a parked request; returns whether one was parked
    pub fn cancel_print(&mut self) -> bool {
        let cancelled = self.pending.take().is_some();
        if cancelled {
            debug!("pending print cancelled");
        }
        cancelled
    }

    pub fn reprint(&mut self, volume_id: &str) -> EngineResult<PrintOutcome> {
        let invoice = self
            .volume(volume_id)
            .and_then(|v| self.invoices.get(&v.invoice_number));
        let outcome = self
            .engine
            .reprint_single(volume_id, &self.volumes, invoice, &self.format)?;
        self.volumes = outcome.volumes.clone();
        Ok(outcome)
    }

    pub fn print_parent_label(&mut self, parent_label_id: &str) -> EngineResult<ParentPrint> {
        let label = self.require_parent(parent_label_id)?;
        let print = self
            .engine
            .print_parent_label(&label, &self.volumes, &self.format);
        self.upsert_parent(print.label.clone());
        Ok(print)
    }

    pub fn create_and_print_parent_label(
        &mut self,
        id: Option<&str>,
        description: &str,
        kind: ParentLabelKind,
    ) -> EngineResult<ParentPrint> {
        let print = self
            .engine
            .create_and_print_parent_label(id, description, kind, &self.format)?;
        self.insert_parent(print.label.clone())?;
        Ok(print)
    }

    /// Store-facing rows for every volume
    pub fn records(&self) -> Vec<LabelRecord> {
        self.volumes.iter().map(LabelRecord::from_volume).collect()
    }
}

// ============================================================================
// ACTOR
// ============================================================================

type Reply<T> = oneshot::Sender<EngineResult<T>>;

enum SessionCommand {
    SetInvoice {
        invoice_number: String,
        invoice: Box<InvoiceData>,
    },
    SetFormat(FormatSpec),
    Generate {
        request: GenerateRequest,
        reply: Reply<Vec<Volume>>,
    },
    Classify {
        volume_id: String,
        area: String,
        hazard: Option<HazardProfile>,
        reply: Reply<Volume>,
    },
    CreateParent {
        id: Option<String>,
        description: String,
        kind: ParentLabelKind,
        invoice_number: String,
        reply: Reply<ParentLabel>,
    },
    Link {
        parent_label_id: String,
        volume_ids: HashSet<String>,
        reply: Reply<usize>,
    },
    RequestPrint {
        volume_id: String,
        reply: Reply<PrintValidationResult>,
    },
    ConfirmPrint {
        reply: Reply<PrintOutcome>,
    },
    Reprint {
        volume_id: String,
        reply: Reply<PrintOutcome>,
    },
    PrintParent {
        parent_label_id: String,
        reply: Reply<ParentPrint>,
    },
    Snapshot {
        reply: oneshot::Sender<(Vec<Volume>, Vec<ParentLabel>)>,
    },
}

impl LabelSession {
    fn apply(&mut self, command: SessionCommand) {
        // A dropped reply receiver just means the caller stopped waiting.
        match command {
            SessionCommand::SetInvoice {
                invoice_number,
                invoice,
            } => self.set_invoice(invoice_number, *invoice),
            SessionCommand::SetFormat(format) => self.set_format(format),
            SessionCommand::Generate { request, reply } => {
                let _ = reply.send(self.generate(&request));
            }
            SessionCommand::Classify {
                volume_id,
                area,
                hazard,
                reply,
            } => {
                let _ = reply.send(self.classify(&volume_id, &area, hazard));
            }
            SessionCommand::CreateParent {
                id,
                description,
                kind,
                invoice_number,
                reply,
            } => {
                let _ = reply.send(self.create_parent_label(
                    id.as_deref(),
                    &description,
                    kind,
                    &invoice_number,
                ));
            }
            SessionCommand::Link {
                parent_label_id,
                volume_ids,
                reply,
            } => {
                let _ = reply.send(self.link(&parent_label_id, &volume_ids));
            }
            SessionCommand::RequestPrint { volume_id, reply } => {
                let _ = reply.send(self.request_print(&volume_id));
            }
            SessionCommand::ConfirmPrint { reply } => {
                let _ = reply.send(self.confirm_print());
            }
            SessionCommand::Reprint { volume_id, reply } => {
                let _ = reply.send(self.reprint(&volume_id));
            }
            SessionCommand::PrintParent {
                parent_label_id,
                reply,
            } => {
                let _ = reply.send(self.print_parent_label(&parent_label_id));
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send((self.volumes.clone(), self.parent_labels.clone()));
            }
        }
    }
}

/// Cloneable handle to a session owned by a background task
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

/// Move `session` into its own task. The task ends, yielding the session
/// back, once every handle has been dropped.
pub fn spawn_session(session: LabelSession) -> (SessionHandle, JoinHandle<LabelSession>) {
    spawn_session_with_buffer(session, DEFAULT_BUFFER_SIZE)
}

pub fn spawn_session_with_buffer(
    mut session: LabelSession,
    size: usize,
) -> (SessionHandle, JoinHandle<LabelSession>) {
    let (sender, mut receiver) = mpsc::channel(size.max(1));
    let task = tokio::spawn(async move {
        while let Some(command) = receiver.recv().await {
            session.apply(command);
        }
        debug!("session task finished");
        session
    });
    (SessionHandle { sender }, task)
}

impl SessionHandle {
    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> SessionCommand) -> EngineResult<T> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| EngineError::SessionClosed)?;
        response.await.map_err(|_| EngineError::SessionClosed)?
    }

    async fn send(&self, command: SessionCommand) -> EngineResult<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| EngineError::SessionClosed)
    }

    pub async fn set_invoice(
        &self,
        invoice_number: impl Into<String>,
        invoice: InvoiceData,
    ) -> EngineResult<()> {
        self.send(SessionCommand::SetInvoice {
            invoice_number: invoice_number.into(),
            invoice: Box::new(invoice),
        })
        .await
    }

    pub async fn set_format(&self, format: FormatSpec) -> EngineResult<()> {
        self.send(SessionCommand::SetFormat(format)).await
    }

    pub async fn generate(&self, request: GenerateRequest) -> EngineResult<Vec<Volume>> {
        self.call(|reply| SessionCommand::Generate { request, reply })
            .await
    }

    pub async fn classify(
        &self,
        volume_id: impl Into<String>,
        area: impl Into<String>,
        hazard: Option<HazardProfile>,
    ) -> EngineResult<Volume> {
        let (volume_id, area) = (volume_id.into(), area.into());
        self.call(|reply| SessionCommand::Classify {
            volume_id,
            area,
            hazard,
            reply,
        })
        .await
    }

    pub async fn create_parent_label(
        &self,
        id: Option<String>,
        description: impl Into<String>,
        kind: ParentLabelKind,
        invoice_number: impl Into<String>,
    ) -> EngineResult<ParentLabel> {
        let (description, invoice_number) = (description.into(), invoice_number.into());
        self.call(|reply| SessionCommand::CreateParent {
            id,
            description,
            kind,
            invoice_number,
            reply,
        })
        .await
    }

    pub async fn link(
        &self,
        parent_label_id: impl Into<String>,
        volume_ids: HashSet<String>,
    ) -> EngineResult<usize> {
        let parent_label_id = parent_label_id.into();
        self.call(|reply| SessionCommand::Link {
            parent_label_id,
            volume_ids,
            reply,
        })
        .await
    }

    pub async fn request_print(
        &self,
        volume_id: impl Into<String>,
    ) -> EngineResult<PrintValidationResult> {
        let volume_id = volume_id.into();
        self.call(|reply| SessionCommand::RequestPrint { volume_id, reply })
            .await
    }

    pub async fn confirm_print(&self) -> EngineResult<PrintOutcome> {
        self.call(|reply| SessionCommand::ConfirmPrint { reply }).await
    }

    pub async fn reprint(&self, volume_id: impl Into<String>) -> EngineResult<PrintOutcome> {
        let volume_id = volume_id.into();
        self.call(|reply| SessionCommand::Reprint { volume_id, reply })
            .await
    }

    pub async fn print_parent_label(
        &self,
        parent_label_id: impl Into<String>,
    ) -> EngineResult<ParentPrint> {
        let parent_label_id = parent_label_id.into();
        self.call(|reply| SessionCommand::PrintParent {
            parent_label_id,
            reply,
        })
        .await
    }

    /// Copies of the current collections
    pub async fn snapshot(&self) -> EngineResult<(Vec<Volume>, Vec<ParentLabel>)> {
        let (reply, response) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        response.await.map_err(|_| EngineError::SessionClosed)
    }
}
