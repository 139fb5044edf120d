//! Volume & Label Linkage Engine
//!
//! Receiving-side label logic for the warehouse: volume generation from an
//! invoice, hazard classification, parent ("mother") label linkage with
//! weight aggregation, and the print/confirm/reprint workflow.
//!
//! The engine performs no I/O of its own. Invoices come in as JSON,
//! collections are owned by the caller, and print jobs leave through a
//! [`sink::LabelSink`].
//!
//! ```text
//! invoice JSON ──► InvoiceData ──► factory ──► Volume[] ──► linkage ──► print ──► PrintJob
//!                                   │                                      │
//!                              identifier                              LabelSink
//! ```

pub mod classification;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod hazmat;
pub mod identifier;
pub mod invoice;
pub mod linkage;
pub mod print;
pub mod session;
pub mod sink;
pub mod weight;

pub use classification::{classify_volume, HazardProfile};
pub use config::{ConfigLoader, EngineConfig};
pub use engine::LabelEngine;
pub use error::{EngineError, EngineResult};
pub use factory::{generate_volumes, GenerateRequest};
pub use identifier::{generate_volume_id, IdentifierGenerator};
pub use invoice::{Field, InvoiceData, ResolvedParties};
pub use session::{spawn_session, LabelSession, SessionHandle};
pub use sink::{InMemoryLabelSink, LabelSink, LocalLabelSink, SinkError};

pub use wms_labels_types as types;
pub use wms_labels_types::{
    CargoKind, FormatSpec, HazardClass, LabelRecord, ParentLabel, ParentLabelKind, PrintJob,
    PrintValidationResult, Volume,
};
