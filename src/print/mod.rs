//! Print workflow and payload assembly

pub mod payload;
pub mod workflow;

pub use payload::{parent_header, representative_volume, resolve_carrier, volume_header};
pub use workflow::{
    confirm_print, create_and_print_parent_label, execute_print, existing_volumes_count,
    newly_printed, print_parent_label, reprint_single, request_print,
};
