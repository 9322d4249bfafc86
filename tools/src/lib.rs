//! Inspection tools for demodec.
//!
//! - Print a demo's header and a per-kind message inventory
//! - Decode a standalone packet-entities payload against a JSON schema and
//!   report the resulting entities as JSON
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to understand what the decoder is doing.

mod entities;
mod inventory;

pub use entities::{
    decode_entities, load_registry, registry_report, value_json, EntitiesReport, EntityReport,
    PacketReport, PropertyReport,
};
pub use inventory::{
    format_demo_pretty, inspect_demo, kind_name, DemoReport, HeaderReport, KindStats,
    MessageInventory,
};
