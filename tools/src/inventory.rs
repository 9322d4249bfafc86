//! Demo header and message inventory.

use std::collections::BTreeMap;

use serde::Serialize;
use wire::{decode_demo, DemoHeader, Limits, MessageKind, WireResult};

/// Serializable copy of a demo header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderReport {
    pub demo_protocol: i32,
    pub network_protocol: i32,
    pub server: String,
    pub nick: String,
    pub map: String,
    pub game: String,
    pub duration: f32,
    pub ticks: i32,
    pub frames: i32,
    pub signon_length: i32,
}

impl From<&DemoHeader> for HeaderReport {
    fn from(header: &DemoHeader) -> Self {
        Self {
            demo_protocol: header.demo_protocol,
            network_protocol: header.network_protocol,
            server: header.server.clone(),
            nick: header.nick.clone(),
            map: header.map.clone(),
            game: header.game.clone(),
            duration: header.duration,
            ticks: header.ticks,
            frames: header.frames,
            signon_length: header.signon_length,
        }
    }
}

/// Count and payload size for one message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct KindStats {
    pub count: usize,
    pub payload_bytes: usize,
}

/// Per-kind message statistics for a whole demo.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MessageInventory {
    pub messages: usize,
    pub first_tick: Option<i32>,
    pub last_tick: Option<i32>,
    pub by_kind: BTreeMap<&'static str, KindStats>,
    /// Framing error that ended the stream early, if any.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoReport {
    pub header: HeaderReport,
    pub inventory: MessageInventory,
}

pub const fn kind_name(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Signon => "signon",
        MessageKind::Packet => "packet",
        MessageKind::SyncTick => "sync_tick",
        MessageKind::ConsoleCmd => "console_cmd",
        MessageKind::UserCmd => "user_cmd",
        MessageKind::DataTables => "data_tables",
        MessageKind::Stop => "stop",
        MessageKind::StringTables => "string_tables",
    }
}

/// Reads a demo's header and walks every message.
///
/// A bad header is an error. A framing error after the header is recorded in
/// the inventory and ends the walk.
pub fn inspect_demo(bytes: &[u8], limits: &Limits) -> WireResult<DemoReport> {
    let (header, messages) = decode_demo(bytes, limits)?;
    let mut inventory = MessageInventory::default();

    for message in messages {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                inventory.error = Some(err.to_string());
                break;
            }
        };
        inventory.messages += 1;
        inventory.first_tick.get_or_insert(message.tick);
        inventory.last_tick = Some(message.tick);
        let stats = inventory.by_kind.entry(kind_name(message.kind)).or_default();
        stats.count += 1;
        stats.payload_bytes += message.payload.bit_len() / 8;
    }

    Ok(DemoReport {
        header: HeaderReport::from(&header),
        inventory,
    })
}

/// Renders a demo report as human-readable text.
pub fn format_demo_pretty(report: &DemoReport) -> String {
    let header = &report.header;
    let inventory = &report.inventory;
    let mut out = String::new();
    out.push_str(&format!(
        "demo protocol: {} network protocol: {}\n",
        header.demo_protocol, header.network_protocol
    ));
    out.push_str(&format!("server: {}\nnick: {}\n", header.server, header.nick));
    out.push_str(&format!("map: {} game: {}\n", header.map, header.game));
    out.push_str(&format!(
        "duration: {:.2}s ticks: {} frames: {} signon: {} bytes\n",
        header.duration, header.ticks, header.frames, header.signon_length
    ));
    out.push_str(&format!("messages: {}", inventory.messages));
    if let (Some(first), Some(last)) = (inventory.first_tick, inventory.last_tick) {
        out.push_str(&format!(" (ticks {first}..={last})"));
    }
    out.push('\n');
    for (kind, stats) in &inventory.by_kind {
        out.push_str(&format!(
            "  {kind}: {} ({} bytes)\n",
            stats.count, stats.payload_bytes
        ));
    }
    if let Some(err) = &inventory.error {
        out.push_str(&format!("stopped early: {err}\n"));
    }
    out
}
