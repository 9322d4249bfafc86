//! Outer message framing.
//!
//! After the header a demo is a flat sequence of messages:
//!
//! ```text
//! kind:u8 tick:i32 [preamble] [length:i32 payload:length bytes]
//! ```
//!
//! Signon and packet messages carry an 84-byte command-info preamble, user
//! commands a 4-byte outgoing sequence, and sync ticks nothing at all.

use bitstream::BitReader;

use crate::error::{DecodeError, LimitKind, WireResult};
use crate::header::{decode_header, DemoHeader};
use crate::limits::Limits;

/// Message kinds in the outer demo stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    Signon = 1,
    Packet = 2,
    SyncTick = 3,
    ConsoleCmd = 4,
    UserCmd = 5,
    DataTables = 6,
    Stop = 7,
    StringTables = 8,
}

impl MessageKind {
    /// Parses a message kind from its raw byte.
    #[must_use]
    pub const fn parse(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Signon),
            2 => Some(Self::Packet),
            3 => Some(Self::SyncTick),
            4 => Some(Self::ConsoleCmd),
            5 => Some(Self::UserCmd),
            6 => Some(Self::DataTables),
            7 => Some(Self::Stop),
            8 => Some(Self::StringTables),
            _ => None,
        }
    }

    /// Returns `true` for messages whose payload is a net-message packet.
    #[must_use]
    pub const fn carries_packet(self) -> bool {
        matches!(self, Self::Signon | Self::Packet)
    }
}

/// Camera state for one split-screen slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewSplit {
    pub origin: [f32; 3],
    pub angles: [f32; 3],
    pub local_angles: [f32; 3],
}

/// Command info preceding signon and packet payloads.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommandInfo {
    pub flags: i32,
    pub views: [ViewSplit; 2],
    pub sequence_in: i32,
    pub sequence_out: i32,
}

/// One framed message.
#[derive(Debug, Clone)]
pub struct DemoMessage<'a> {
    pub kind: MessageKind,
    pub tick: i32,
    /// Present for signon and packet messages.
    pub info: Option<CommandInfo>,
    /// Bounded view of the payload (empty for sync ticks).
    pub payload: BitReader<'a>,
}

/// Splits a demo stream into messages.
///
/// Iteration stops at a `Stop` message or when fewer than 8 bits remain.
/// After the first error the reader is exhausted.
#[derive(Debug)]
pub struct MessageReader<'a> {
    reader: BitReader<'a>,
    limits: Limits,
    count: usize,
    done: bool,
}

impl<'a> MessageReader<'a> {
    /// Creates a reader positioned at the first message.
    #[must_use]
    pub fn new(reader: BitReader<'a>, limits: &Limits) -> Self {
        Self {
            reader,
            limits: limits.clone(),
            count: 0,
            done: false,
        }
    }

    /// Number of messages read so far.
    #[must_use]
    pub const fn messages_read(&self) -> usize {
        self.count
    }

    /// Reads the next message, or `None` at the end of the stream.
    pub fn next_message(&mut self) -> WireResult<Option<DemoMessage<'a>>> {
        if self.done || self.reader.bits_remaining() < 8 {
            self.done = true;
            return Ok(None);
        }
        let result = self.read_message();
        match &result {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => self.done = true,
        }
        result
    }

    fn read_message(&mut self) -> WireResult<Option<DemoMessage<'a>>> {
        let offset = self.reader.bit_position() / 8;
        let raw = self.reader.read_u8()?;
        let kind = MessageKind::parse(raw)
            .ok_or(DecodeError::UnknownMessageType { kind: raw, offset })?;
        if kind == MessageKind::Stop {
            return Ok(None);
        }

        if self.count >= self.limits.max_messages {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::MessageCount,
                limit: self.limits.max_messages,
                actual: self.count + 1,
            });
        }
        self.count += 1;

        let tick = self.reader.read_i32()?;
        let mut info = None;
        match kind {
            MessageKind::Signon | MessageKind::Packet => {
                info = Some(read_command_info(&mut self.reader)?);
            }
            MessageKind::UserCmd => {
                self.reader.skip_bits(32)?;
            }
            MessageKind::SyncTick => {
                return Ok(Some(DemoMessage {
                    kind,
                    tick,
                    info,
                    payload: BitReader::new(&[]),
                }));
            }
            _ => {}
        }

        let length = self.reader.read_i32()?;
        let length = usize::try_from(length).map_err(|_| DecodeError::NegativeLength { length })?;
        if length > self.limits.max_message_bytes {
            return Err(DecodeError::LimitsExceeded {
                kind: LimitKind::MessageBytes,
                limit: self.limits.max_message_bytes,
                actual: length,
            });
        }
        let payload = self.reader.sub_reader(length * 8)?;

        Ok(Some(DemoMessage {
            kind,
            tick,
            info,
            payload,
        }))
    }
}

impl<'a> Iterator for MessageReader<'a> {
    type Item = WireResult<DemoMessage<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_message().transpose()
    }
}

/// Decodes the header of a demo file and returns a reader over its messages.
pub fn decode_demo<'a>(
    bytes: &'a [u8],
    limits: &Limits,
) -> WireResult<(DemoHeader, MessageReader<'a>)> {
    let mut reader = BitReader::new(bytes);
    let header = decode_header(&mut reader)?;
    Ok((header, MessageReader::new(reader, limits)))
}

fn read_command_info(reader: &mut BitReader<'_>) -> WireResult<CommandInfo> {
    let flags = reader.read_i32()?;
    let mut views = [ViewSplit::default(); 2];
    for view in &mut views {
        view.origin = read_vec3(reader)?;
        view.angles = read_vec3(reader)?;
        view.local_angles = read_vec3(reader)?;
    }
    Ok(CommandInfo {
        flags,
        views,
        sequence_in: reader.read_i32()?,
        sequence_out: reader.read_i32()?,
    })
}

fn read_vec3(reader: &mut BitReader<'_>) -> WireResult<[f32; 3]> {
    Ok([reader.read_f32()?, reader.read_f32()?, reader.read_f32()?])
}
