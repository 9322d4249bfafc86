//! Configurable limits for bounded framing.

/// Framing limits for demo decoding.
///
/// These limits are enforced while splitting the stream into messages, before
/// any payload is handed to higher layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum payload size of a single message in bytes.
    pub max_message_bytes: usize,

    /// Maximum number of messages read from one demo.
    pub max_messages: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Data table dumps are the largest messages, typically a few hundred KB.
            max_message_bytes: 16 * 1024 * 1024,
            max_messages: 4 * 1024 * 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_message_bytes: 4096,
            max_messages: 64,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_message_bytes: usize::MAX,
            max_messages: usize::MAX,
        }
    }
}
