//! Decoder configuration

use serde::{Deserialize, Serialize};

/// Limits and policy applied while decoding untrusted data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Maximum number of values produced by a single decode call
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
    /// Maximum input length in bytes
    #[serde(default = "default_max_buffer_len")]
    pub max_buffer_len: usize,
    /// Maximum total `bytes`/`string` payload copied out by a single decode
    /// call. Pointers may alias one tail region, so this is tracked apart
    /// from the input length.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    /// Maximum type nesting followed while decoding
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Reject boolean words other than 0/1 and words with dirty padding.
    /// When false, booleans are coerced by truthiness and padding is ignored.
    #[serde(default = "default_strict")]
    pub strict: bool,
}

fn default_max_elements() -> usize {
    65_536
}

fn default_max_buffer_len() -> usize {
    16 * 1024 * 1024
}

fn default_max_payload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_max_depth() -> usize {
    32
}

fn default_strict() -> bool {
    true
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_elements: default_max_elements(),
            max_buffer_len: default_max_buffer_len(),
            max_payload_bytes: default_max_payload_bytes(),
            max_depth: default_max_depth(),
            strict: default_strict(),
        }
    }
}

impl DecoderConfig {
    /// Default limits with permissive word checks
    pub fn permissive() -> Self {
        Self {
            strict: false,
            ..Self::default()
        }
    }

    /// Set the element budget
    pub fn with_max_elements(mut self, max_elements: usize) -> Self {
        self.max_elements = max_elements;
        self
    }

    /// Set the maximum input length
    pub fn with_max_buffer_len(mut self, max_buffer_len: usize) -> Self {
        self.max_buffer_len = max_buffer_len;
        self
    }

    /// Set the payload byte budget
    pub fn with_max_payload_bytes(mut self, max_payload_bytes: usize) -> Self {
        self.max_payload_bytes = max_payload_bytes;
        self
    }

    /// Set the maximum nesting depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
