//! Fixed-layout records stored in the `mol` and `straline` tables.
//!
//! Both records are `#[repr(C)]` and [`Pod`], so a zeroed allocation is a
//! valid, empty record and C consumers see the same layout.
//!
//! # Layout
//!
//! ```text
//! MolCheck (48 bytes)          TextLine (256 bytes)
//! Offset  Size  Field          Offset  Size  Field
//! 0       8     atoms          0       256   bytes (NUL-terminated)
//! 8       8     residues
//! 16      8     calphas
//! 24      8     first_residue
//! 32      8     last_residue
//! 40      8     chain
//! ```

use bytemuck::{Pod, Zeroable};

use crate::config::TEXT_LINE_WIDTH;

/// Per-molecule bookkeeping filled in while a structure is read.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct MolCheck {
    /// Number of atoms read.
    pub atoms: i64,
    /// Number of residues read.
    pub residues: i64,
    /// Number of residues with a C-alpha atom.
    pub calphas: i64,
    /// Sequence number of the first residue.
    pub first_residue: i64,
    /// Sequence number of the last residue.
    pub last_residue: i64,
    /// Chain identifier as a byte value (0 = none).
    pub chain: i64,
}

/// One fixed-width text line, NUL-terminated.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TextLine {
    /// Raw line bytes; everything from the first NUL on is ignored.
    pub bytes: [u8; TEXT_LINE_WIDTH],
}

impl Default for TextLine {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl TextLine {
    /// Longest text that still leaves room for the terminator.
    pub const MAX_TEXT: usize = TEXT_LINE_WIDTH - 1;

    /// Bytes up to (not including) the first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(TEXT_LINE_WIDTH);
        &self.bytes[..end]
    }

    /// The line as UTF-8, or `None` if the bytes are not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    /// Stores `text`, truncated to [`MAX_TEXT`](Self::MAX_TEXT) bytes.
    ///
    /// Returns the number of bytes stored. Truncation may split a multi-byte
    /// character; [`as_str`](Self::as_str) then returns `None`.
    pub fn set(&mut self, text: &str) -> usize {
        let src = text.as_bytes();
        let n = src.len().min(Self::MAX_TEXT);
        self.bytes = [0; TEXT_LINE_WIDTH];
        self.bytes[..n].copy_from_slice(&src[..n]);
        n
    }

    /// Empties the line.
    pub fn clear(&mut self) {
        self.bytes = [0; TEXT_LINE_WIDTH];
    }

    /// Is the line empty?
    pub fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }
}
