//! Workspace configuration and derived buffer sizes.
//!
//! Every capacity-bearing buffer is sized from one value, `MAXRES`, the
//! maximum number of residues a structure may carry. The derived capacity is
//! `n = MAXRES + 1`; buffers then hold `n`, `2n` or `3n` elements.
//!
//! # Example
//!
//! ```rust
//! use lga_workspace::WorkspaceConfig;
//!
//! let config = WorkspaceConfig::default();
//! assert_eq!(config.max_res, 3000);
//!
//! let sizes = config.buffer_sizes().unwrap();
//! assert_eq!(sizes.n, 3001);
//! assert_eq!(sizes.n3, 9003);
//! ```
//!
//! # Buffer Sizing
//!
//! | Class | Length | Buffers |
//! |-------|--------|---------|
//! | single | `n` | `tmp`, `rwa1`, `rwa2` |
//! | double | `2n` | `calphas2`, `l_atoms2`, `out2`, `sup`, `sup1`, `sup2` |
//! | triple | `3n` | `ind3`, `xa3`, `xb3` |
//! | fixed | [`MOL_RECORDS`] / [`TEXT_LINES`] | `mol`, `straline` |

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{WorkspaceError, WorkspaceResult};

/// Default maximum number of residues (`MAXRES`).
pub const DEFAULT_MAX_RES: usize = 3000;

/// Number of `mol` records, independent of `MAXRES`.
pub const MOL_RECORDS: usize = 2;

/// Number of `straline` records, independent of `MAXRES`.
pub const TEXT_LINES: usize = 200;

/// Width in bytes of one `straline` record.
pub const TEXT_LINE_WIDTH: usize = 256;

/// Upper bound on the element count of any single buffer.
pub const MAX_BUFFER_ELEMENTS: usize = 1 << 30;

/// Largest `max_res` whose `3n` buffers stay within [`MAX_BUFFER_ELEMENTS`].
pub const MAX_RES_LIMIT: usize = MAX_BUFFER_ELEMENTS / 3 - 1;

/// Workspace configuration.
///
/// ```rust
/// use lga_workspace::WorkspaceConfig;
///
/// let config = WorkspaceConfig::new(500);
/// assert_eq!(config.capacity(), 501);
/// config.validate().expect("Invalid configuration");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorkspaceConfig {
    /// Maximum number of residues the buffers must accommodate.
    pub max_res: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            max_res: DEFAULT_MAX_RES,
        }
    }
}

impl WorkspaceConfig {
    /// Creates a configuration for the given `MAXRES`.
    pub const fn new(max_res: usize) -> Self {
        Self { max_res }
    }

    /// Derived capacity `n = max_res + 1`.
    ///
    /// Saturates on overflow; [`validate`](Self::validate) rejects such values.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.max_res.saturating_add(1)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MaxResTooLarge`] if the `3n` buffers would
    /// exceed [`MAX_BUFFER_ELEMENTS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_res > MAX_RES_LIMIT {
            return Err(ConfigError::MaxResTooLarge {
                max_res: self.max_res,
                limit: MAX_RES_LIMIT,
            });
        }
        Ok(())
    }

    /// Computes every buffer length for this configuration.
    ///
    /// Validates first, then derives the sizes with checked arithmetic.
    pub fn buffer_sizes(&self) -> WorkspaceResult<BufferSizes> {
        self.validate()?;

        let n = self
            .max_res
            .checked_add(1)
            .ok_or_else(|| WorkspaceError::overflow("max_res + 1 overflows usize"))?;
        let n2 = checked_buffer_size(n, 2)?;
        let n3 = checked_buffer_size(n, 3)?;

        Ok(BufferSizes { n, n2, n3 })
    }
}

/// Multiplies `n * factor`, rejecting overflow and oversize buffers.
pub fn checked_buffer_size(n: usize, factor: usize) -> WorkspaceResult<usize> {
    let size = n
        .checked_mul(factor)
        .ok_or_else(|| WorkspaceError::overflow(format!("{} * {} overflow", n, factor)))?;
    if size > MAX_BUFFER_ELEMENTS {
        return Err(WorkspaceError::overflow(format!(
            "buffer of {} elements exceeds limit {}",
            size, MAX_BUFFER_ELEMENTS
        )));
    }
    Ok(size)
}

/// Element counts derived from one [`WorkspaceConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSizes {
    /// `max_res + 1`
    pub n: usize,
    /// `2n`
    pub n2: usize,
    /// `3n`
    pub n3: usize,
}

/// Errors returned by [`WorkspaceConfig::validate`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `max_res` is too large for the triple-sized buffers.
    #[error("max_res {max_res} exceeds limit {limit}")]
    MaxResTooLarge {
        /// Requested value.
        max_res: usize,
        /// Largest accepted value.
        limit: usize,
    },
}
