//! # lga-workspace - Scratch Workspace for Structural Comparison
//!
//! One owning handle bundles the fourteen scratch buffers used by a
//! structure-alignment run, all sized from a single `MAXRES` value.
//!
//! ## Guarantees
//! - All-or-nothing construction: a workspace is fully allocated or absent
//! - Every buffer is zero-initialized and independently allocated
//! - Allocation failure is reported, never aborts, and leaks nothing
//! - Create on a live slot and destroy on an empty slot are no-ops
//!
//! ## Usage
//! ```rust
//! use lga_workspace::{WorkspaceConfig, WorkspaceSlot};
//!
//! let mut slot = WorkspaceSlot::new();
//! let ws = slot.create(&WorkspaceConfig::new(3000))?;
//! ws.xa3[0] = 1.0;
//! ws.calphas2[0] = 17;
//!
//! slot.destroy();
//! assert!(!slot.is_live());
//! # Ok::<(), lga_workspace::WorkspaceError>(())
//! ```

pub mod allocator;
pub mod buffer;
#[cfg(feature = "capi")]
pub mod capi;
pub mod config;
pub mod error;
pub mod records;
pub mod slot;
pub mod workspace;

// Re-exports
pub use allocator::{Global, RawAllocator, TrackingAllocator};
pub use buffer::{ScratchBuffer, CACHE_LINE};
pub use config::{
    checked_buffer_size, BufferSizes, ConfigError, WorkspaceConfig, DEFAULT_MAX_RES,
    MAX_BUFFER_ELEMENTS, MAX_RES_LIMIT, MOL_RECORDS, TEXT_LINES, TEXT_LINE_WIDTH,
};
pub use error::{status_of, WorkspaceError, WorkspaceResult, STATUS_OK};
pub use records::{MolCheck, TextLine};
pub use slot::{create, create_in, destroy, WorkspaceSlot};
pub use workspace::{BufferId, BufferKind, Coord, Index, Workspace};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
