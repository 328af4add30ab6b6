//! Owning handle slot with the two-state lifecycle {absent, live}.
//!
//! [`WorkspaceSlot`] is where a caller keeps its workspace between
//! comparisons. [`create`](WorkspaceSlot::create) fills an empty slot and is a
//! no-op on a live one; [`destroy`](WorkspaceSlot::destroy) empties it and is a
//! no-op on an empty one. A slot never holds a partially built workspace.
//!
//! ```rust
//! use lga_workspace::{WorkspaceConfig, WorkspaceSlot};
//!
//! let config = WorkspaceConfig::new(3000);
//! let mut slot = WorkspaceSlot::new();
//!
//! slot.create(&config).unwrap();
//! assert!(slot.is_live());
//!
//! // Second create keeps the existing workspace
//! slot.create(&config).unwrap();
//!
//! slot.destroy();
//! slot.destroy();
//! assert!(!slot.is_live());
//! ```
//!
//! The free functions [`create`] and [`destroy`] take the slot as
//! `Option<&mut WorkspaceSlot>`, mirroring callers that may hold no slot at all.

use log::{debug, trace};

use crate::allocator::{Global, RawAllocator};
use crate::config::WorkspaceConfig;
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::workspace::Workspace;

/// Slot owning at most one boxed [`Workspace`].
///
/// The workspace is boxed so its address stays stable for the whole time
/// it is live, even if the slot itself moves.
///
/// The box itself comes from the global allocator, not from `A`, and is only
/// requested after all fourteen buffers succeed. Like any `Box::new`, that
/// one small allocation aborts the process if it runs out of memory.
pub struct WorkspaceSlot<A: RawAllocator = Global> {
    inner: Option<Box<Workspace<A>>>,
}

impl<A: RawAllocator> Default for WorkspaceSlot<A> {
    fn default() -> Self {
        Self { inner: None }
    }
}

impl WorkspaceSlot<Global> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self { inner: None }
    }

    /// Fills the slot with a workspace from the system allocator.
    ///
    /// See [`create_in`](Self::create_in).
    pub fn create(&mut self, config: &WorkspaceConfig) -> WorkspaceResult<&mut Workspace> {
        self.create_in(config, Global)
    }
}

impl<A: RawAllocator> WorkspaceSlot<A> {
    /// Fills the slot with a workspace drawn from `alloc`.
    ///
    /// If the slot is already live this allocates nothing, ignores `config`
    /// and returns the existing workspace. On error the slot stays empty and
    /// no buffer remains allocated.
    pub fn create_in(
        &mut self,
        config: &WorkspaceConfig,
        alloc: A,
    ) -> WorkspaceResult<&mut Workspace<A>> {
        let ws = match self.inner.take() {
            Some(ws) => {
                debug!(
                    "workspace already allocated (max_res={}), skipping create",
                    ws.max_res()
                );
                ws
            }
            None => Box::new(Workspace::new_in(config, alloc)?),
        };
        Ok(&mut **self.inner.insert(ws))
    }

    /// Releases the workspace and empties the slot.
    ///
    /// Every buffer is released exactly once. Calling this on an empty slot
    /// does nothing.
    pub fn destroy(&mut self) {
        if let Some(ws) = self.inner.take() {
            trace!(
                "releasing workspace: max_res={}, bytes={}",
                ws.max_res(),
                ws.total_bytes()
            );
            drop(ws);
        }
    }

    /// Is a workspace present?
    #[inline]
    pub fn is_live(&self) -> bool {
        self.inner.is_some()
    }

    /// The live workspace, if any.
    #[inline]
    pub fn get(&self) -> Option<&Workspace<A>> {
        self.inner.as_deref()
    }

    /// The live workspace, if any.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut Workspace<A>> {
        self.inner.as_deref_mut()
    }

    /// Moves the workspace out, leaving the slot empty.
    #[inline]
    pub fn take(&mut self) -> Option<Box<Workspace<A>>> {
        self.inner.take()
    }
}

impl<A: RawAllocator> std::fmt::Debug for WorkspaceSlot<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WorkspaceSlot").field(&self.inner).finish()
    }
}

/// Fills `slot` from the system allocator.
///
/// # Errors
///
/// [`WorkspaceError::InvalidArgument`] if `slot` is `None` (nothing is
/// allocated), otherwise as [`WorkspaceSlot::create_in`].
pub fn create(slot: Option<&mut WorkspaceSlot>, config: &WorkspaceConfig) -> WorkspaceResult<()> {
    create_in(slot, config, Global)
}

/// Fills `slot` with buffers drawn from `alloc`.
pub fn create_in<A: RawAllocator>(
    slot: Option<&mut WorkspaceSlot<A>>,
    config: &WorkspaceConfig,
    alloc: A,
) -> WorkspaceResult<()> {
    let slot = slot.ok_or(WorkspaceError::invalid_argument("workspace slot is null"))?;
    slot.create_in(config, alloc)?;
    Ok(())
}

/// Empties `slot`. A missing or empty slot is a no-op.
pub fn destroy<A: RawAllocator>(slot: Option<&mut WorkspaceSlot<A>>) {
    if let Some(slot) = slot {
        slot.destroy();
    }
}
