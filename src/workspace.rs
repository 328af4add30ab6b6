//! The scratch workspace: fourteen independently allocated buffers.
//!
//! A [`Workspace`] either exists with every buffer allocated and zeroed, or
//! does not exist at all. Construction allocates the buffers one by one; if
//! any allocation fails, the buffers already acquired are dropped (and thus
//! released) before the error reaches the caller.
//!
//! ```rust
//! use lga_workspace::{BufferId, Workspace, WorkspaceConfig};
//!
//! let ws = Workspace::new(&WorkspaceConfig::new(3000)).unwrap();
//! assert_eq!(ws.capacity(), 3001);
//! assert_eq!(ws.ind3.len(), 9003);
//! assert_eq!(ws.len_of(BufferId::Mol), 2);
//! ```
//!
//! # Buffers
//!
//! | Buffer | Element | Length |
//! |--------|---------|--------|
//! | `calphas2`, `l_atoms2`, `out2`, `sup`, `sup1`, `sup2` | [`Index`] | `2n` |
//! | `ind3` | [`Index`] | `3n` |
//! | `tmp`, `rwa1`, `rwa2` | [`Index`] | `n` |
//! | `xa3`, `xb3` | [`Coord`] | `3n` |
//! | `mol` | [`MolCheck`] | [`MOL_RECORDS`] |
//! | `straline` | [`TextLine`] | [`TEXT_LINES`] |
//!
//! # Thread Safety
//!
//! Workspaces are NOT internally synchronized. Each thread should build its
//! own; independent workspaces share nothing and can be created concurrently.

use std::fmt;

use bytemuck::Zeroable;
use log::{debug, warn};

use crate::allocator::{Global, RawAllocator};
use crate::buffer::ScratchBuffer;
use crate::config::{BufferSizes, WorkspaceConfig, MOL_RECORDS, TEXT_LINES};
use crate::error::WorkspaceResult;
use crate::records::{MolCheck, TextLine};

/// Integer index element (residue and atom indices, mappings).
pub type Index = i64;

/// Floating-point coordinate element.
pub type Coord = f32;

/// Element class of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// [`Index`] elements.
    Index,
    /// [`Coord`] elements.
    Coord,
    /// [`MolCheck`] records.
    Mol,
    /// [`TextLine`] records.
    Text,
}

impl BufferKind {
    /// Size of one element in bytes.
    pub const fn element_size(self) -> usize {
        match self {
            BufferKind::Index => std::mem::size_of::<Index>(),
            BufferKind::Coord => std::mem::size_of::<Coord>(),
            BufferKind::Mol => std::mem::size_of::<MolCheck>(),
            BufferKind::Text => std::mem::size_of::<TextLine>(),
        }
    }
}

/// Identifies one of the workspace buffers.
///
/// Discriminants are stable and shared with the C API.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferId {
    Calphas2 = 0,
    LAtoms2 = 1,
    Out2 = 2,
    Ind3 = 3,
    Tmp = 4,
    Rwa1 = 5,
    Rwa2 = 6,
    Xa3 = 7,
    Xb3 = 8,
    Sup = 9,
    Sup1 = 10,
    Sup2 = 11,
    Mol = 12,
    Straline = 13,
}

impl BufferId {
    /// Number of buffers in a workspace.
    pub const COUNT: usize = 14;

    /// Every buffer, in allocation order.
    pub const ALL: [BufferId; Self::COUNT] = [
        BufferId::Calphas2,
        BufferId::LAtoms2,
        BufferId::Out2,
        BufferId::Ind3,
        BufferId::Tmp,
        BufferId::Rwa1,
        BufferId::Rwa2,
        BufferId::Xa3,
        BufferId::Xb3,
        BufferId::Sup,
        BufferId::Sup1,
        BufferId::Sup2,
        BufferId::Mol,
        BufferId::Straline,
    ];

    /// Looks up a buffer by its raw discriminant.
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Field name of the buffer.
    pub const fn name(self) -> &'static str {
        match self {
            BufferId::Calphas2 => "calphas2",
            BufferId::LAtoms2 => "l_atoms2",
            BufferId::Out2 => "out2",
            BufferId::Ind3 => "ind3",
            BufferId::Tmp => "tmp",
            BufferId::Rwa1 => "rwa1",
            BufferId::Rwa2 => "rwa2",
            BufferId::Xa3 => "xa3",
            BufferId::Xb3 => "xb3",
            BufferId::Sup => "sup",
            BufferId::Sup1 => "sup1",
            BufferId::Sup2 => "sup2",
            BufferId::Mol => "mol",
            BufferId::Straline => "straline",
        }
    }

    /// Element class of the buffer.
    pub const fn kind(self) -> BufferKind {
        match self {
            BufferId::Xa3 | BufferId::Xb3 => BufferKind::Coord,
            BufferId::Mol => BufferKind::Mol,
            BufferId::Straline => BufferKind::Text,
            _ => BufferKind::Index,
        }
    }

    /// Element count of the buffer for the given sizes.
    pub const fn element_count(self, sizes: &BufferSizes) -> usize {
        match self {
            BufferId::Calphas2
            | BufferId::LAtoms2
            | BufferId::Out2
            | BufferId::Sup
            | BufferId::Sup1
            | BufferId::Sup2 => sizes.n2,
            BufferId::Ind3 | BufferId::Xa3 | BufferId::Xb3 => sizes.n3,
            BufferId::Tmp | BufferId::Rwa1 | BufferId::Rwa2 => sizes.n,
            BufferId::Mol => MOL_RECORDS,
            BufferId::Straline => TEXT_LINES,
        }
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scratch buffers for one structural comparison.
///
/// Buffer contents are owned by the consuming algorithms; the workspace
/// only guarantees that they start zeroed and stay allocated for its whole
/// lifetime.
pub struct Workspace<A: RawAllocator = Global> {
    /// C-alpha index mapping: `[2n]`
    pub calphas2: ScratchBuffer<Index, A>,
    /// Atom index mapping: `[2n]`
    pub l_atoms2: ScratchBuffer<Index, A>,
    /// Output residue mapping: `[2n]`
    pub out2: ScratchBuffer<Index, A>,
    /// Triple-indexed mapping: `[3n]`
    pub ind3: ScratchBuffer<Index, A>,
    /// Scratch indices: `[n]`
    pub tmp: ScratchBuffer<Index, A>,
    /// Scratch indices: `[n]`
    pub rwa1: ScratchBuffer<Index, A>,
    /// Scratch indices: `[n]`
    pub rwa2: ScratchBuffer<Index, A>,
    /// First coordinate set, `n` points of xyz: `[3n]`
    pub xa3: ScratchBuffer<Coord, A>,
    /// Second coordinate set, `n` points of xyz: `[3n]`
    pub xb3: ScratchBuffer<Coord, A>,
    /// Superposition mapping: `[2n]`
    pub sup: ScratchBuffer<Index, A>,
    /// Superposition mapping: `[2n]`
    pub sup1: ScratchBuffer<Index, A>,
    /// Superposition mapping: `[2n]`
    pub sup2: ScratchBuffer<Index, A>,
    /// Per-molecule checks: `[MOL_RECORDS]`
    pub mol: ScratchBuffer<MolCheck, A>,
    /// Text lines: `[TEXT_LINES]`
    pub straline: ScratchBuffer<TextLine, A>,

    config: WorkspaceConfig,
    sizes: BufferSizes,
}

impl Workspace<Global> {
    /// Allocates a workspace from the system allocator.
    ///
    /// # Errors
    ///
    /// - [`WorkspaceError::Config`](crate::WorkspaceError::Config) /
    ///   [`WorkspaceError::Overflow`](crate::WorkspaceError::Overflow) for
    ///   unusable configurations (nothing is allocated).
    /// - [`WorkspaceError::AllocationFailure`](crate::WorkspaceError::AllocationFailure)
    ///   if any buffer cannot be allocated (nothing stays allocated).
    pub fn new(config: &WorkspaceConfig) -> WorkspaceResult<Self> {
        Self::new_in(config, Global)
    }
}

impl<A: RawAllocator> Workspace<A> {
    /// Allocates a workspace with every buffer drawn from `alloc`.
    pub fn new_in(config: &WorkspaceConfig, alloc: A) -> WorkspaceResult<Self> {
        let sizes = config.buffer_sizes()?;

        match Self::allocate(config, sizes, &alloc) {
            Ok(ws) => {
                debug!(
                    "allocated workspace: max_res={}, buffers={}, bytes={}",
                    config.max_res,
                    BufferId::COUNT,
                    ws.total_bytes()
                );
                Ok(ws)
            }
            Err(err) => {
                // Buffers built before the failure were dropped on the way out
                warn!(
                    "workspace allocation failed for max_res={}: {}",
                    config.max_res, err
                );
                Err(err)
            }
        }
    }

    fn allocate(config: &WorkspaceConfig, sizes: BufferSizes, alloc: &A) -> WorkspaceResult<Self> {
        let len = |id: BufferId| id.element_count(&sizes);

        // Field initializers run in order, matching BufferId::ALL
        Ok(Self {
            calphas2: zeroed(len(BufferId::Calphas2), alloc)?,
            l_atoms2: zeroed(len(BufferId::LAtoms2), alloc)?,
            out2: zeroed(len(BufferId::Out2), alloc)?,
            ind3: zeroed(len(BufferId::Ind3), alloc)?,
            tmp: zeroed(len(BufferId::Tmp), alloc)?,
            rwa1: zeroed(len(BufferId::Rwa1), alloc)?,
            rwa2: zeroed(len(BufferId::Rwa2), alloc)?,
            xa3: zeroed(len(BufferId::Xa3), alloc)?,
            xb3: zeroed(len(BufferId::Xb3), alloc)?,
            sup: zeroed(len(BufferId::Sup), alloc)?,
            sup1: zeroed(len(BufferId::Sup1), alloc)?,
            sup2: zeroed(len(BufferId::Sup2), alloc)?,
            mol: zeroed(len(BufferId::Mol), alloc)?,
            straline: zeroed(len(BufferId::Straline), alloc)?,
            config: *config,
            sizes,
        })
    }

    /// Configuration the workspace was built from.
    #[inline]
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// `MAXRES` of this workspace.
    #[inline]
    pub fn max_res(&self) -> usize {
        self.config.max_res
    }

    /// Derived capacity `n = max_res + 1`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.sizes.n
    }

    /// Element counts of this workspace.
    #[inline]
    pub fn sizes(&self) -> &BufferSizes {
        &self.sizes
    }

    /// Element count of one buffer, read from the buffer itself.
    pub fn len_of(&self, id: BufferId) -> usize {
        match id {
            BufferId::Xa3 | BufferId::Xb3 => self.coord_buffer(id).map_or(0, |b| b.len()),
            BufferId::Mol => self.mol.len(),
            BufferId::Straline => self.straline.len(),
            _ => self.index_buffer(id).map_or(0, |b| b.len()),
        }
    }

    /// Total bytes held by all buffers.
    pub fn total_bytes(&self) -> usize {
        BufferId::ALL
            .iter()
            .map(|&id| self.len_of(id) * id.kind().element_size())
            .sum()
    }

    /// Integer index buffer by id, `None` for non-index buffers.
    pub fn index_buffer(&self, id: BufferId) -> Option<&ScratchBuffer<Index, A>> {
        let buf = match id {
            BufferId::Calphas2 => &self.calphas2,
            BufferId::LAtoms2 => &self.l_atoms2,
            BufferId::Out2 => &self.out2,
            BufferId::Ind3 => &self.ind3,
            BufferId::Tmp => &self.tmp,
            BufferId::Rwa1 => &self.rwa1,
            BufferId::Rwa2 => &self.rwa2,
            BufferId::Sup => &self.sup,
            BufferId::Sup1 => &self.sup1,
            BufferId::Sup2 => &self.sup2,
            BufferId::Xa3 | BufferId::Xb3 | BufferId::Mol | BufferId::Straline => return None,
        };
        Some(buf)
    }

    /// Mutable integer index buffer by id, `None` for non-index buffers.
    pub fn index_buffer_mut(&mut self, id: BufferId) -> Option<&mut ScratchBuffer<Index, A>> {
        let buf = match id {
            BufferId::Calphas2 => &mut self.calphas2,
            BufferId::LAtoms2 => &mut self.l_atoms2,
            BufferId::Out2 => &mut self.out2,
            BufferId::Ind3 => &mut self.ind3,
            BufferId::Tmp => &mut self.tmp,
            BufferId::Rwa1 => &mut self.rwa1,
            BufferId::Rwa2 => &mut self.rwa2,
            BufferId::Sup => &mut self.sup,
            BufferId::Sup1 => &mut self.sup1,
            BufferId::Sup2 => &mut self.sup2,
            BufferId::Xa3 | BufferId::Xb3 | BufferId::Mol | BufferId::Straline => return None,
        };
        Some(buf)
    }

    /// Coordinate buffer by id, `None` unless `id` is `Xa3` or `Xb3`.
    pub fn coord_buffer(&self, id: BufferId) -> Option<&ScratchBuffer<Coord, A>> {
        match id {
            BufferId::Xa3 => Some(&self.xa3),
            BufferId::Xb3 => Some(&self.xb3),
            _ => None,
        }
    }

    /// Mutable coordinate buffer by id, `None` unless `id` is `Xa3` or `Xb3`.
    pub fn coord_buffer_mut(&mut self, id: BufferId) -> Option<&mut ScratchBuffer<Coord, A>> {
        match id {
            BufferId::Xa3 => Some(&mut self.xa3),
            BufferId::Xb3 => Some(&mut self.xb3),
            _ => None,
        }
    }
}

impl<A: RawAllocator> fmt::Debug for Workspace<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("max_res", &self.config.max_res)
            .field("capacity", &self.sizes.n)
            .field("bytes", &self.total_bytes())
            .finish()
    }
}

#[inline]
fn zeroed<T: Zeroable, A: RawAllocator>(len: usize, alloc: &A) -> WorkspaceResult<ScratchBuffer<T, A>> {
    ScratchBuffer::try_zeroed_in(len, alloc.clone())
}
