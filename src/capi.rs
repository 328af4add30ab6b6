//! C ABI for the workspace allocator.
//!
//! The consuming comparison code holds a `lga_workspace *` and drives its
//! lifecycle through two calls:
//!
//! ```c
//! lga_workspace *ws = NULL;
//! if (lga_ws_init(&ws) != 0) { /* ws is still NULL */ }
//! /* ... use buffers ... */
//! lga_ws_free(&ws);   /* ws is NULL again; calling it twice is fine */
//! ```
//!
//! All functions follow three rules:
//!
//! 1. Status-returning calls return `0` on success and a negative
//!    [`WorkspaceError::status_code`] otherwise. Failures carry distinct
//!    codes, so test for `!= 0` rather than comparing against `-1`:
//!
//!    | Code | Cause |
//!    |------|-------|
//!    | `-1` | null `pws` ([`WorkspaceError::InvalidArgument`]) |
//!    | `-2` | a buffer could not be allocated ([`WorkspaceError::AllocationFailure`]) |
//!    | `-3` | `max_res` out of range ([`WorkspaceError::Config`]) |
//!    | `-4` | size arithmetic overflow ([`WorkspaceError::Overflow`]) |
//!    | `-99` | [`LGA_ERR_PANIC`] |
//!
//! 2. Panics never cross the boundary; they surface as [`LGA_ERR_PANIC`].
//! 3. Pointer arguments are checked for null before use.

use std::os::raw::c_int;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use crate::config::{WorkspaceConfig, DEFAULT_MAX_RES};
use crate::error::{status_of, WorkspaceError, WorkspaceResult};
use crate::records::{MolCheck, TextLine};
use crate::workspace::{BufferId, Coord, Index, Workspace};

/// Opaque workspace handle as seen from C.
#[allow(non_camel_case_types)]
pub type lga_workspace = Workspace;

/// Success.
pub const LGA_OK: c_int = 0;

/// A panic was caught inside the library.
pub const LGA_ERR_PANIC: c_int = -99;

fn guarded<F>(f: F) -> c_int
where
    F: FnOnce() -> WorkspaceResult<()>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => status_of(&result),
        Err(_) => {
            log::error!("panic caught at C boundary");
            LGA_ERR_PANIC
        }
    }
}

/// Allocates a workspace sized for the default `MAXRES` into `*pws`.
///
/// # Safety
///
/// `pws` must be null or point to a writable `lga_workspace *` that is either
/// null or a handle previously produced by this library.
#[no_mangle]
pub unsafe extern "C" fn lga_ws_init(pws: *mut *mut lga_workspace) -> c_int {
    lga_ws_init_with(pws, DEFAULT_MAX_RES)
}

/// Allocates a workspace sized for `max_res` into `*pws`.
///
/// Returns `0` without allocating if `*pws` is already non-null. On failure
/// `*pws` is left null and nothing stays allocated.
///
/// The handle record is boxed after every buffer succeeds; that final
/// `Box::new` aborts on out-of-memory like any other `Box` allocation.
///
/// # Safety
///
/// Same as [`lga_ws_init`].
#[no_mangle]
pub unsafe extern "C" fn lga_ws_init_with(pws: *mut *mut lga_workspace, max_res: usize) -> c_int {
    guarded(|| {
        if pws.is_null() {
            return Err(WorkspaceError::invalid_argument("pws is null"));
        }
        if !(*pws).is_null() {
            return Ok(());
        }
        let ws = Workspace::new(&WorkspaceConfig::new(max_res))?;
        *pws = Box::into_raw(Box::new(ws));
        Ok(())
    })
}

/// Releases the workspace in `*pws` and sets `*pws` to null.
///
/// A null `pws` or null `*pws` is a no-op.
///
/// # Safety
///
/// `pws` must be null or point to a writable `lga_workspace *` that is either
/// null or a live handle produced by [`lga_ws_init`]. No buffer pointer
/// obtained from the handle may be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn lga_ws_free(pws: *mut *mut lga_workspace) {
    if pws.is_null() || (*pws).is_null() {
        return;
    }
    let ws = Box::from_raw(*pws);
    *pws = ptr::null_mut();
    drop(ws);
}

/// Derived capacity `n = MAXRES + 1`, or 0 for a null handle.
///
/// # Safety
///
/// `ws` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn lga_ws_capacity(ws: *const lga_workspace) -> usize {
    ws.as_ref().map_or(0, Workspace::capacity)
}

/// Integer index buffer `id`; its length is written to `len` if non-null.
///
/// Returns null for a null handle or a non-index buffer id.
///
/// # Safety
///
/// `ws` must be null or a live handle; `len` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lga_ws_index_buffer(
    ws: *mut lga_workspace,
    id: u32,
    len: *mut usize,
) -> *mut Index {
    let buf = ws
        .as_mut()
        .zip(BufferId::from_raw(id))
        .and_then(|(ws, id)| ws.index_buffer_mut(id));
    match buf {
        Some(buf) => {
            write_len(len, buf.len());
            buf.as_mut_ptr()
        }
        None => {
            write_len(len, 0);
            ptr::null_mut()
        }
    }
}

/// Coordinate buffer `id` (`xa3` or `xb3`); its length is written to `len`.
///
/// # Safety
///
/// Same as [`lga_ws_index_buffer`].
#[no_mangle]
pub unsafe extern "C" fn lga_ws_coord_buffer(
    ws: *mut lga_workspace,
    id: u32,
    len: *mut usize,
) -> *mut Coord {
    let buf = ws
        .as_mut()
        .zip(BufferId::from_raw(id))
        .and_then(|(ws, id)| ws.coord_buffer_mut(id));
    match buf {
        Some(buf) => {
            write_len(len, buf.len());
            buf.as_mut_ptr()
        }
        None => {
            write_len(len, 0);
            ptr::null_mut()
        }
    }
}

/// The `mol` table; its length is written to `len`.
///
/// # Safety
///
/// `ws` must be null or a live handle; `len` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lga_ws_mol_table(ws: *mut lga_workspace, len: *mut usize) -> *mut MolCheck {
    match ws.as_mut() {
        Some(ws) => {
            write_len(len, ws.mol.len());
            ws.mol.as_mut_ptr()
        }
        None => {
            write_len(len, 0);
            ptr::null_mut()
        }
    }
}

/// The `straline` table; its length is written to `len`.
///
/// # Safety
///
/// `ws` must be null or a live handle; `len` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn lga_ws_text_lines(ws: *mut lga_workspace, len: *mut usize) -> *mut TextLine {
    match ws.as_mut() {
        Some(ws) => {
            write_len(len, ws.straline.len());
            ws.straline.as_mut_ptr()
        }
        None => {
            write_len(len, 0);
            ptr::null_mut()
        }
    }
}

#[inline]
unsafe fn write_len(len: *mut usize, value: usize) {
    if !len.is_null() {
        *len = value;
    }
}
