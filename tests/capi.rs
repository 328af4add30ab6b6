//! C ABI tests.
//!
//! Drives the exported functions the way C consumers do: through a
//! `lga_workspace *` slot and raw buffer pointers.
//!
//! Run: cargo test --test capi

#![cfg(feature = "capi")]

use std::ptr;

use ::lga_workspace::capi::{
    lga_workspace, lga_ws_capacity, lga_ws_coord_buffer, lga_ws_free, lga_ws_index_buffer,
    lga_ws_init, lga_ws_init_with, lga_ws_mol_table, lga_ws_text_lines, LGA_OK,
};
use ::lga_workspace::{BufferId, WorkspaceError, DEFAULT_MAX_RES, MAX_RES_LIMIT, TEXT_LINES};

#[test]
fn test_init_default_maxres() {
    let mut ws: *mut lga_workspace = ptr::null_mut();
    unsafe {
        assert_eq!(lga_ws_init(&mut ws), LGA_OK);
        assert_eq!(lga_ws_capacity(ws), DEFAULT_MAX_RES + 1);
        lga_ws_free(&mut ws);
    }
    assert!(ws.is_null());
}

#[test]
fn test_reinit_keeps_handle() {
    let mut ws: *mut lga_workspace = ptr::null_mut();
    unsafe {
        assert_eq!(lga_ws_init_with(&mut ws, 10), LGA_OK);
        let first = ws;

        assert_eq!(lga_ws_init_with(&mut ws, 500), LGA_OK);
        assert_eq!(ws, first, "Re-init replaced the handle");
        assert_eq!(lga_ws_capacity(ws), 11);

        lga_ws_free(&mut ws);
    }
}

#[test]
fn test_double_free_is_safe() {
    let mut ws: *mut lga_workspace = ptr::null_mut();
    unsafe {
        assert_eq!(lga_ws_init_with(&mut ws, 5), LGA_OK);
        lga_ws_free(&mut ws);
        lga_ws_free(&mut ws);
        lga_ws_free(ptr::null_mut());
    }
    assert!(ws.is_null());
}

#[test]
fn test_null_slot_reports_invalid_argument() {
    let status = unsafe { lga_ws_init(ptr::null_mut()) };
    assert_ne!(status, LGA_OK);
    assert_eq!(
        status,
        WorkspaceError::invalid_argument("pws is null").status_code()
    );
}

#[test]
fn test_failed_init_leaves_slot_null() {
    let mut ws: *mut lga_workspace = ptr::null_mut();
    let status = unsafe { lga_ws_init_with(&mut ws, MAX_RES_LIMIT + 1) };
    assert_ne!(status, LGA_OK);
    assert!(ws.is_null());
}

#[test]
fn test_buffer_accessors() {
    let mut ws: *mut lga_workspace = ptr::null_mut();
    unsafe {
        assert_eq!(lga_ws_init_with(&mut ws, 3000), LGA_OK);

        let mut len = 0usize;
        let ind3 = lga_ws_index_buffer(ws, BufferId::Ind3 as u32, &mut len);
        assert!(!ind3.is_null());
        assert_eq!(len, 9003);
        *ind3.add(len - 1) = 77;
        assert_eq!((&(*ws).ind3)[9002], 77);

        let xb3 = lga_ws_coord_buffer(ws, BufferId::Xb3 as u32, &mut len);
        assert!(!xb3.is_null());
        assert_eq!(len, 9003);

        // Wrong element class yields null and a zero length
        let wrong = lga_ws_index_buffer(ws, BufferId::Xa3 as u32, &mut len);
        assert!(wrong.is_null());
        assert_eq!(len, 0);
        assert!(lga_ws_coord_buffer(ws, BufferId::Sup as u32, ptr::null_mut()).is_null());
        assert!(lga_ws_index_buffer(ws, 99, ptr::null_mut()).is_null());

        let mol = lga_ws_mol_table(ws, &mut len);
        assert!(!mol.is_null());
        assert_eq!(len, 2);
        (*mol).atoms = 1234;
        assert_eq!((&(*ws).mol)[0].atoms, 1234);

        let lines = lga_ws_text_lines(ws, &mut len);
        assert!(!lines.is_null());
        assert_eq!(len, TEXT_LINES);

        lga_ws_free(&mut ws);
    }
}

#[test]
fn test_accessors_on_null_handle() {
    let mut len = 1usize;
    unsafe {
        assert!(lga_ws_index_buffer(ptr::null_mut(), 0, &mut len).is_null());
        assert_eq!(len, 0);
        assert!(lga_ws_mol_table(ptr::null_mut(), ptr::null_mut()).is_null());
        assert!(lga_ws_text_lines(ptr::null_mut(), ptr::null_mut()).is_null());
        assert_eq!(lga_ws_capacity(ptr::null()), 0);
    }
}
