//! Purpose: Library crate behind `libtweetbridge` and the `x-login` utility.
//! Exports: `abi` (C symbols), `api` (public Rust surface), `core`, `dispatch`.
//! Role: One process-wide scraping session driven through a C ABI with JSON envelopes.
//! Invariants: Every boundary result is `{"Ok": ...}` or `{"Err": "..."}`.
//! Invariants: Core modules take explicit inputs; only `abi` holds global state.
pub mod abi;
pub mod api;
pub mod core;
pub mod dispatch;
pub(crate) mod json;
