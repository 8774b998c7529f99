//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `editor` owns the live session and drives the state machines in
//! `debounce`, `render` and `view`. The remaining modules are leaf services
//! (catalogs, storage, export) that routes may also call directly.

pub mod debounce;
pub mod editor;
pub mod export;
pub mod files;
pub mod persistence;
pub mod render;
pub mod templates;
pub mod themes;
pub mod view;
