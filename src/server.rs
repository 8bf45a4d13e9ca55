//! Hyper-based HTTP adapter.

pub use server_renderer_server::*;
