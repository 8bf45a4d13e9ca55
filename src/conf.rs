//! Layered settings and public environment variables.

pub use server_renderer_conf::*;
