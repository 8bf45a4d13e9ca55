//! Request-time rendering into an HTML template.

pub use server_renderer_ssr::*;
