//! Route table, path matcher and client router.
//!
//! The same [`RouteTable`] drives server rendering and client navigation.

pub use server_renderer_router::*;
