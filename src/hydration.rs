//! Client bootstrap: payload consumption, router hydration and
//! reconciling attach.

pub use server_renderer_hydration::*;
