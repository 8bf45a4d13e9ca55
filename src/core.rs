//! Shared view tree, component model and initial-props protocol.
//!
//! # Examples
//!
//! ```
//! use server_renderer::core::{Page, PageComponent};
//!
//! let home = PageComponent::new("Home", |_| Page::element("h1").child("home").into());
//! assert_eq!(home.name(), "Home");
//! ```

pub use server_renderer_core::*;
