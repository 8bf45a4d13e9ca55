//! Shared building blocks for server-renderer.
//!
//! Everything in this crate compiles for both the server (native) and the
//! browser (`wasm32`). Server rendering and hydration must agree on the
//! component tree byte for byte, so both sides render through the same
//! [`Page`] type and the same [`PageComponent`] declarations.
//!
//! ## Modules
//!
//! - [`view`]: the [`Page`] view tree and its HTML serializer
//! - [`location`]: the router's [`Location`] value
//! - [`component`]: page components and the explicit [`RenderContext`]
//! - [`props`]: the initial-props protocol (loader contract and capture)
//! - [`response`]: the server-side [`ResponseHandle`] exposed to loaders
//! - [`data`]: [`GlobalAppData`] and the embedded data slot encoding
//! - [`selector`]: the simple CSS selector used to find the mount point
//! - [`profile`]: development/production build profile
//! - [`platform`]: task spawning and `Send` shims for native and wasm targets

#![warn(missing_docs)]

pub mod component;
pub mod data;
pub mod location;
pub mod platform;
pub mod profile;
pub mod props;
pub mod response;
pub mod selector;
pub mod view;

pub use component::{PageComponent, RenderContext, RenderFn};
pub use data::{APP_DATA_GLOBAL, AppDataError, GlobalAppData, SerializedError};
pub use location::Location;
pub use platform::{MaybeSend, MaybeSync, spawn};
pub use profile::BuildProfile;
pub use props::{
	InitialPropsLoader, LoaderContext, LoaderError, PageProps, PropsOutcome, ProtocolError,
	empty_props, loader_fn, resolve_initial_props,
};
pub use response::{ResponseError, ResponseHandle, ResponseSnapshot};
pub use selector::{MountSelector, SelectorError};
pub use view::{ElementView, IntoPage, Page, escape_html};
