//! Building render options from settings.

use crate::error::ServerError;
use server_renderer_conf::{PublicEnv, Settings};
use server_renderer_core::MountSelector;
use server_renderer_router::RouteTable;
use server_renderer_ssr::{HtmlTemplate, RenderOptions, TemplateError};

/// Loads the template named by `settings` and assembles render options.
///
/// `%KEY%` placeholders are replaced from `env`, the mount point is
/// `settings.container` and `settings.html_attributes` are written on the
/// injected data script.
pub fn render_options(
	settings: &Settings,
	env: &PublicEnv,
	routes: RouteTable,
) -> Result<RenderOptions, ServerError> {
	let selector = MountSelector::parse(&settings.container).map_err(TemplateError::from)?;
	let template = HtmlTemplate::load_interpolated(settings.template_path(), &selector, env.iter())?;

	Ok(RenderOptions::new(routes, template)
		.with_profile(settings.profile)
		.with_script_attributes(
			settings
				.html_attributes
				.iter()
				.map(|(name, value)| (name.clone(), value.clone())),
		))
}

/// [`render_options`] with the public env read from the process and the
/// profile's `.env` file.
pub fn render_options_from_environment(
	settings: &Settings,
	routes: RouteTable,
) -> Result<RenderOptions, ServerError> {
	let env = PublicEnv::from_environment(settings)?;
	render_options(settings, &env, routes)
}
