//! HTML index rendering.

use dockboard_core::snapshot::ContainerSnapshot;
use tera::{Context, Tera};

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Renders the index page.
///
/// # Errors
///
/// Returns the template error as text.
pub fn render(
    containers: &[ContainerSnapshot],
    include_stopped: bool,
    generation_enabled: bool,
) -> Result<String, String> {
    let mut context = Context::new();
    context.insert("containers", containers);
    context.insert("include_stopped", &include_stopped);
    context.insert("generation_enabled", &generation_enabled);
    Tera::one_off(INDEX_TEMPLATE, &context, true).map_err(|e| format!("template error: {e}"))
}
