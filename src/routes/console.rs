//! Console handlers shared by the primary and fallback console servers.

use std::path::{Path, PathBuf};

use actix_files::NamedFile;
use actix_web::{HttpRequest, HttpResponse, web};
use log::error;
use tera::{Context, Tera};

use crate::routes::{TEMPLATE_EXTENSION, render_template, sanitize_view_path, template_name};

/// View rendered for every path by the fallback console.
pub const FALLBACK_VIEW: &str = "index.html";

/// Which views a console serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleMode {
    /// Each request path maps to a view under the views root.
    Primary,
    /// Every request path renders [`FALLBACK_VIEW`].
    Fallback,
}

/// Shared state of a console server.
pub struct ConsoleState {
    pub mode: ConsoleMode,
    pub tera: Tera,
    pub context: Context,
    /// Root of static assets (and, in primary mode, views).
    pub views_dir: PathBuf,
}

impl ConsoleState {
    pub fn new(mode: ConsoleMode, tera: Tera, context: Context, views_dir: PathBuf) -> Self {
        Self {
            mode,
            tera,
            context,
            views_dir,
        }
    }
}

/// Registers the console routes. `/favicon.ico` must stay ahead of the
/// wildcard route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/favicon.ico", web::get().to(favicon))
        .route("/{tail:.*}", web::get().to(show_view));
}

pub async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

pub async fn show_view(req: HttpRequest, state: web::Data<ConsoleState>) -> HttpResponse {
    let tail = req.match_info().query("tail");
    let view = sanitize_view_path(tail);

    if let Some(asset) = view.as_ref().filter(|v| is_static_asset(v)) {
        let path = state.views_dir.join(asset);
        if path.is_file() {
            return match NamedFile::open_async(&path).await {
                Ok(file) => file.into_response(&req),
                Err(e) => {
                    error!("Failed to open asset {}: {e}", path.display());
                    HttpResponse::InternalServerError().finish()
                }
            };
        }
    }

    match state.mode {
        ConsoleMode::Fallback => render_template(&state.tera, FALLBACK_VIEW, &state.context),
        ConsoleMode::Primary => match view {
            Some(view) => render_template(&state.tera, &template_name(&view), &state.context),
            None => HttpResponse::NotFound().finish(),
        },
    }
}

fn is_static_asset(view: &Path) -> bool {
    view.extension().is_some_and(|ext| ext != TEMPLATE_EXTENSION)
}
