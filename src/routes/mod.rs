use std::path::{Component, Path, PathBuf};

use actix_web::HttpResponse;
use log::error;
use tera::{Context, Tera};

pub mod api;
pub mod console;

/// Extension of view templates under the views root.
pub const TEMPLATE_EXTENSION: &str = "html";

/// Renders `template` with `context`. Unknown templates map to 404.
pub fn render_template(tera: &Tera, template: &str, context: &Context) -> HttpResponse {
    match tera.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(e) if matches!(e.kind, tera::ErrorKind::TemplateNotFound(_)) => {
            HttpResponse::NotFound().finish()
        }
        Err(e) => {
            error!("Failed to render template '{template}': {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Converts a request path into a path relative to the views root.
///
/// Returns `None` for anything that could escape the root: parent
/// components, absolute or prefixed paths, backslashes and NUL bytes.
pub fn sanitize_view_path(request_path: &str) -> Option<PathBuf> {
    if request_path.contains('\\') || request_path.contains('\0') {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in Path::new(request_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(segment) => relative.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(relative)
}

/// Template name for a sanitized view path: `""` is `index.html`, paths
/// without the template extension get it appended.
pub fn template_name(view: &Path) -> String {
    if view.as_os_str().is_empty() {
        return format!("index.{TEMPLATE_EXTENSION}");
    }

    let name = view
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/");

    if view.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION) {
        name
    } else {
        format!("{name}.{TEMPLATE_EXTENSION}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_is_rejected() {
        assert_eq!(sanitize_view_path("/../../etc/passwd"), None);
        assert_eq!(sanitize_view_path("users/../../secret"), None);
        assert_eq!(sanitize_view_path("..\\windows"), None);
        assert_eq!(sanitize_view_path("//etc/passwd"), Some(PathBuf::from("etc/passwd")));
    }

    #[test]
    fn plain_paths_are_kept_relative() {
        assert_eq!(sanitize_view_path("/"), Some(PathBuf::new()));
        assert_eq!(
            sanitize_view_path("/admin/./users"),
            Some(PathBuf::from("admin/users"))
        );
    }

    #[test]
    fn template_names() {
        assert_eq!(template_name(Path::new("")), "index.html");
        assert_eq!(template_name(Path::new("admin/users")), "admin/users.html");
        assert_eq!(template_name(Path::new("about.html")), "about.html");
    }
}
