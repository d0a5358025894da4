use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use crate::startup::ApplicationBaseUrl;

/// Wrap page content into the site layout
pub fn render_page(title: &str, content: &str) -> String {
    format!(include_str!("layout.html"), title = title, content = content)
}

/// Build an HTML response from page content
pub fn html_page(status: StatusCode, title: &str, content: &str) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(render_page(title, content))
}

pub async fn about() -> HttpResponse {
    html_page(StatusCode::OK, "About", include_str!("about.html"))
}

pub async fn disclaimer() -> HttpResponse {
    html_page(StatusCode::OK, "Disclaimer", include_str!("disclaimer.html"))
}

pub async fn contact() -> HttpResponse {
    html_page(StatusCode::OK, "Contact", include_str!("contact.html"))
}

pub async fn tool() -> HttpResponse {
    html_page(StatusCode::OK, "How it works", include_str!("tool.html"))
}

/// Fallback for unknown routes
pub async fn not_found() -> HttpResponse {
    html_page(
        StatusCode::NOT_FOUND,
        "Page not found",
        include_str!("not_found.html"),
    )
}

pub async fn robots(base_url: web::Data<ApplicationBaseUrl>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(format!(
            "User-agent: *\nDisallow:\n\nSitemap: {}/sitemap.xml\n",
            base_url.0
        ))
}

pub async fn menu_toggle() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/javascript; charset=utf-8")
        .body(include_str!("menu-toggle.js"))
}
