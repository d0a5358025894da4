use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};

use crate::alert_cycle::AlertCycle;
use crate::routes::render_page;

/// Severity of the feedback shown after a form submission
#[derive(Clone, Copy, Debug)]
pub enum NoticeKind {
    Success,
    Warning,
    Danger,
}

impl NoticeKind {
    const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "notice-success",
            Self::Warning => "notice-warning",
            Self::Danger => "notice-danger",
        }
    }
}

/// Feedback shown below the banner
#[derive(Clone, Copy, Debug)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: &'static str,
}

/// Render the landing page with a colored banner and an optional notice
pub fn home_page(
    status: StatusCode,
    banner_text: &str,
    banner_color: &str,
    notice: Option<Notice>,
) -> HttpResponse {
    let notice_html = notice.map_or_else(String::new, |n| {
        format!(
            r#"<div class="notice {}" role="alert">{}</div>"#,
            n.kind.css_class(),
            n.text
        )
    });
    let content = format!(
        include_str!("home.html"),
        banner_color = banner_color,
        banner_text = banner_text,
        notice = notice_html
    );
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(render_page("BZ ↔ MX Exchange Rate Alert", &content))
}

/// Home handler: show the verdict on the current exchange rate
pub async fn home(cycle: web::Data<AlertCycle>) -> HttpResponse {
    let message = cycle.current_message().await;
    tracing::info!(
        classification = %message.classification(),
        "Exchange rate message: {}", message.text()
    );
    home_page(StatusCode::OK, message.text(), message.color(), None)
}
