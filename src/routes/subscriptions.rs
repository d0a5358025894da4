use actix_web::error::{InternalError, UrlencodedError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::domain::{AlertMessage, EmailAddress};
use crate::routes::{home_page, Notice, NoticeKind};
use crate::subscriber_store::{StoreError, SubscriberStore};

/// Web form data
#[derive(serde::Deserialize)]
pub struct FormData {
    // A missing field is reported like an invalid address
    #[serde(default)]
    email: String,
}

/// Render the landing page without a rate, showing only `notice`
fn notice_page(status: StatusCode, kind: NoticeKind, text: &'static str) -> HttpResponse {
    let unknown = AlertMessage::unknown();
    home_page(
        status,
        unknown.text(),
        unknown.color(),
        Some(Notice { kind, text }),
    )
}

fn invalid_email() -> HttpResponse {
    notice_page(
        StatusCode::BAD_REQUEST,
        NoticeKind::Danger,
        "Invalid email format",
    )
}

/// Answer an undecodable form body with the landing page instead of a bare error
pub fn form_error_handler(err: UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(error.message = %err, "Rejected undecodable subscription form");
    InternalError::from_response(err, invalid_email()).into()
}

/// Subscribe handler
#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(form, subscribers),
    fields(subscriber_email = %form.email)
)]
pub async fn subscribe(
    form: web::Form<FormData>,
    subscribers: web::Data<dyn SubscriberStore>,
) -> HttpResponse {
    let Ok(email) = EmailAddress::parse(form.0.email) else {
        return invalid_email();
    };

    match subscribers.insert(&email).await {
        Ok(()) => {
            tracing::info!("Email {email} subscribed successfully");
            home_page(
                StatusCode::OK,
                "Subscribed successfully!",
                "green",
                Some(Notice {
                    kind: NoticeKind::Success,
                    text: "You have successfully subscribed!",
                }),
            )
        }
        Err(StoreError::AlreadySubscribed(_)) => notice_page(
            StatusCode::CONFLICT,
            NoticeKind::Warning,
            "This email is already subscribed.",
        ),
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to save new subscriber"
            );
            notice_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                NoticeKind::Danger,
                "Error inserting email into the database.",
            )
        }
    }
}

/// Unsubscribe handler
#[tracing::instrument(
    name = "Removing a subscriber",
    skip(form, subscribers),
    fields(subscriber_email = %form.email)
)]
pub async fn unsubscribe(
    form: web::Form<FormData>,
    subscribers: web::Data<dyn SubscriberStore>,
) -> HttpResponse {
    let Ok(email) = EmailAddress::parse(form.0.email) else {
        return invalid_email();
    };

    match subscribers.delete(&email).await {
        Ok(true) => {
            tracing::info!("Email {email} unsubscribed successfully");
            home_page(
                StatusCode::OK,
                "Subscription removed!",
                "green",
                Some(Notice {
                    kind: NoticeKind::Success,
                    text: "You have successfully unsubscribed.",
                }),
            )
        }
        Ok(false) => notice_page(
            StatusCode::OK,
            NoticeKind::Warning,
            "Email not found in the subscription list.",
        ),
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to remove subscriber"
            );
            notice_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                NoticeKind::Danger,
                "Error removing email from the database.",
            )
        }
    }
}
