use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;

#[tokio::test]
async fn home_shows_a_favorable_verdict_when_the_rate_is_above_the_threshold() {
    let app = TestApp::spawn().await;
    // 2.01 / 17.0 = 0.118
    app.mount_rate(17.0).await;

    let html = app.get_home_html().await;

    assert!(html.contains(r#"<div class="banner green">Good time to buy!</div>"#));
}

#[tokio::test]
async fn home_shows_an_unfavorable_verdict_when_the_rate_is_below_the_threshold() {
    let app = TestApp::spawn().await;
    // 2.01 / 25.0 = 0.0804
    app.mount_rate(25.0).await;

    let html = app.get_home_html().await;

    assert!(html.contains(r#"<div class="banner red">Bad time to buy.</div>"#));
}

#[tokio::test]
async fn home_shows_a_neutral_message_when_the_provider_fails() {
    let app = TestApp::spawn().await;
    app.mount_failing_rate().await;

    let response = app.get("/").await;

    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains(r#"<div class="banner gray">Unable to fetch exchange rate.</div>"#));
}

#[tokio::test]
async fn home_shows_a_neutral_message_when_the_provider_times_out() {
    let app = TestApp::spawn().await;
    app.mount_slow_rate().await;

    let response = app.get("/").await;

    assert_eq!(response.status().as_u16(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains("Unable to fetch exchange rate."));
}

#[tokio::test]
async fn home_never_sends_emails() {
    let app = TestApp::spawn().await;
    app.subscribers.add("ursula_le_guin@gmail.com");
    app.mount_rate(17.0).await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    app.get_home_html().await;
}
