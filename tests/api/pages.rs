use crate::helpers::TestApp;

#[tokio::test]
async fn static_pages_are_served() {
    let app = TestApp::spawn().await;

    for (page, heading) in [
        ("/about", "<h1>About</h1>"),
        ("/disclaimer", "<h1>Disclaimer</h1>"),
        ("/contact", "<h1>Contact</h1>"),
        ("/tool", "<h1>How it works</h1>"),
    ] {
        let response = app.get(page).await;
        assert_eq!(response.status().as_u16(), 200, "{page} was not served");
        assert!(response.text().await.unwrap().contains(heading));
    }
}

#[tokio::test]
async fn unknown_routes_get_a_404_page() {
    let app = TestApp::spawn().await;

    let response = app.get("/definitely/not/here").await;

    assert_eq!(response.status().as_u16(), 404);
    assert!(response.text().await.unwrap().contains("Page not found"));
}

#[tokio::test]
async fn robots_txt_points_to_the_sitemap() {
    let app = TestApp::spawn().await;

    let response = app.get("/robots.txt").await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let body = response.text().await.unwrap();
    assert!(body.starts_with("User-agent: *"));
    assert!(body.contains("/sitemap.xml"));
}

#[tokio::test]
async fn menu_script_is_served() {
    let app = TestApp::spawn().await;

    let response = app.get("/menu-toggle.js").await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/javascript"));
    assert!(response.text().await.unwrap().contains("menu-toggle"));
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = TestApp::spawn().await;

    for page in ["/about", "/not-a-page"] {
        let response = app.get(page).await;
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
        assert!(headers.contains_key("content-security-policy"));
    }
}
