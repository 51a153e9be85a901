//! Integration tests for `StructuredClient` against a local `wiremock`
//! server: outcome classification of listing pages and product pages, and
//! which failures are retried.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfscan_core::CatalogProfile;
use shelfscan_scraper::{BlockReason, CatalogSite, Disguise, FetchOutcome, StructuredClient};

fn test_client(base_url: &str, max_retries: u32) -> StructuredClient {
    let profile = CatalogProfile {
        base_url: base_url.to_owned(),
        ..CatalogProfile::default()
    };
    let site = Arc::new(CatalogSite::from_profile(&profile).expect("valid test catalog"));
    let disguise = Arc::new(
        Disguise::new(profile.user_agents.clone(), base_url, 0, 0).expect("valid disguise"),
    );
    StructuredClient::new(site, disguise, 5, max_retries, 0)
        .expect("failed to build test StructuredClient")
}

fn two_items_json() -> serde_json::Value {
    json!({
        "mods": {
            "listItems": [
                {
                    "name": "Logitech M185 Wireless Mouse",
                    "priceShow": "Rs. 2,499",
                    "originalPrice": "Rs. 3,200",
                    "itemUrl": "//www.daraz.pk/products/logitech-m185-i100.html",
                    "inStock": true
                },
                {
                    "productName": "Generic Optical Mouse",
                    "price": 899,
                    "url": "/products/generic-optical-i200.html",
                    "stock": "Out of stock"
                }
            ]
        }
    })
}

// ---------------------------------------------------------------------------
// Listing pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_returns_found_with_decoded_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .and(query_param("ajax", "true"))
        .and(query_param("q", "wireless mouse"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_items_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let outcome = client.fetch("wireless mouse", 1, None).await;

    let FetchOutcome::Found(items) = outcome else {
        panic!("expected Found, got {outcome:?}");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name.as_deref(), Some("Logitech M185 Wireless Mouse"));
    assert_eq!(items[0].price.as_deref(), Some("Rs. 2,499"));
    assert_eq!(items[1].name.as_deref(), Some("Generic Optical Mouse"));
    assert_eq!(items[1].price.as_deref(), Some("899"));
}

#[tokio::test]
async fn fetch_uses_category_path_when_category_given() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mice/"))
        .and(query_param("page", "2"))
        .and(query_param("q", "mouse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_items_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let outcome = client.fetch("mouse", 2, Some("mice")).await;
    assert!(matches!(outcome, FetchOutcome::Found(_)));
}

#[tokio::test]
async fn fetch_returns_empty_for_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"mods": {"listItems": []}})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    assert!(matches!(
        client.fetch("zzzz no such thing", 1, None).await,
        FetchOutcome::Empty
    ));
}

#[tokio::test]
async fn fetch_reports_challenge_json_as_blocked() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rgv587_flag": "sm",
            "url": "/punish?x5secdata=abc"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let outcome = client.fetch("mouse", 1, None).await;
    assert!(
        matches!(outcome, FetchOutcome::Blocked(BlockReason::Challenge)),
        "got {outcome:?}"
    );
}

#[tokio::test]
async fn fetch_reports_captcha_html_as_blocked() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Please complete the CAPTCHA</body></html>"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    assert!(matches!(
        client.fetch("mouse", 1, None).await,
        FetchOutcome::Blocked(BlockReason::Challenge)
    ));
}

#[tokio::test]
async fn fetch_reports_unrecognised_body_as_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    assert!(matches!(
        client.fetch("mouse", 1, None).await,
        FetchOutcome::Blocked(BlockReason::Malformed(_))
    ));
}

#[tokio::test]
async fn fetch_does_not_retry_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3);
    assert!(matches!(
        client.fetch("mouse", 1, None).await,
        FetchOutcome::Blocked(BlockReason::Status(403))
    ));
}

#[tokio::test]
async fn fetch_retries_server_error_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_items_json()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2);
    assert!(matches!(
        client.fetch("mouse", 1, None).await,
        FetchOutcome::Found(_)
    ));

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn fetch_gives_up_on_rate_limit_after_retry_budget() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2);
    assert!(matches!(
        client.fetch("mouse", 1, None).await,
        FetchOutcome::Blocked(BlockReason::Status(429))
    ));
}

#[tokio::test]
async fn every_request_carries_a_browser_identity() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_items_json()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    client.fetch("mouse", 1, None).await;

    let requests = server.received_requests().await.expect("recording enabled");
    let headers = &requests[0].headers;
    let ua = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(ua.starts_with("Mozilla/5.0"), "unexpected user agent {ua}");
    assert!(headers.get("accept-language").is_some());
    assert!(headers.get("referer").is_some());
}

// ---------------------------------------------------------------------------
// Product pages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_detail_extracts_product_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/mouse-i100.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <h1 class="pdp-title">Logitech M185 Wireless Mouse</h1>
                <span class="pdp-price">Rs. 2,499</span>
                <div class="seller-name">Tech Hub</div>
            </body></html>"#,
        ))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let url = client
        .site()
        .product_url("/products/mouse-i100.html")
        .expect("valid product url");

    let FetchOutcome::Found(detail) = client.fetch_detail(&url).await else {
        panic!("expected Found");
    };
    assert_eq!(detail.title.as_deref(), Some("Logitech M185 Wireless Mouse"));
}

#[tokio::test]
async fn fetch_detail_treats_404_as_missing_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/gone-i1.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3);
    let url = client
        .site()
        .product_url("/products/gone-i1.html")
        .expect("valid product url");
    assert!(matches!(client.fetch_detail(&url).await, FetchOutcome::Empty));
}

#[tokio::test]
async fn fetch_detail_treats_not_found_marker_as_missing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/delisted-i2.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><div class=\"error-page\"><p>This product is no longer available</p></div></body></html>",
        ))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let url = client
        .site()
        .product_url("/products/delisted-i2.html")
        .expect("valid product url");
    assert!(matches!(client.fetch_detail(&url).await, FetchOutcome::Empty));
}

#[tokio::test]
async fn fetch_detail_heading_that_is_a_marker_is_missing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/delisted-i4.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><h1>Page Not Found</h1></body></html>"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let url = client
        .site()
        .product_url("/products/delisted-i4.html")
        .expect("valid product url");
    assert!(matches!(client.fetch_detail(&url).await, FetchOutcome::Empty));
}

#[tokio::test]
async fn fetch_detail_ignores_marker_text_on_a_titled_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/anker-powercore-i42.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <h1 class="pdp-title">Anker PowerCore 10000 Power Bank</h1>
                <span class="pdp-price">Rs. 6,499</span>
                <div class="variant-note">Black: this product is not available</div>
                <script>window.i18n = {"error.404": "Page Not Found"};</script>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2);
    let url = client
        .site()
        .product_url("/products/anker-powercore-i42.html")
        .expect("valid product url");

    let FetchOutcome::Found(detail) = client.fetch_detail(&url).await else {
        panic!("expected Found");
    };
    assert_eq!(
        detail.title.as_deref(),
        Some("Anker PowerCore 10000 Power Bank")
    );
}

#[tokio::test]
async fn fetch_detail_reports_titleless_page_as_blocked() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products/spa-i3.html"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><div id=root></div></body></html>"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let url = client
        .site()
        .product_url("/products/spa-i3.html")
        .expect("valid product url");
    assert!(matches!(
        client.fetch_detail(&url).await,
        FetchOutcome::Blocked(BlockReason::Malformed(_))
    ));
}
