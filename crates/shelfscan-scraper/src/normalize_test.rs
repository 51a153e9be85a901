use std::str::FromStr;

use rust_decimal::Decimal;

use super::*;

fn base() -> Url {
    Url::parse("https://www.daraz.pk").unwrap()
}

fn raw(name: &str, price: &str, url: &str) -> RawListing {
    RawListing {
        name: Some(name.to_owned()),
        price: Some(price.to_owned()),
        original_price: None,
        url: Some(url.to_owned()),
        stock: None,
    }
}

// -----------------------------------------------------------------------
// resolve_url
// -----------------------------------------------------------------------

#[test]
fn resolve_url_keeps_absolute() {
    assert_eq!(
        resolve_url("https://www.daraz.pk/products/a-i1.html", &base()).as_deref(),
        Some("https://www.daraz.pk/products/a-i1.html")
    );
}

#[test]
fn resolve_url_protocol_relative_takes_https() {
    assert_eq!(
        resolve_url("//www.daraz.pk/products/a-i1.html?spm=x", &base()).as_deref(),
        Some("https://www.daraz.pk/products/a-i1.html?spm=x")
    );
}

#[test]
fn resolve_url_root_relative_joins_origin() {
    assert_eq!(
        resolve_url("/products/a-i1.html", &base()).as_deref(),
        Some("https://www.daraz.pk/products/a-i1.html")
    );
}

#[test]
fn resolve_url_rejects_non_web_schemes() {
    assert!(resolve_url("javascript:void(0)", &base()).is_none());
    assert!(resolve_url("mailto:help@example.com", &base()).is_none());
    assert!(resolve_url("#reviews", &base()).is_none());
    assert!(resolve_url("   ", &base()).is_none());
}

// -----------------------------------------------------------------------
// normalize_listing
// -----------------------------------------------------------------------

#[test]
fn normalize_listing_maps_all_fields() {
    let mut item = raw("  Wireless   Mouse ", "Rs. 1,299", "//www.daraz.pk/products/m-i9.html");
    item.original_price = Some("Rs. 1,999".to_owned());
    item.stock = Some("true".to_owned());

    let p = normalize_listing(item, FetchMethod::Structured, &base()).unwrap();
    assert_eq!(p.name, "Wireless Mouse");
    assert_eq!(p.price, Some(Decimal::from(1299)));
    assert_eq!(p.original_price, Some(Decimal::from(1999)));
    assert_eq!(p.in_stock, StockStatus::InStock);
    assert_eq!(p.url, "https://www.daraz.pk/products/m-i9.html");
    assert_eq!(p.method, FetchMethod::Structured);
}

#[test]
fn normalize_listing_tolerates_bad_price_and_missing_stock() {
    let item = raw("Mouse", "Call for price", "/products/m-i9.html");
    let p = normalize_listing(item, FetchMethod::Rendered, &base()).unwrap();
    assert!(p.price.is_none());
    assert_eq!(p.in_stock, StockStatus::Unknown);
    assert_eq!(p.method, FetchMethod::Rendered);
}

#[test]
fn normalize_listing_drops_item_without_name() {
    let mut item = raw("", "100", "/products/x.html");
    assert!(normalize_listing(item.clone(), FetchMethod::Structured, &base()).is_none());
    item.name = None;
    assert!(normalize_listing(item, FetchMethod::Structured, &base()).is_none());
}

#[test]
fn normalize_listing_drops_item_without_url() {
    let mut item = raw("Mouse", "100", "");
    item.url = None;
    assert!(normalize_listing(item, FetchMethod::Structured, &base()).is_none());
}

#[test]
fn normalize_listing_caps_name_length() {
    let long = "x".repeat(500);
    let p = normalize_listing(raw(&long, "1", "/p.html"), FetchMethod::Structured, &base())
        .unwrap();
    assert_eq!(p.name.chars().count(), MAX_NAME_CHARS);
}

// -----------------------------------------------------------------------
// normalize_detail
// -----------------------------------------------------------------------

#[test]
fn normalize_detail_parses_fields_and_skips_blank_specs() {
    let detail = normalize_detail(
        RawDetail {
            title: Some(" Logitech  M185 ".to_owned()),
            price: Some("Rs. 2,450".to_owned()),
            rating: Some("4.5/5".to_owned()),
            seller: Some("  Tech Store ".to_owned()),
            specifications: vec!["Wireless".to_owned(), "   ".to_owned(), "2.4 GHz".to_owned()],
        },
        "https://www.daraz.pk/products/m185-i5.html",
        FetchMethod::Structured,
    );
    assert_eq!(detail.title, "Logitech M185");
    assert_eq!(detail.price, Some(Decimal::from_str("2450").unwrap()));
    assert_eq!(detail.rating, Some(4.5));
    assert_eq!(detail.seller.as_deref(), Some("Tech Store"));
    assert_eq!(detail.specifications, vec!["Wireless", "2.4 GHz"]);
}

#[test]
fn normalize_detail_with_nothing_extracted() {
    let detail = normalize_detail(RawDetail::default(), "https://x.test/p", FetchMethod::Rendered);
    assert!(detail.title.is_empty());
    assert!(detail.price.is_none());
    assert!(detail.rating.is_none());
    assert!(detail.seller.is_none());
    assert!(detail.specifications.is_empty());
}
