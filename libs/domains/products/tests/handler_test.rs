//! Handler tests for the products domain
//!
//! Drive the catalog routers end to end over the in-memory store:
//! - status codes and the error envelope
//! - aggregate writes (create, reconcile on update, cascade on delete)
//! - filtered, paginated listings

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain_products::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

fn app() -> Router {
    handlers::router(CatalogService::new(InMemoryCatalogRepository::new()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn product_payload(name: &str, slug: &str, variants: Value) -> Value {
    json!({
        "name": name,
        "slug": slug,
        "description": format!("{name} description"),
        "price": "49.50",
        "variants": variants,
    })
}

async fn create(app: &Router, payload: Value) -> Value {
    let (status, body) = send(app, "POST", "/product", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}

#[tokio::test]
async fn test_trail_runner_leaves_in_stock_listing_when_sold_out() {
    let app = app();

    let (status, _) = send(
        &app,
        "POST",
        "/category",
        Some(json!({ "name": "Shoes", "slug": "shoes" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let product = create(
        &app,
        json!({
            "name": "Trail Runner",
            "slug": "trail-runner",
            "description": "Grippy trail shoe",
            "price": "89.99",
            "category_slug": "shoes",
            "variants": [{ "sku": "TR-001", "stock": 5 }]
        }),
    )
    .await;
    assert_eq!(product["category"]["slug"], "shoes");
    assert_eq!(product["total_stock"], 5);

    let (status, page) = send(&app, "GET", "/product/category/shoes?in_stock=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
    assert_eq!(page["data"][0]["name"], "Trail Runner");

    let id = product["id"].as_str().unwrap();
    let variant_id = product["variants"][0]["id"].clone();
    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/product/{id}"),
        Some(json!({ "variants": [{ "id": variant_id, "sku": "TR-001", "stock": 0 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["variants"][0]["id"], variant_id);
    assert_eq!(updated["total_stock"], 0);

    let (status, page) = send(&app, "GET", "/product/category/shoes?in_stock=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page["data"].as_array().unwrap().is_empty());
    assert_eq!(page["meta"]["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_create_then_get_returns_same_aggregate() {
    let app = app();

    let created = create(
        &app,
        json!({
            "name": "Canvas Tote",
            "slug": "canvas-tote",
            "description": "Everyday bag",
            "price": "19.90",
            "brand": { "name": "Acme" },
            "variants": [
                { "sku": "CT-RED", "color": "red", "stock": 3 },
                { "sku": "CT-BLUE", "color": "blue", "stock": 0, "price_override": "21.00" }
            ],
            "images": [{ "image_url": "https://cdn.example.com/tote.jpg", "alt_text": "Tote" }]
        }),
    )
    .await;

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/product/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    assert_eq!(fetched["name"], "Canvas Tote");
    assert_eq!(fetched["slug"], "canvas-tote");
    assert_eq!(fetched["price"], "19.90");
    assert_eq!(fetched["brand"]["name"], "Acme");
    assert_eq!(fetched["variants"].as_array().unwrap().len(), 2);
    assert_eq!(fetched["images"].as_array().unwrap().len(), 1);
    assert_eq!(fetched["variant_count"], 2);
    assert_eq!(fetched["total_stock"], 3);
    // Variants come back ordered by SKU
    assert_eq!(fetched["variants"][0]["sku"], "CT-BLUE");
}

#[tokio::test]
async fn test_duplicate_slug_is_conflict_and_first_survives() {
    let app = app();
    let first = create(&app, product_payload("Field Jacket", "field-jacket", json!([]))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/product",
        Some(product_payload("Field Jacket II", "field-jacket", json!([]))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "CONFLICT");
    assert_eq!(body["fields"][0]["field"], "slug");

    let id = first["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/product/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Field Jacket");
}

#[tokio::test]
async fn test_sku_taken_by_other_product_is_conflict() {
    let app = app();
    create(
        &app,
        product_payload("Wool Socks", "wool-socks", json!([{ "sku": "WS-01", "stock": 4 }])),
    )
    .await;

    let (status, body) = send(
        &app,
        "POST",
        "/product",
        Some(product_payload(
            "Cotton Socks",
            "cotton-socks",
            json!([{ "sku": "CS-01" }, { "sku": "WS-01" }]),
        )),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["fields"][0]["field"], "sku");

    // Nothing of the rejected product was kept
    let (_, page) = send(&app, "GET", "/product", None).await;
    assert_eq!(page["meta"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_update_reconciles_variants_by_id() {
    let app = app();
    let created = create(
        &app,
        product_payload(
            "Rain Shell",
            "rain-shell",
            json!([
                { "sku": "RS-S", "size": "S", "stock": 1 },
                { "sku": "RS-M", "size": "M", "stock": 2 },
            ]),
        ),
    )
    .await;

    let id = created["id"].as_str().unwrap();
    let kept = created["variants"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["sku"] == "RS-M")
        .unwrap()["id"]
        .clone();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/product/{id}"),
        Some(json!({
            "price": "59.00",
            "variants": [
                { "id": kept, "sku": "RS-M", "size": "M", "stock": 9 },
                { "sku": "RS-L", "size": "L", "stock": 1 }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");

    let variants = updated["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 2);
    assert!(variants.iter().all(|v| v["sku"] != "RS-S"));
    let medium = variants.iter().find(|v| v["sku"] == "RS-M").unwrap();
    assert_eq!(medium["id"], kept);
    assert_eq!(medium["stock"], 9);
    assert_eq!(updated["price"], "59.00");
    assert_eq!(updated["name"], "Rain Shell");
}

#[tokio::test]
async fn test_update_missing_product_is_not_found() {
    let app = app();
    let (status, body) = send(
        &app,
        "PATCH",
        "/product/0190a5c8-0000-7000-8000-000000000000",
        Some(json!({ "price": "1.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_removes_product_and_children() {
    let app = app();
    let created = create(
        &app,
        json!({
            "name": "Beanie",
            "slug": "beanie",
            "description": "Warm hat",
            "price": "15.00",
            "variants": [{ "sku": "BN-01", "stock": 2 }],
            "images": [{ "image_url": "https://cdn.example.com/beanie.jpg" }]
        }),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, ack) = send(&app, "DELETE", &format!("/product/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["message"], "Product deleted successfully");
    assert_eq!(ack["id"], id);

    let (status, _) = send(&app, "GET", &format!("/product/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/product/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The freed SKU can be used again
    create(&app, product_payload("Beanie 2", "beanie-2", json!([{ "sku": "BN-01" }]))).await;
}

#[tokio::test]
async fn test_pagination_over_25_products() {
    let app = app();
    for i in 0..25 {
        create(
            &app,
            product_payload(&format!("Item {i:02}"), &format!("item-{i:02}"), json!([])),
        )
        .await;
    }

    let (status, page) = send(&app, "GET", "/product?page=2&per_page=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 10);
    assert_eq!(page["meta"]["pagination"]["total"], 25);
    assert_eq!(page["meta"]["pagination"]["total_pages"], 3);
    assert_eq!(page["meta"]["pagination"]["page"], 2);

    let (status, page) = send(&app, "GET", "/product?page=3&per_page=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["data"].as_array().unwrap().len(), 5);

    let (status, body) = send(&app, "GET", "/product?per_page=101", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "VALIDATION_ERROR");

    let (status, _) = send(&app, "GET", "/product?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let far = "/product?page=100000000000000000&per_page=100";
    let (status, body) = send(&app, "GET", far, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "page");
}

#[tokio::test]
async fn test_sort_by_price_ascending() {
    let app = app();
    for (slug, price) in [("mid", "20.00"), ("cheap", "5.00"), ("dear", "80.00")] {
        create(
            &app,
            json!({ "name": slug, "slug": slug, "description": "x", "price": price }),
        )
        .await;
    }

    let (_, page) = send(&app, "GET", "/product?sort_by=price&sort_order=asc", None).await;
    let slugs: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["cheap", "mid", "dear"]);
}

#[tokio::test]
async fn test_in_stock_filter_on_brand_listing() {
    let app = app();
    let (status, brand) = send(&app, "POST", "/brand", Some(json!({ "name": "Northwind" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let brand_id = brand["id"].as_str().unwrap();

    for (slug, stock) in [("sold-out", 0), ("available", 2)] {
        create(
            &app,
            json!({
                "name": slug,
                "slug": slug,
                "description": "x",
                "price": "10.00",
                "brand_id": brand_id,
                "variants": [
                    { "sku": format!("{slug}-a"), "stock": stock },
                    { "sku": format!("{slug}-b"), "stock": 0 },
                ]
            }),
        )
        .await;
    }

    let uri = format!("/product/brand/{brand_id}?in_stock=true");
    let (_, page) = send(&app, "GET", &uri, None).await;
    let data = page["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["slug"], "available");

    let (_, page) = send(&app, "GET", &format!("/product/brand/{brand_id}"), None).await;
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_matches_name_or_description_literally() {
    let app = app();
    create(
        &app,
        json!({
            "name": "100% Cotton Tee",
            "slug": "cotton-tee",
            "description": "Soft",
            "price": "12.00",
        }),
    )
    .await;
    create(
        &app,
        json!({
            "name": "1000 Thread Sheets",
            "slug": "sheets",
            "description": "Bedding",
            "price": "60.00",
        }),
    )
    .await;
    create(
        &app,
        json!({
            "name": "Pillow",
            "slug": "pillow",
            "description": "Pairs with SHEETS",
            "price": "20.00",
        }),
    )
    .await;

    let (_, page) = send(&app, "GET", "/product/search?search=100%25", None).await;
    let data = page["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["slug"], "cotton-tee");

    let uri = "/product/search?search=sheets&sort_by=name&sort_order=asc";
    let (_, page) = send(&app, "GET", uri, None).await;
    let slugs: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, ["sheets", "pillow"]);

    let (_, page) = send(&app, "GET", "/product/search", None).await;
    assert_eq!(page["meta"]["pagination"]["total"], 3);
}

#[tokio::test]
async fn test_unknown_category_slug_is_not_found() {
    let app = app();
    let (status, body) = send(&app, "GET", "/product/category/boots", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_brand_id_on_create_is_not_found() {
    let app = app();
    let mut payload = product_payload("Orphan", "orphan", json!([]));
    payload["brand_id"] = json!("0190a5c8-0000-7000-8000-000000000001");

    let (status, body) = send(&app, "POST", "/product", Some(payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("brand"));
}

#[tokio::test]
async fn test_validation_errors_name_each_field() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/product",
        Some(json!({
            "name": "Bad",
            "slug": "Not A Slug",
            "description": "x",
            "price": "-1",
            "variants": [{ "sku": "OK-1" }, { "sku": "", "stock": -2 }]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"slug"));
    assert!(fields.contains(&"price"));
    assert!(fields.contains(&"variants[1].sku"));
    assert!(fields.contains(&"variants[1].stock"));
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let app = app();
    let (status, body) = send(&app, "GET", "/product/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "INVALID_UUID");
}

#[tokio::test]
async fn test_embedded_brand_is_reused_by_name() {
    let app = app();
    let mut first = product_payload("Kettle", "kettle", json!([]));
    first["brand"] = json!({ "name": "Hearth" });
    let mut second = product_payload("Teapot", "teapot", json!([]));
    second["brand"] = json!({ "name": "Hearth", "description": "ignored for existing brands" });

    let a = create(&app, first).await;
    let b = create(&app, second).await;
    assert_eq!(a["brand"]["id"], b["brand"]["id"]);

    let (_, brands) = send(&app, "GET", "/brand", None).await;
    assert_eq!(brands.as_array().unwrap().len(), 1);

    let brand_id = a["brand"]["id"].as_str().unwrap();
    let (status, detail) = send(&app, "GET", &format!("/brand/{brand_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["products"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_category_tree_rejects_cycles() {
    let app = app();
    let (_, apparel) = send(
        &app,
        "POST",
        "/category",
        Some(json!({ "name": "Apparel", "slug": "apparel" })),
    )
    .await;
    let apparel_id = apparel["id"].as_str().unwrap();

    let (status, outerwear) = send(
        &app,
        "POST",
        "/category",
        Some(json!({ "name": "Outerwear", "slug": "outerwear", "parent_id": apparel_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let outerwear_id = outerwear["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/category/{apparel_id}"),
        Some(json!({ "parent_id": outerwear_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"][0]["field"], "parent_id");

    let (status, detail) = send(&app, "GET", &format!("/category/{apparel_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["children"][0]["slug"], "outerwear");
    assert!(detail["parent"].is_null());
}

#[tokio::test]
async fn test_duplicate_category_slug_is_conflict() {
    let app = app();
    send(&app, "POST", "/category", Some(json!({ "name": "Bags", "slug": "bags" }))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/category",
        Some(json!({ "name": "Totes", "slug": "bags" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["fields"][0]["field"], "slug");
}
