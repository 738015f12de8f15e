use serde_json::json;

use crate::common::{TestApp, routes};

async fn create_order(app: &TestApp, token: &str, barcodes: &[&str]) -> i32 {
    let res = app
        .post_with_token(routes::ORDERS, &json!({"barcodes": barcodes}), token)
        .await;
    assert_eq!(res.status, 201, "order creation failed: {}", res.text);
    res.body["order_number"].as_i64().unwrap() as i32
}

#[tokio::test]
async fn order_creation_requires_registered_barcodes() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("ord1", "password123").await;

    app.intake_products(&token, &[("4600000001001", "Cup")]).await;

    let res = app
        .post_with_token(
            routes::ORDERS,
            &json!({"barcodes": ["4600000001001", "4600000009998"]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 404, "{}", res.text);
    assert_eq!(res.body["code"], "NOT_FOUND");

    let number = create_order(&app, &token, &["4600000001001"]).await;
    let res = app.get_with_token(&routes::order(number), &token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "Created");
    assert_eq!(res.body["products"].as_array().unwrap().len(), 1);
    assert_eq!(res.body["products"][0]["accepted"], false);
}

#[tokio::test]
async fn full_acceptance_moves_products_into_the_warehouse() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("ord2", "password123").await;

    app.intake_products(&token, &[("4600000001101", "Pan"), ("4600000001102", "Pot")])
        .await;
    let number = create_order(&app, &token, &["4600000001101", "4600000001102"]).await;

    let res = app
        .post_with_token(&routes::order_accept_start(number), &json!({}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "Assembly");

    for barcode in ["4600000001101", "4600000001102"] {
        let res = app
            .post_with_token(&routes::order_accept_product(number, barcode), &json!({}), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    let res = app
        .post_with_token(&routes::order_accept_end(number), &json!({}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "FullyAccepted");

    // Accepted products are now visible in the public listing.
    let res = app
        .get_without_token(&format!("{}?search=4600000001101", routes::PRODUCTS_CURRENT))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["products"][0]["move_status"], "Accepted");
    assert!(!res.body["products"][0]["income_at"].is_null());
}

#[tokio::test]
async fn partial_acceptance_ends_with_discrepancies() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("ord3", "password123").await;

    app.intake_products(&token, &[("4600000001201", "Fork"), ("4600000001202", "Knife")])
        .await;
    let number = create_order(&app, &token, &["4600000001201", "4600000001202"]).await;

    app.post_with_token(&routes::order_accept_start(number), &json!({}), &token)
        .await;
    app.post_with_token(
        &routes::order_accept_product(number, "4600000001201"),
        &json!({}),
        &token,
    )
    .await;

    let res = app
        .post_with_token(&routes::order_accept_end(number), &json!({}), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "AcceptedWithDiscrepancies");

    let products = res.body["products"].as_array().unwrap();
    let missing: Vec<&str> = products
        .iter()
        .filter(|p| p["accepted"] == false)
        .map(|p| p["barcode"].as_str().unwrap())
        .collect();
    assert_eq!(missing, vec!["4600000001202"]);
}

#[tokio::test]
async fn acceptance_guards_against_out_of_order_calls() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("ord4", "password123").await;

    app.intake_products(&token, &[("4600000001301", "Spoon")]).await;
    let number = create_order(&app, &token, &["4600000001301"]).await;

    // Accepting before assembly starts.
    let res = app
        .post_with_token(
            &routes::order_accept_product(number, "4600000001301"),
            &json!({}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "STATE_CONFLICT");

    app.post_with_token(&routes::order_accept_start(number), &json!({}), &token)
        .await;

    // Double start.
    let res = app
        .post_with_token(&routes::order_accept_start(number), &json!({}), &token)
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "STATE_CONFLICT");

    // Double accept of one line.
    app.post_with_token(
        &routes::order_accept_product(number, "4600000001301"),
        &json!({}),
        &token,
    )
    .await;
    let res = app
        .post_with_token(
            &routes::order_accept_product(number, "4600000001301"),
            &json!({}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "STATE_CONFLICT");

    // A barcode outside the order.
    let res = app
        .post_with_token(
            &routes::order_accept_product(number, "4600000009997"),
            &json!({}),
            &token,
        )
        .await;
    assert_eq!(res.status, 404, "{}", res.text);
}

#[tokio::test]
async fn order_numbers_are_sequential() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("ord5", "password123").await;

    app.intake_products(&token, &[("4600000001401", "Tray")]).await;

    let first = create_order(&app, &token, &["4600000001401"]).await;
    let second = create_order(&app, &token, &["4600000001401"]).await;
    assert_eq!(second, first + 1);
}
