use ::common::MoveStatus;
use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn intake_creates_and_skips_known_barcodes() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("stock1", "password123").await;

    let res = app
        .post_with_token(
            routes::PRODUCTS,
            &json!({"products": [
                {"barcode": "4600000000101", "name": "Mug"},
                {"barcode": "4600000000102", "name": "Plate", "seller": "HomeGoods"},
            ]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["created"], 2);
    assert!(res.body["skipped"].as_array().unwrap().is_empty());

    // Re-announcing the same barcode is not an error, just a skip.
    let res = app
        .post_with_token(
            routes::PRODUCTS,
            &json!({"products": [
                {"barcode": "4600000000101", "name": "Mug again"},
                {"barcode": "4600000000103", "name": "Bowl"},
            ]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["created"], 1);
    assert_eq!(res.body["skipped"], json!(["4600000000101"]));

    // Intake is audited.
    let res = app
        .get_with_token(&routes::product_operations("4600000000103"), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let ops = res.body.as_array().unwrap();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0]["operation_type"], "Intake");
}

#[tokio::test]
async fn intake_rejects_bad_barcode() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("stock2", "password123").await;

    let res = app
        .post_with_token(
            routes::PRODUCTS,
            &json!({"products": [{"barcode": "has space", "name": "Bad"}]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn current_products_is_public_and_hides_unreceived() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("stock3", "password123").await;

    app.intake_products(&token, &[("4600000000201", "Kettle"), ("4600000000202", "Toaster")])
        .await;

    // Freshly announced products are NotReceived and invisible.
    let res = app.get_without_token(routes::PRODUCTS_CURRENT).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 0);

    app.set_move_status("4600000000201", MoveStatus::Accepted)
        .await;

    let res = app.get_without_token(routes::PRODUCTS_CURRENT).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 1);
    assert_eq!(res.body["products"][0]["barcode"], "4600000000201");

    // Search narrows by barcode or name.
    let res = app
        .get_without_token(&format!("{}?search=Kettle", routes::PRODUCTS_CURRENT))
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 1);
}

#[tokio::test]
async fn defect_marking_requires_warehouse_presence() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("stock4", "password123").await;

    app.intake_products(&token, &[("4600000000301", "Vase")]).await;

    // NotReceived products cannot be marked defective.
    let res = app
        .post_with_token(
            &routes::product_defect("4600000000301"),
            &json!({"comment": "cracked"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "STATE_CONFLICT");

    app.set_move_status("4600000000301", MoveStatus::Accepted)
        .await;

    let res = app
        .post_with_token(
            &routes::product_defect("4600000000301"),
            &json!({"comment": "cracked"}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["move_status"], "Defect");
}

#[tokio::test]
async fn repeated_defects_keep_working_past_the_alert_threshold() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("stock5", "password123").await;

    app.intake_products(&token, &[("4600000000401", "Lamp")]).await;

    // The one-shot alert fires at the third marking; with MQ disabled
    // the marking itself must stay unaffected, at three and beyond.
    for round in 1..=4 {
        app.set_move_status("4600000000401", MoveStatus::Accepted)
            .await;
        let res = app
            .post_with_token(
                &routes::product_defect("4600000000401"),
                &json!({"comment": format!("defect {round}")}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "round {round}: {}", res.text);
    }

    let res = app
        .get_with_token(&routes::product_operations("4600000000401"), &token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let defect_ops = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .filter(|op| op["operation_type"] == "DefectMarked")
        .count();
    assert_eq!(defect_ops, 4);
}

#[tokio::test]
async fn get_product_returns_404_for_unknown_barcode() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("stock6", "password123").await;

    let res = app.get_with_token(&routes::product("4600000009999"), &token).await;
    assert_eq!(res.status, 404, "{}", res.text);
    assert_eq!(res.body["code"], "NOT_FOUND");
}
