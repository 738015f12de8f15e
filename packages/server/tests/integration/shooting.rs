use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn draft_membership_requires_warehouse_presence() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("sh_stock1", "password123").await;
    let phot = app
        .create_user_with_role("sh_phot1", "password123", "photographer")
        .await;

    app.stocked_product(&stockman, "4600000002001", "Mug", None).await;
    app.intake_products(&stockman, &[("4600000002002", "Not received")])
        .await;

    let res = app
        .post_with_token(routes::SHOOTING, &json!({"barcodes": ["4600000002001"]}), &phot)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["status"], "Draft");
    let number = res.body["request_number"].as_i64().unwrap() as i32;

    // NotReceived products cannot be attached.
    let res = app
        .post_with_token(
            &routes::shooting_barcode(number, "4600000002002"),
            &json!({}),
            &phot,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "STATE_CONFLICT");

    // Duplicates are rejected.
    let res = app
        .post_with_token(
            &routes::shooting_barcode(number, "4600000002001"),
            &json!({}),
            &phot,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);

    // Detaching works while the request is a draft.
    let res = app
        .delete_with_token(&routes::shooting_barcode(number, "4600000002001"), &phot)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(res.body["products"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn request_type_follows_the_category_majority() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("sh_stock2", "password123").await;
    let phot = app
        .create_user_with_role("sh_phot2", "password123", "photographer")
        .await;

    let tabletop = app.create_category("tabletop", Some(1)).await;
    let model_shot = app.create_category("model", Some(2)).await;
    let untyped = app.create_category("untyped", None).await;

    app.stocked_product(&stockman, "4600000002101", "Cup", Some(tabletop)).await;
    app.stocked_product(&stockman, "4600000002102", "Plate", Some(tabletop)).await;
    app.stocked_product(&stockman, "4600000002103", "Dress", Some(model_shot)).await;
    app.stocked_product(&stockman, "4600000002104", "Mystery", Some(untyped)).await;

    let res = app
        .post_with_token(
            routes::SHOOTING,
            &json!({"barcodes": ["4600000002101", "4600000002103", "4600000002104"]}),
            &phot,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let number = res.body["request_number"].as_i64().unwrap() as i32;
    // One vote each for types 1 and 2 (nulls dropped); the tie
    // resolves to the lowest id.
    assert_eq!(res.body["request_type"], 1);

    // A second tabletop product breaks the tie the same way.
    let res = app
        .post_with_token(
            &routes::shooting_barcode(number, "4600000002102"),
            &json!({}),
            &phot,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["request_type"], 1);

    // Removing both tabletop products flips the majority.
    for barcode in ["4600000002101", "4600000002102"] {
        let res = app
            .delete_with_token(&routes::shooting_barcode(number, barcode), &phot)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
    }
    let res = app.get_with_token(&routes::shooting(number), &phot).await;
    assert_eq!(res.body["request_type"], 2);
}

#[tokio::test]
async fn type_override_locks_until_cleared() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("sh_stock3", "password123").await;
    let phot = app
        .create_user_with_role("sh_phot3", "password123", "photographer")
        .await;

    let tabletop = app.create_category("tabletop3", Some(1)).await;
    app.stocked_product(&stockman, "4600000002201", "Bowl", Some(tabletop)).await;

    let res = app
        .post_with_token(routes::SHOOTING, &json!({"barcodes": ["4600000002201"]}), &phot)
        .await;
    let number = res.body["request_number"].as_i64().unwrap() as i32;
    assert_eq!(res.body["request_type"], 1);

    let res = app
        .post_with_token(&routes::shooting_type(number), &json!({"request_type": 7}), &phot)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["request_type"], 7);
    assert_eq!(res.body["type_locked"], true);

    // Membership edits no longer touch the type while locked.
    app.stocked_product(&stockman, "4600000002202", "Saucer", Some(tabletop)).await;
    let res = app
        .post_with_token(
            &routes::shooting_barcode(number, "4600000002202"),
            &json!({}),
            &phot,
        )
        .await;
    assert_eq!(res.body["request_type"], 7);

    // Clearing the lock recomputes from the members again.
    let res = app
        .delete_with_token(&routes::shooting_type_lock(number), &phot)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["request_type"], 1);
    assert_eq!(res.body["type_locked"], false);
}

#[tokio::test]
async fn shooting_flow_rolls_request_to_pending_check() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("sh_stock4", "password123").await;
    let phot = app
        .create_user_with_role("sh_phot4", "password123", "photographer")
        .await;
    let senior = app
        .create_user_with_role("sh_senior4", "password123", "senior_retoucher")
        .await;

    app.stocked_product(&stockman, "4600000002301", "Jacket", None).await;
    app.stocked_product(&stockman, "4600000002302", "Scarf", None).await;

    let res = app
        .post_with_token(
            routes::SHOOTING,
            &json!({"barcodes": ["4600000002301", "4600000002302"]}),
            &phot,
        )
        .await;
    let number = res.body["request_number"].as_i64().unwrap() as i32;

    // Finishing without a session in progress is rejected.
    let res = app
        .post_with_token(
            &routes::shooting_result(number, "4600000002301"),
            &json!({"photo_status": "Done", "photo_folder": "shots/2301"}),
            &phot,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "STATE_CONFLICT");

    let res = app
        .post_with_token(&routes::shooting_start(number, "4600000002301"), &json!({}), &phot)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["photo_status"], "InShooting");

    // Done without a folder is a validation error.
    let res = app
        .post_with_token(
            &routes::shooting_result(number, "4600000002301"),
            &json!({"photo_status": "Done"}),
            &phot,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app
        .post_with_token(
            &routes::shooting_result(number, "4600000002301"),
            &json!({"photo_status": "Done", "photo_folder": "shots/2301"}),
            &phot,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["photo_status"], "Done");

    // One member still pending, so the request stays InShooting.
    let res = app.get_with_token(&routes::shooting(number), &phot).await;
    assert_eq!(res.body["status"], "InShooting");
    assert_eq!(res.body["photographer_id"], app.user_id("sh_phot4").await);

    app.post_with_token(&routes::shooting_start(number, "4600000002302"), &json!({}), &phot)
        .await;
    let res = app
        .post_with_token(
            &routes::shooting_result(number, "4600000002302"),
            &json!({"photo_status": "Defect"}),
            &phot,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get_with_token(&routes::shooting(number), &phot).await;
    assert_eq!(res.body["status"], "PendingCheck");

    // Senior verdicts only apply to Done members.
    let res = app
        .patch_with_token(
            &routes::shooting_photo_check(number, "4600000002302"),
            &json!({"accepted": true}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);

    let res = app
        .patch_with_token(
            &routes::shooting_photo_check(number, "4600000002301"),
            &json!({"accepted": true}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["senior_photo_status"], "Accepted");
}

#[tokio::test]
async fn photographers_cannot_record_senior_verdicts() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("sh_stock5", "password123").await;
    let phot = app
        .create_user_with_role("sh_phot5", "password123", "photographer")
        .await;

    app.stocked_product(&stockman, "4600000002401", "Belt", None).await;
    let res = app
        .post_with_token(routes::SHOOTING, &json!({"barcodes": ["4600000002401"]}), &phot)
        .await;
    let number = res.body["request_number"].as_i64().unwrap() as i32;

    let res = app
        .patch_with_token(
            &routes::shooting_photo_check(number, "4600000002401"),
            &json!({"accepted": true}),
            &phot,
        )
        .await;
    assert_eq!(res.status, 403, "{}", res.text);
}

#[tokio::test]
async fn list_requests_filters_by_status() {
    let app = TestApp::spawn().await;
    let phot = app
        .create_user_with_role("sh_phot6", "password123", "photographer")
        .await;

    for _ in 0..2 {
        let res = app
            .post_with_token(routes::SHOOTING, &json!({"barcodes": []}), &phot)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let res = app
        .get_with_token(&format!("{}?status=Draft", routes::SHOOTING), &phot)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination"]["total"], 2);

    let res = app
        .get_with_token(&format!("{}?status=Checked", routes::SHOOTING), &phot)
        .await;
    assert_eq!(res.body["pagination"]["total"], 0);

    let res = app
        .get_with_token(&format!("{}?status=Bogus", routes::SHOOTING), &phot)
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
}
