use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;

use server::entity::retouch_request;

use crate::common::{TestApp, routes};

/// Run the whole shooting pipeline for a set of fresh barcodes and
/// return the shooting member line ids, ready for retouch assignment.
pub(crate) async fn shot_members(
    app: &TestApp,
    stockman: &str,
    phot: &str,
    barcodes: &[&str],
) -> (i32, Vec<i32>) {
    for barcode in barcodes {
        app.stocked_product(stockman, barcode, "Fixture", None).await;
    }

    let res = app
        .post_with_token(routes::SHOOTING, &json!({"barcodes": barcodes}), phot)
        .await;
    assert_eq!(res.status, 201, "shooting request failed: {}", res.text);
    let number = res.body["request_number"].as_i64().unwrap() as i32;

    for barcode in barcodes {
        let res = app
            .post_with_token(&routes::shooting_start(number, barcode), &json!({}), phot)
            .await;
        assert_eq!(res.status, 200, "start failed: {}", res.text);
        let res = app
            .post_with_token(
                &routes::shooting_result(number, barcode),
                &json!({"photo_status": "Done", "photo_folder": format!("shots/{barcode}")}),
                phot,
            )
            .await;
        assert_eq!(res.status, 200, "result failed: {}", res.text);
    }

    let res = app.get_with_token(&routes::shooting(number), phot).await;
    let ids = res.body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap() as i32)
        .collect();
    (number, ids)
}

#[tokio::test]
async fn assignment_is_all_or_nothing() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("rt_stock1", "password123").await;
    let phot = app
        .create_user_with_role("rt_phot1", "password123", "photographer")
        .await;
    let senior = app
        .create_user_with_role("rt_senior1", "password123", "senior_retoucher")
        .await;
    app.create_user_with_role("rt_ret1", "password123", "retoucher")
        .await;
    let retoucher_id = app.user_id("rt_ret1").await;

    let (shooting_number, ids) = shot_members(
        &app,
        &stockman,
        &phot,
        &["4600000003001", "4600000003002", "4600000003003"],
    )
    .await;

    let res = app
        .post_with_token(
            routes::RETOUCH,
            &json!({"st_request_product_ids": [ids[0], ids[1]], "retoucher_id": retoucher_id}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["status"], 2);
    assert_eq!(res.body["retoucher_id"], retoucher_id);
    assert_eq!(res.body["products"].as_array().unwrap().len(), 2);

    // One taken product poisons the whole batch; the clean one must
    // not be flagged as a side effect.
    let res = app
        .post_with_token(
            routes::RETOUCH,
            &json!({"st_request_product_ids": [ids[1], ids[2]], "retoucher_id": retoucher_id}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "STATE_CONFLICT");
    assert!(res.body["message"]
        .as_str()
        .unwrap()
        .contains("1 of 2 products are already on retouch"));

    let res = app.get_with_token(&routes::shooting(shooting_number), &senior).await;
    let on_retouch: Vec<bool> = res.body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["on_retouch"].as_bool().unwrap())
        .collect();
    assert_eq!(on_retouch, vec![true, true, false]);

    // The untouched product is still assignable on its own.
    let res = app
        .post_with_token(
            routes::RETOUCH,
            &json!({"st_request_product_ids": [ids[2]], "retoucher_id": retoucher_id}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
}

#[tokio::test]
async fn completion_requires_every_line_verified() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("rt_stock2", "password123").await;
    let phot = app
        .create_user_with_role("rt_phot2", "password123", "photographer")
        .await;
    let senior = app
        .create_user_with_role("rt_senior2", "password123", "senior_retoucher")
        .await;
    let retoucher = app
        .create_user_with_role("rt_ret2", "password123", "retoucher")
        .await;
    let retoucher_id = app.user_id("rt_ret2").await;

    let (_, ids) = shot_members(&app, &stockman, &phot, &["4600000003101", "4600000003102"]).await;

    let res = app
        .post_with_token(
            routes::RETOUCH,
            &json!({"st_request_product_ids": ids, "retoucher_id": retoucher_id}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let number = res.body["request_number"].as_i64().unwrap() as i32;
    let line_ids: Vec<i32> = res.body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap() as i32)
        .collect();

    // Ready-for-review without a link is rejected.
    let res = app
        .patch_with_token(
            routes::RETOUCH_RESULTS,
            &json!({"retouch_request_product_id": line_ids[0], "retouch_status": 2}),
            &retoucher,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app
        .patch_with_token(
            routes::RETOUCH_RESULTS,
            &json!({
                "retouch_request_product_id": line_ids[0],
                "retouch_status": 2,
                "retouch_link": "https://cloud.example/batch/1",
            }),
            &retoucher,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    // One line still InWork, the request stays InProgress.
    assert_eq!(res.body["status"], 2);

    let res = app
        .patch_with_token(
            routes::RETOUCH_RESULTS,
            &json!({"retouch_request_product_id": line_ids[1], "retouch_status": 3}),
            &retoucher,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    // Every line submitted: the batch rolls to OnReview.
    assert_eq!(res.body["status"], 3);

    // Closing before any verdicts: both lines unverified.
    let res = app
        .patch_with_token(&routes::retouch_update_status(number, 5), &json!({}), &senior)
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert!(res.body["message"]
        .as_str()
        .unwrap()
        .contains("2 of 2 products are not verified"));

    let res = app
        .patch_with_token(
            &routes::retouch_review(number, line_ids[0]),
            &json!({"senior_retouch_status": 1}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app
        .patch_with_token(&routes::retouch_update_status(number, 5), &json!({}), &senior)
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert!(res.body["message"]
        .as_str()
        .unwrap()
        .contains("1 of 2 products are not verified"));

    app.patch_with_token(
        &routes::retouch_review(number, line_ids[1]),
        &json!({"senior_retouch_status": 1}),
        &senior,
    )
    .await;

    // Only Rework (4) and Completed (5) are valid targets.
    let res = app
        .patch_with_token(&routes::retouch_update_status(number, 2), &json!({}), &senior)
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");

    let res = app
        .patch_with_token(&routes::retouch_update_status(number, 5), &json!({}), &senior)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], 5);
    assert!(!res.body["completed_at"].is_null());

    // Completed requests are frozen.
    let res = app
        .patch_with_token(
            routes::RETOUCH_RESULTS,
            &json!({"retouch_request_product_id": line_ids[0], "retouch_status": 3}),
            &retoucher,
        )
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["code"], "STATE_CONFLICT");
}

#[tokio::test]
async fn reassignment_discards_review_progress_only() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("rt_stock3", "password123").await;
    let phot = app
        .create_user_with_role("rt_phot3", "password123", "photographer")
        .await;
    let senior = app
        .create_user_with_role("rt_senior3", "password123", "senior_retoucher")
        .await;
    let retoucher = app
        .create_user_with_role("rt_ret3a", "password123", "retoucher")
        .await;
    app.create_user_with_role("rt_ret3b", "password123", "retoucher")
        .await;
    let first_id = app.user_id("rt_ret3a").await;
    let second_id = app.user_id("rt_ret3b").await;

    let (_, ids) = shot_members(&app, &stockman, &phot, &["4600000003201", "4600000003202"]).await;

    let res = app
        .post_with_token(
            routes::RETOUCH,
            &json!({"st_request_product_ids": ids, "retoucher_id": first_id}),
            &senior,
        )
        .await;
    let number = res.body["request_number"].as_i64().unwrap() as i32;
    let line_ids: Vec<i32> = res.body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap() as i32)
        .collect();

    for line_id in &line_ids {
        app.patch_with_token(
            routes::RETOUCH_RESULTS,
            &json!({
                "retouch_request_product_id": line_id,
                "retouch_status": 2,
                "retouch_link": "https://cloud.example/batch/2",
            }),
            &retoucher,
        )
        .await;
    }
    let res = app
        .patch_with_token(
            &routes::retouch_review(number, line_ids[0]),
            &json!({"senior_retouch_status": 2, "comment": "halo on the left edge"}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    // Rework notifies and keeps the request editable.
    let res = app
        .patch_with_token(&routes::retouch_update_status(number, 4), &json!({}), &senior)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], 4);

    let res = app
        .post_with_token(
            &routes::retouch_reassign(number),
            &json!({"retoucher_id": second_id}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], 2);
    assert_eq!(res.body["retoucher_id"], second_id);

    for product in res.body["products"].as_array().unwrap() {
        // Review progress is wiped, retouch work is kept.
        assert!(product["senior_retouch_status"].is_null());
        assert!(product["comment"].is_null());
        assert!(product["checked_at"].is_null());
        assert_eq!(product["retouch_status"], 2);
        assert_eq!(product["retouch_link"], "https://cloud.example/batch/2");
    }
}

#[tokio::test]
async fn retouchers_only_see_and_touch_their_own_requests() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("rt_stock4", "password123").await;
    let phot = app
        .create_user_with_role("rt_phot4", "password123", "photographer")
        .await;
    let senior = app
        .create_user_with_role("rt_senior4", "password123", "senior_retoucher")
        .await;
    let owner = app
        .create_user_with_role("rt_ret4a", "password123", "retoucher")
        .await;
    let outsider = app
        .create_user_with_role("rt_ret4b", "password123", "retoucher")
        .await;
    let owner_id = app.user_id("rt_ret4a").await;

    let (_, ids) = shot_members(&app, &stockman, &phot, &["4600000003301"]).await;

    let res = app
        .post_with_token(
            routes::RETOUCH,
            &json!({"st_request_product_ids": ids, "retoucher_id": owner_id}),
            &senior,
        )
        .await;
    let number = res.body["request_number"].as_i64().unwrap() as i32;
    let line_id = res.body["products"][0]["id"].as_i64().unwrap() as i32;

    let res = app.get_with_token(&routes::retouch(number), &owner).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get_with_token(&routes::retouch(number), &outsider).await;
    assert_eq!(res.status, 403, "{}", res.text);

    let res = app
        .patch_with_token(
            routes::RETOUCH_RESULTS,
            &json!({"retouch_request_product_id": line_id, "retouch_status": 3}),
            &outsider,
        )
        .await;
    assert_eq!(res.status, 403, "{}", res.text);

    // Listing shows owners their own work and seniors everything.
    let res = app.get_with_token(routes::RETOUCH, &owner).await;
    assert_eq!(res.body["pagination"]["total"], 1);
    let res = app.get_with_token(routes::RETOUCH, &outsider).await;
    assert_eq!(res.body["pagination"]["total"], 0);
    let res = app.get_with_token(routes::RETOUCH, &senior).await;
    assert_eq!(res.body["pagination"]["total"], 1);
}

#[tokio::test]
async fn download_reuses_finished_archives() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("rt_stock5", "password123").await;
    let phot = app
        .create_user_with_role("rt_phot5", "password123", "photographer")
        .await;
    let senior = app
        .create_user_with_role("rt_senior5", "password123", "senior_retoucher")
        .await;
    app.create_user_with_role("rt_ret5", "password123", "retoucher")
        .await;
    let retoucher_id = app.user_id("rt_ret5").await;

    let (_, ids) = shot_members(&app, &stockman, &phot, &["4600000003401"]).await;

    let res = app
        .post_with_token(
            routes::RETOUCH,
            &json!({"st_request_product_ids": ids, "retoucher_id": retoucher_id}),
            &senior,
        )
        .await;
    let number = res.body["request_number"].as_i64().unwrap() as i32;

    // MQ is disabled in tests, so no build was scheduled at creation
    // and the endpoint can only report in_progress.
    let res = app
        .post_with_token(&routes::retouch_download(number), &json!({}), &senior)
        .await;
    assert_eq!(res.status, 202, "{}", res.text);
    assert_eq!(res.body["status"], "in_progress");

    // A build in flight is never double-scheduled.
    let request = retouch_request::Entity::find()
        .filter(retouch_request::Column::RequestNumber.eq(number))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: retouch_request::ActiveModel = request.clone().into();
    active.archive_task_id = Set(Some("job-in-flight".to_string()));
    active.archive_started_at = Set(Some(chrono::Utc::now()));
    active.update(&app.db).await.unwrap();

    let res = app
        .post_with_token(&routes::retouch_download(number), &json!({}), &senior)
        .await;
    assert_eq!(res.status, 202, "{}", res.text);
    assert_eq!(res.body["status"], "in_progress");

    // A finished archive still on disk is served as-is.
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join(format!("{number}.zip"));
    std::fs::write(&archive, b"zip bytes").unwrap();

    let mut active: retouch_request::ActiveModel = request.into();
    active.archive_completed_at = Set(Some(chrono::Utc::now()));
    active.archive_path = Set(Some(archive.to_string_lossy().into_owned()));
    active.update(&app.db).await.unwrap();

    let res = app
        .post_with_token(&routes::retouch_download(number), &json!({}), &senior)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["status"], "ready");
    assert_eq!(res.body["archive_path"], archive.to_string_lossy().as_ref());

    // The archive vanishing from disk sends the endpoint back to
    // scheduling instead of serving a dead path.
    std::fs::remove_file(&archive).unwrap();
    let res = app
        .post_with_token(&routes::retouch_download(number), &json!({}), &senior)
        .await;
    assert_eq!(res.status, 202, "{}", res.text);
}

#[tokio::test]
async fn result_updates_require_the_edit_permission() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("rt_stock6", "password123").await;
    let phot = app
        .create_user_with_role("rt_phot6", "password123", "photographer")
        .await;
    let senior = app
        .create_user_with_role("rt_senior6", "password123", "senior_retoucher")
        .await;
    let phot_id = app.user_id("rt_phot6").await;

    // The batch is assigned to the photographer, who lacks the
    // retoucher permissions.
    let (_, ids) = shot_members(&app, &stockman, &phot, &["4600000003601"]).await;
    let res = app
        .post_with_token(
            routes::RETOUCH,
            &json!({"st_request_product_ids": ids, "retoucher_id": phot_id}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let line_id = res.body["products"][0]["id"].as_i64().unwrap();

    // Owning the request is not enough to record results.
    let res = app
        .patch_with_token(
            routes::RETOUCH_RESULTS,
            &json!({"retouch_request_product_id": line_id, "retouch_status": 1}),
            &phot,
        )
        .await;
    assert_eq!(res.status, 403, "{}", res.text);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");

    // The senior's review permission still covers the same call.
    let res = app
        .patch_with_token(
            routes::RETOUCH_RESULTS,
            &json!({"retouch_request_product_id": line_id, "retouch_status": 1}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
}
