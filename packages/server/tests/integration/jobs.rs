use serde_json::json;

use server::jobs::{render_block, shooting_check};
use server::notify::Notifier;

use crate::common::{TestApp, routes};
use crate::retouch::shot_members;

fn sweep_notifier() -> Notifier {
    Notifier::new(None, "studio_tasks".to_string(), None)
}

#[tokio::test]
async fn check_sweep_rolls_only_fully_settled_requests() {
    let app = TestApp::spawn().await;
    let notifier = sweep_notifier();
    let stockman = app.create_authenticated_user("job_stock1", "password123").await;
    let phot = app
        .create_user_with_role("job_phot1", "password123", "photographer")
        .await;
    let senior = app
        .create_user_with_role("job_senior1", "password123", "senior_retoucher")
        .await;

    let barcodes = ["4600000007001", "4600000007002", "4600000007003"];
    for barcode in &barcodes {
        app.stocked_product(&stockman, barcode, "Fixture", None).await;
    }

    let res = app
        .post_with_token(routes::SHOOTING, &json!({"barcodes": barcodes}), &phot)
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    let number = res.body["request_number"].as_i64().unwrap() as i32;

    // Two shot products and one the photographer flagged defective.
    for (barcode, verdict) in [
        (barcodes[0], json!({"photo_status": "Done", "photo_folder": "shots/7001"})),
        (barcodes[1], json!({"photo_status": "Defect"})),
        (barcodes[2], json!({"photo_status": "Done", "photo_folder": "shots/7003"})),
    ] {
        let res = app
            .post_with_token(&routes::shooting_start(number, barcode), &json!({}), &phot)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let res = app
            .post_with_token(&routes::shooting_result(number, barcode), &verdict, &phot)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
    }

    let res = app.get_with_token(&routes::shooting(number), &phot).await;
    assert_eq!(res.body["status"], "PendingCheck");

    // No senior verdicts yet: the sweep must leave the request alone.
    shooting_check::roll_checked_requests(&app.db, &notifier)
        .await
        .unwrap();
    let res = app.get_with_token(&routes::shooting(number), &phot).await;
    assert_eq!(res.body["status"], "PendingCheck");

    // One of the two Done members checked, the other still open. The
    // defective member needs no verdict at all.
    let res = app
        .patch_with_token(
            &routes::shooting_photo_check(number, barcodes[0]),
            &json!({"accepted": true}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    shooting_check::roll_checked_requests(&app.db, &notifier)
        .await
        .unwrap();
    let res = app.get_with_token(&routes::shooting(number), &phot).await;
    assert_eq!(res.body["status"], "PendingCheck");

    // A rejection settles the last member, so the request rolls.
    let res = app
        .patch_with_token(
            &routes::shooting_photo_check(number, barcodes[2]),
            &json!({"accepted": false}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    shooting_check::roll_checked_requests(&app.db, &notifier)
        .await
        .unwrap();
    let res = app.get_with_token(&routes::shooting(number), &phot).await;
    assert_eq!(res.body["status"], "Checked");
    let checked_at = res.body["checked_at"].as_str().unwrap().to_string();

    // Re-running the sweep must not touch an already checked request.
    shooting_check::roll_checked_requests(&app.db, &notifier)
        .await
        .unwrap();
    let res = app.get_with_token(&routes::shooting(number), &phot).await;
    assert_eq!(res.body["status"], "Checked");
    assert_eq!(res.body["checked_at"].as_str().unwrap(), checked_at);
}

#[tokio::test]
async fn render_blocks_track_open_retouch_lines() {
    let app = TestApp::spawn().await;
    let stockman = app.create_authenticated_user("job_stock2", "password123").await;
    let phot = app
        .create_user_with_role("job_phot2", "password123", "photographer")
        .await;
    let senior = app
        .create_user_with_role("job_senior2", "password123", "senior_retoucher")
        .await;
    let retoucher = app
        .create_user_with_role("job_ret2", "password123", "retoucher")
        .await;
    let retoucher_id = app.user_id("job_ret2").await;

    let barcodes = ["4600000007101", "4600000007102"];
    let (_, ids) = shot_members(&app, &stockman, &phot, &barcodes).await;

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

    // Both products sit in an open request with no verdict: blocked.
    render_block::sync_render_blocks(&app.db).await.unwrap();
    for barcode in &barcodes {
        let res = app.get_with_token(&routes::product(barcode), &stockman).await;
        assert_eq!(res.body["blocked_for_render"], true, "{barcode}");
    }

    // A verified line unblocks its product even while the request is open.
    let res = app
        .patch_with_token(
            routes::RETOUCH_RESULTS,
            &json!({
                "retouch_request_product_id": line_ids[0],
                "retouch_status": 2,
                "retouch_link": "https://disk.example/retouch/7101",
            }),
            &retoucher,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let res = app
        .patch_with_token(
            &routes::retouch_review(number, line_ids[0]),
            &json!({"senior_retouch_status": 1}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    render_block::sync_render_blocks(&app.db).await.unwrap();
    let res = app.get_with_token(&routes::product(barcodes[0]), &stockman).await;
    assert_eq!(res.body["blocked_for_render"], false);
    let res = app.get_with_token(&routes::product(barcodes[1]), &stockman).await;
    assert_eq!(res.body["blocked_for_render"], true);

    // Finish the request: everything unblocks.
    let res = app
        .patch_with_token(
            routes::RETOUCH_RESULTS,
            &json!({
                "retouch_request_product_id": line_ids[1],
                "retouch_status": 2,
                "retouch_link": "https://disk.example/retouch/7102",
            }),
            &retoucher,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let res = app
        .patch_with_token(
            &routes::retouch_review(number, line_ids[1]),
            &json!({"senior_retouch_status": 1}),
            &senior,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let res = app
        .patch_with_token(&routes::retouch_update_status(number, 5), &json!({}), &senior)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    render_block::sync_render_blocks(&app.db).await.unwrap();
    for barcode in &barcodes {
        let res = app.get_with_token(&routes::product(barcode), &stockman).await;
        assert_eq!(res.body["blocked_for_render"], false, "{barcode}");
    }
}
