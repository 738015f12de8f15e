use serde_json::json;

use crate::common::{TestApp, WEBHOOK_SECRET, routes};

#[tokio::test]
async fn webhook_links_a_chat_to_a_user() {
    let app = TestApp::spawn().await;
    app.create_authenticated_user("chat_user1", "password123").await;
    let user_id = app.user_id("chat_user1").await;

    let res = app
        .post_without_token(
            &routes::chat_webhook(WEBHOOK_SECRET),
            &json!({
                "chat_id": 987654321i64,
                "chat_name": "chat_user1",
                "username": "chat_user1",
            }),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["linked"], true);
    assert_eq!(res.body["user_id"], user_id);

    // Relinking updates the existing profile instead of erroring.
    let res = app
        .post_without_token(
            &routes::chat_webhook(WEBHOOK_SECRET),
            &json!({
                "chat_id": 111222333i64,
                "chat_name": "chat_user1",
                "username": "chat_user1",
                "phone": "+79990001122",
            }),
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn webhook_rejects_wrong_secret_and_unknown_users() {
    let app = TestApp::spawn().await;
    app.create_authenticated_user("chat_user2", "password123").await;

    // The wrong secret is indistinguishable from a missing route.
    let res = app
        .post_without_token(
            &routes::chat_webhook("wrong-secret"),
            &json!({"chat_id": 1i64, "username": "chat_user2"}),
        )
        .await;
    assert_eq!(res.status, 404, "{}", res.text);

    let res = app
        .post_without_token(
            &routes::chat_webhook(WEBHOOK_SECRET),
            &json!({"chat_id": 1i64, "username": "nobody-here"}),
        )
        .await;
    assert_eq!(res.status, 404, "{}", res.text);
}
