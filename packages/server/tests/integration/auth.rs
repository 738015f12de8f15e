use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn register_login_me_roundtrip() {
    let app = TestApp::spawn().await;

    let creds = json!({"username": "anna", "password": "password123"});

    let res = app.post_without_token(routes::REGISTER, &creds).await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["username"], "anna");

    let res = app.post_without_token(routes::LOGIN, &creds).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["role"], "stockman");
    let token = res.body["token"].as_str().unwrap().to_string();
    let perms = res.body["permissions"].as_array().unwrap();
    assert!(perms.iter().any(|p| p == "product:intake"));

    let res = app.get_with_token(routes::ME, &token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["username"], "anna");
    assert_eq!(res.body["role"], "stockman");
}

#[tokio::test]
async fn duplicate_username_is_conflict() {
    let app = TestApp::spawn().await;

    let creds = json!({"username": "taken", "password": "password123"});
    let res = app.post_without_token(routes::REGISTER, &creds).await;
    assert_eq!(res.status, 201, "{}", res.text);

    let res = app.post_without_token(routes::REGISTER, &creds).await;
    assert_eq!(res.status, 409, "{}", res.text);
    assert_eq!(res.body["code"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = TestApp::spawn().await;

    app.create_authenticated_user("victor", "password123").await;

    let res = app
        .post_without_token(
            routes::LOGIN,
            &json!({"username": "victor", "password": "not-the-password"}),
        )
        .await;
    assert_eq!(res.status, 401, "{}", res.text);
    assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn protected_route_requires_token() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::ME).await;
    assert_eq!(res.status, 401, "{}", res.text);
    assert_eq!(res.body["code"], "TOKEN_MISSING");

    let res = app.get_with_token(routes::ME, "not-a-jwt").await;
    assert_eq!(res.status, 401, "{}", res.text);
    assert_eq!(res.body["code"], "TOKEN_INVALID");
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let app = TestApp::spawn().await;

    // Photographers cannot intake products.
    let token = app
        .create_user_with_role("phot1", "password123", "photographer")
        .await;
    let res = app
        .post_with_token(
            routes::PRODUCTS,
            &json!({"products": [{"barcode": "4600000000017", "name": "Mug"}]}),
            &token,
        )
        .await;
    assert_eq!(res.status, 403, "{}", res.text);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}
