mod common;

use axum::http::{Method, StatusCode};
use common::spawn_app;
use crewboard::utils::error_codes;
use serde_json::json;

#[tokio::test]
async fn generic_post_crud_is_owner_checked() {
    let app = spawn_app().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/generic_posts",
            Some(&alice),
            Some(json!({"text": "hello"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resp_data"]["kind"], "generic");
    assert_eq!(body["resp_data"]["username"], "alice");
    let id = body["resp_data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/generic_posts/{}", id);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&bob), Some(json!({"text": "hijacked"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], error_codes::PERMISSION_DENIED);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&alice), Some(json!({"text": "edited"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"]["text"], "edited");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send(Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], error_codes::NOT_FOUND);
}

#[tokio::test]
async fn lists_are_newest_first() {
    let app = spawn_app().await;
    let alice = app.register("alice").await;

    for text in ["first", "second", "third"] {
        app.send(
            Method::POST,
            "/api/generic_posts",
            Some(&alice),
            Some(json!({"text": text})),
        )
        .await;
    }

    let (status, body) = app
        .send(Method::GET, "/api/generic_posts", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let texts: Vec<&str> = body["resp_data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["third", "second", "first"]);
}

#[tokio::test]
async fn like_unlike_and_comment_scenario() {
    let app = spawn_app().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let bob_id = app.account_id(&bob).await;

    let (_, body) = app
        .send(
            Method::POST,
            "/api/generic_posts",
            Some(&alice),
            Some(json!({"text": "hi"})),
        )
        .await;
    let id = body["resp_data"]["id"].as_str().unwrap().to_string();
    let like = format!("/api/generic_posts/like/{}", id);
    let unlike = format!("/api/generic_posts/unlike/{}", id);

    let (status, body) = app.send(Method::PUT, &like, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"][0]["account_id"], bob_id.as_str());

    let (status, body) = app.send(Method::PUT, &like, Some(&bob), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], error_codes::ALREADY_LIKED);

    let (status, body) = app.send(Method::PUT, &unlike, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"], json!([]));

    let (status, body) = app.send(Method::PUT, &unlike, Some(&bob), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], error_codes::NOT_LIKED);

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/generic_posts/comment/{}", id),
            Some(&bob),
            Some(json!({"text": "nice"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resp_data"][0]["text"], "nice");
    assert_eq!(body["resp_data"][0]["username"], "bob");
    let comment_id = body["resp_data"][0]["id"].as_str().unwrap().to_string();
    let delete = format!("/api/generic_posts/comment/{}/{}", id, comment_id);

    let (status, _) = app.send(Method::DELETE, &delete, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::DELETE, &delete, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"], json!([]));

    let (status, _) = app.send(Method::DELETE, &delete, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_comment_is_rejected() {
    let app = spawn_app().await;
    let alice = app.register("alice").await;
    let (_, body) = app
        .send(
            Method::POST,
            "/api/generic_posts",
            Some(&alice),
            Some(json!({"text": "hi"})),
        )
        .await;
    let id = body["resp_data"]["id"].as_str().unwrap();

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/generic_posts/comment/{}", id),
            Some(&alice),
            Some(json!({"text": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["resp_data"][0]["field"], "text");
}

#[tokio::test]
async fn malformed_post_id_is_not_found() {
    let app = spawn_app().await;
    let alice = app.register("alice").await;
    let (status, _) = app
        .send(Method::GET, "/api/generic_posts/not-a-uuid", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inventory_and_recipes_are_admin_only() {
    let app = spawn_app().await;
    let alice = app.register("alice").await;
    let admin = app.admin_token().await;

    let (status, _) = app
        .send(Method::POST, "/api/inventory", Some(&alice), Some(json!({"item": "flour"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::POST, "/api/inventory", Some(&admin), Some(json!({"item": "flour"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resp_data"]["item"], "flour");
    let inventory_id = body["resp_data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/recipes",
            Some(&admin),
            Some(json!({"title": "Bread", "recipe": "Knead and bake"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["resp_data"]["kind"], "recipe");

    // 任何登录账号都能浏览
    let (status, body) = app.send(Method::GET, "/api/recipes", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resp_data"].as_array().unwrap().len(), 1);

    // 帖子类型不匹配时视为不存在
    let (status, _) = app
        .send(
            Method::GET,
            &format!("/api/recipes/{}", inventory_id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/generic_posts/like/{}", inventory_id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
