use crate::helpers::{ADMIN_TOKEN, spawn_app};
use gradewatch::api::NotifyResponse;
use gradewatch::domain::UserId;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

fn message_created(channel: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "id": "900", "channel_id": channel }))
}

#[tokio::test]
async fn notify_yes_subscribes_and_reacts_with_a_bell() {
    let app = spawn_app().await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/channels/42/messages/77/reactions/%F0%9F%94%94/@me$"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.chat_server)
        .await;

    let response = app
        .post_notify(json!({
            "user_id": "10",
            "channel_id": "42",
            "message_id": "77",
            "value": "yes"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let body: NotifyResponse = response.json().await.unwrap();
    assert!(body.subscribed);
    assert!(
        app.store
            .current()
            .await
            .notifs
            .contains(&UserId::new("10").unwrap())
    );
    app.cleanup().await;
}

#[tokio::test]
async fn notify_without_value_unsubscribes() {
    let app = spawn_app().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&app.chat_server)
        .await;
    let subscribe = json!({ "user_id": "10", "channel_id": "42", "message_id": "77", "value": "y" });
    app.post_notify(subscribe).await;

    let response = app
        .post_notify(json!({ "user_id": "10", "channel_id": "42", "message_id": "78" }))
        .await;

    let body: NotifyResponse = response.json().await.unwrap();
    assert!(!body.subscribed);
    assert!(app.store.current().await.notifs.is_empty());
    app.cleanup().await;
}

#[tokio::test]
async fn notify_requires_the_relay_token() {
    let app = spawn_app().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&app.chat_server)
        .await;
    let body = json!({ "user_id": "10", "channel_id": "42", "message_id": "77", "value": "yes" });

    let missing = app.post_notify_as(body.clone(), None).await;
    let wrong = app.post_notify_as(body.clone(), Some("guess")).await;
    let admin = app.post_notify_as(body, Some(ADMIN_TOKEN)).await;

    assert_eq!(missing.status().as_u16(), 401);
    assert_eq!(wrong.status().as_u16(), 401);
    assert_eq!(admin.status().as_u16(), 401);
    assert!(app.store.current().await.notifs.is_empty());
    app.cleanup().await;
}

#[tokio::test]
async fn notify_rejects_malformed_ids() {
    let app = spawn_app().await;
    let test_cases = vec![
        (json!({ "user_id": "abc", "channel_id": "42", "message_id": "77" }), "non-numeric user"),
        (json!({ "user_id": "10", "channel_id": "", "message_id": "77" }), "empty channel"),
        (json!({ "user_id": "10", "channel_id": "42" }), "missing message"),
    ];

    for (body, description) in test_cases {
        let response = app.post_notify(body).await;

        assert!(
            response.status().is_client_error(),
            "The API did not reject a request with a {description}."
        );
    }
    assert!(app.store.current().await.notifs.is_empty());
    app.cleanup().await;
}

#[tokio::test]
async fn loop_time_requires_the_admin_token() {
    let app = spawn_app().await;
    let body = json!({ "invoking_channel": "42", "seconds": 60 });

    let missing = app.put_loop_time(body.clone(), None).await;
    let wrong = app.put_loop_time(body, Some("guess")).await;

    assert_eq!(missing.status().as_u16(), 401);
    assert_eq!(wrong.status().as_u16(), 401);
    assert_eq!(app.store.current().await.loop_time, 180);
    app.cleanup().await;
}

#[tokio::test]
async fn loop_time_is_saved_and_confirmed() {
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .and(body_json(json!({
            "content": ":white_check_mark: Time between checks is now **60** seconds."
        })))
        .respond_with(message_created("42"))
        .expect(1)
        .mount(&app.chat_server)
        .await;

    let response = app
        .put_loop_time(json!({ "invoking_channel": "42", "seconds": 60 }), Some(ADMIN_TOKEN))
        .await;

    assert_eq!(response.status().as_u16(), 204);
    assert_eq!(app.store.current().await.loop_time, 60);
    app.cleanup().await;
}

#[tokio::test]
async fn zero_loop_time_is_a_bad_request() {
    let app = spawn_app().await;

    let response = app
        .put_loop_time(json!({ "invoking_channel": "42", "seconds": 0 }), Some(ADMIN_TOKEN))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.store.current().await.loop_time, 180);
    app.cleanup().await;
}

#[tokio::test]
async fn announcement_channel_is_saved_and_confirmed() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path("/channels/55"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": "55", "guild_id": "1" })),
        )
        .expect(1)
        .mount(&app.chat_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/channels/42/messages"))
        .respond_with(message_created("42"))
        .expect(1)
        .mount(&app.chat_server)
        .await;

    let response = app
        .put_announcement_channel(
            json!({ "invoking_channel": "42", "channel_id": "55" }),
            Some(ADMIN_TOKEN),
        )
        .await;

    assert_eq!(response.status().as_u16(), 204);
    assert_eq!(
        app.store.current().await.announcement_channel.as_str(),
        "55"
    );
    app.cleanup().await;
}

#[tokio::test]
async fn unknown_announcement_channel_is_a_bad_request() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path("/channels/55"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&app.chat_server)
        .await;

    let response = app
        .put_announcement_channel(
            json!({ "invoking_channel": "42", "channel_id": "55" }),
            Some(ADMIN_TOKEN),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(
        app.store.current().await.announcement_channel.as_str(),
        "355384548671881220"
    );
    app.cleanup().await;
}
