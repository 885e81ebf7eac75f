mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{Value, json};

use mailsmart_types::models::Role;

use common::TestApp;

async fn create(app: &TestApp, token: &str, title: &str, message: &str) -> (StatusCode, Value) {
    let (status, _, body) = app
        .call(
            "POST",
            "/messages",
            Some(token),
            Some(json!({ "title": title, "message": message })),
        )
        .await;
    (status, body)
}

#[tokio::test]
async fn prediction_is_stored_as_prediction_and_correction() {
    let app = TestApp::new().await;
    let (alice, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    app.api.respond_predict(
        StatusCode::OK,
        json!({ "is_spam": true, "emotion": "anger", "spam_score": 0.97, "detected_language": "fr" }),
    );

    let (status, body) = create(&app, &token, "WIN NOW", "claim your prize").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["notifications"], json!([]));

    let msg = &body["message"];
    assert_eq!(msg["user_id"], alice);
    assert_eq!(msg["detection"]["is_spam"], true);
    assert_eq!(msg["detection"]["emotion"], "anger");
    assert_eq!(msg["corrections"]["is_real_spam"], true);
    assert_eq!(msg["corrections"]["emotion_real"], "anger");
    assert_eq!(msg["detection"]["emotion_label"], "Colère");
    assert_eq!(msg["detection"]["emotion_color"], "primary");

    assert_eq!(app.api.predict_calls(), vec![json!({ "text": "WIN NOW claim your prize" })]);
}

#[tokio::test]
async fn classifier_error_saves_defaults_with_warning() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    app.api.respond_predict(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": "model not loaded" }),
    );

    let (status, body) = create(&app, &token, "Hello", "see you tomorrow").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["detection"]["is_spam"], false);
    assert_eq!(body["message"]["detection"]["emotion"], "neutral");
    assert_eq!(body["message"]["corrections"]["is_real_spam"], false);
    assert_eq!(body["message"]["corrections"]["emotion_real"], "neutral");

    let notes = body["notifications"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["level"], "warning");
    assert_eq!(notes[0]["body"], "model not loaded");
}

#[tokio::test]
async fn unreachable_classifier_still_saves() {
    let app = TestApp::with_dead_api().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);

    let (status, body) = create(&app, &token, "Hello", "anyone there?").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["detection"]["is_spam"], false);
    assert_eq!(body["message"]["detection"]["emotion"], "neutral");
    assert_eq!(body["notifications"][0]["level"], "warning");
    assert_eq!(app.state.db.count_messages(None, None).unwrap(), 1);
}

#[tokio::test]
async fn undecodable_prediction_saves_defaults_with_warning() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    app.api.respond_predict_raw(StatusCode::OK, "<html>maintenance</html>");

    let (status, body) = create(&app, &token, "Hello", "see you tomorrow").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["detection"]["is_spam"], false);
    assert_eq!(body["message"]["detection"]["emotion"], "neutral");

    let notes = body["notifications"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["level"], "warning");

    // well-formed JSON with the wrong types fails the same way
    app.api.respond_predict(StatusCode::OK, json!({ "is_spam": "yes", "emotion": "joy" }));
    let (status, body) = create(&app, &token, "Again", "hello").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["detection"]["is_spam"], false);
    assert_eq!(body["message"]["detection"]["emotion"], "neutral");
    assert_eq!(body["notifications"].as_array().unwrap().len(), 1);
    assert_eq!(body["notifications"][0]["level"], "warning");
}

#[tokio::test]
async fn slow_classifier_times_out_and_still_saves() {
    let app = TestApp::with_api_timeout(Duration::from_secs(1)).await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    app.api
        .respond_predict(StatusCode::OK, json!({ "is_spam": true, "emotion": "anger" }));
    app.api.delay_predict(Duration::from_secs(3));

    let (status, body) = create(&app, &token, "Hello", "anyone there?").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["detection"]["is_spam"], false);
    assert_eq!(body["message"]["detection"]["emotion"], "neutral");
    assert_eq!(body["message"]["corrections"]["emotion_real"], "neutral");

    let notes = body["notifications"].as_array().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0]["level"], "warning");
    assert_eq!(app.state.db.count_messages(None, None).unwrap(), 1);
}

#[tokio::test]
async fn unknown_emotion_falls_back_to_neutral() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    app.api
        .respond_predict(StatusCode::OK, json!({ "is_spam": false, "emotion": "disgust" }));

    let (status, body) = create(&app, &token, "Ugh", "again?").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"]["detection"]["emotion"], "neutral");
    assert_eq!(body["notifications"], json!([]));
}

#[tokio::test]
async fn invalid_input_is_rejected_before_classification() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);

    let (status, body) = create(&app, &token, "   ", "").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["message"].is_array());

    let long_title = "x".repeat(256);
    let (status, _) = create(&app, &token, &long_title, "body").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(app.api.predict_calls().is_empty());
}

#[tokio::test]
async fn editing_title_only_sends_no_feedback() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    let (_, created) = create(&app, &token, "Hello", "world").await;
    let id = created["message"]["id"].as_i64().unwrap();

    let (status, _, body) = app
        .call(
            "PUT",
            &format!("/messages/{}", id),
            Some(&token),
            Some(json!({ "title": "Hello again" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["title"].is_array());
    assert_eq!(app.state.db.get_message(id).unwrap().unwrap().title, "Hello");

    // same values as before are not a change either
    let (status, _, body) = app
        .call(
            "PUT",
            &format!("/messages/{}", id),
            Some(&token),
            Some(json!({ "is_real_spam": false, "emotion_real": "neutral" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notifications"], json!([]));

    assert!(app.api.feedback_calls().is_empty());
}

#[tokio::test]
async fn stored_text_cannot_be_rewritten_alongside_a_correction() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    app.api
        .respond_predict(StatusCode::OK, json!({ "is_spam": true, "emotion": "anger" }));
    let (_, created) = create(&app, &token, "WIN NOW", "claim your prize").await;
    let id = created["message"]["id"].as_i64().unwrap();

    let (status, _, _) = app
        .call(
            "PUT",
            &format!("/messages/{}", id),
            Some(&token),
            Some(json!({ "title": "Lunch", "message": "see you at noon", "is_real_spam": false })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let row = app.state.db.get_message(id).unwrap().unwrap();
    assert_eq!(row.title, "WIN NOW");
    assert_eq!(row.message, "claim your prize");
    assert!(row.is_real_spam);
    assert!(app.api.feedback_calls().is_empty());

    // the correction on its own goes through, with the text that was classified
    let (status, _, body) = app
        .call(
            "PUT",
            &format!("/messages/{}", id),
            Some(&token),
            Some(json!({ "is_real_spam": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["title"], "WIN NOW");
    let calls = app.api.feedback_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["text"], "WIN NOW claim your prize");
}

#[tokio::test]
async fn unknown_correction_emotion_is_a_field_error() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    let (_, created) = create(&app, &token, "Hi", "there").await;
    let id = created["message"]["id"].as_i64().unwrap();

    let (status, _, body) = app
        .call(
            "PUT",
            &format!("/messages/{}", id),
            Some(&token),
            Some(json!({ "emotion_real": "disgust" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].is_string());
    assert!(body["errors"]["emotion_real"].is_array());
    assert_eq!(app.state.db.get_message(id).unwrap().unwrap().emotion_real, "neutral");
}

#[tokio::test]
async fn correcting_spam_flag_sends_feedback_once() {
    let app = TestApp::new().await;
    let (alice, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    app.api
        .respond_predict(StatusCode::OK, json!({ "is_spam": true, "emotion": "anger" }));
    let (_, created) = create(&app, &token, "Hi", "it's me").await;
    let id = created["message"]["id"].as_i64().unwrap();

    let (status, _, body) = app
        .call(
            "PUT",
            &format!("/messages/{}", id),
            Some(&token),
            Some(json!({ "is_real_spam": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notifications"][0]["level"], "success");

    // prediction stays as it was
    assert_eq!(body["message"]["detection"]["is_spam"], true);
    assert_eq!(body["message"]["corrections"]["is_real_spam"], false);

    assert_eq!(
        app.api.feedback_calls(),
        vec![json!({
            "message_id": id,
            "user_id": alice,
            "text": "Hi it's me",
            "initial_spam_prediction": true,
            "initial_sentiment_prediction": "anger",
            "real_spam": false,
            "real_emotion": "anger",
        })]
    );
}

#[tokio::test]
async fn correcting_emotion_sends_feedback_once() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    let (_, created) = create(&app, &token, "Hi", "great news").await;
    let id = created["message"]["id"].as_i64().unwrap();

    let (status, _, body) = app
        .call(
            "PUT",
            &format!("/messages/{}", id),
            Some(&token),
            Some(json!({ "emotion_real": "joy" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"]["corrections"]["emotion_real_label"], "Joie");

    let calls = app.api.feedback_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["initial_sentiment_prediction"], "neutral");
    assert_eq!(calls[0]["real_emotion"], "joy");
}

#[tokio::test]
async fn rejected_feedback_keeps_the_correction() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    let (_, created) = create(&app, &token, "Hi", "there").await;
    let id = created["message"]["id"].as_i64().unwrap();
    app.api.respond_feedback(StatusCode::BAD_REQUEST);

    let (status, _, body) = app
        .call(
            "PUT",
            &format!("/messages/{}", id),
            Some(&token),
            Some(json!({ "is_real_spam": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notifications"][0]["level"], "warning");
    assert_eq!(body["message"]["corrections"]["is_real_spam"], true);

    let row = app.state.db.get_message(id).unwrap().unwrap();
    assert!(row.is_real_spam);
}

#[tokio::test]
async fn unreachable_feedback_endpoint_reports_error() {
    let app = TestApp::with_dead_api().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    let (_, created) = create(&app, &token, "Hi", "there").await;
    let id = created["message"]["id"].as_i64().unwrap();

    let (status, _, body) = app
        .call(
            "PUT",
            &format!("/messages/{}", id),
            Some(&token),
            Some(json!({ "emotion_real": "fear" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notifications"][0]["level"], "danger");
    assert_eq!(body["message"]["corrections"]["emotion_real"], "fear");
}

#[tokio::test]
async fn users_only_see_their_own_messages() {
    let app = TestApp::new().await;
    let (_, alice) = app.seed_user("Alice", "alice@example.com", Role::User);
    let (_, bob) = app.seed_user("Bob", "bob@example.com", Role::User);
    let (_, created) = create(&app, &alice, "Private", "note").await;
    let id = created["message"]["id"].as_i64().unwrap();
    create(&app, &bob, "Bob's", "note").await;

    let (status, _, _) = app.call("GET", &format!("/messages/{}", id), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = app
        .call(
            "PUT",
            &format!("/messages/{}", id),
            Some(&bob),
            Some(json!({ "is_real_spam": true })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.api.feedback_calls().is_empty());

    let (status, _, page) = app.call("GET", "/messages", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["title"], "Bob's");
}

#[tokio::test]
async fn admins_can_correct_any_message() {
    let app = TestApp::new().await;
    let (alice_id, alice) = app.seed_user("Alice", "alice@example.com", Role::User);
    let (_, admin) = app.seed_user("Root", "root@example.com", Role::Admin);
    let (_, created) = create(&app, &alice, "Hi", "there").await;
    let id = created["message"]["id"].as_i64().unwrap();

    let (status, _, page) = app.call("GET", "/admin/messages", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["author_name"], "Alice");

    let (status, _, _) = app
        .call(
            "PUT",
            &format!("/admin/messages/{}", id),
            Some(&admin),
            Some(json!({ "emotion_real": "sadness" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // feedback names the owner, not the admin
    let calls = app.api.feedback_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["user_id"], alice_id);
}

#[tokio::test]
async fn list_paginates_and_searches() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_user("Alice", "alice@example.com", Role::User);
    for i in 0..12 {
        create(&app, &token, &format!("Note {}", i), "routine").await;
    }
    create(&app, &token, "Invoice", "please pay").await;

    let (status, _, page) = app.call("GET", "/messages?page=2", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 13);
    assert_eq!(page["per_page"], 10);
    assert_eq!(page["data"].as_array().unwrap().len(), 3);

    let (_, _, page) = app
        .call("GET", "/messages?search=invoice&per_page=25", Some(&token), None)
        .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["title"], "Invoice");

    let (status, _, _) = app.call("GET", "/messages?per_page=7", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
