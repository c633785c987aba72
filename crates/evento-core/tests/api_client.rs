use evento_core::client::{ClientConfig, EventoClient};
use evento_core::forms::{NewEventForm, RegistrationForm};
use evento_core::session::{CookieFileSession, MemorySession, Session, SessionStore};
use evento_core::types::{ApiError, ApiErrorKind, Envelope, NewEvent};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn logged_in() -> MemorySession {
    MemorySession::logged_in(Session {
        auth_token: json!("T"),
        user: json!({"id": 7}),
    })
}

fn client<S: SessionStore>(server: &MockServer, session: S) -> EventoClient<S> {
    EventoClient::new(ClientConfig::new(server.uri()), session).unwrap()
}

fn new_event() -> NewEvent {
    NewEvent {
        title: "Chess night".to_string(),
        description: "Bring a board".to_string(),
        category_id: 2,
        time: "2026-10-20T18:00:00+03:00".to_string(),
        location: "Library".to_string(),
        image_url: Some("ftp://nope".to_string()),
    }
}

/// Fails the test on drop if any request reaches the server.
async fn forbid_requests(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_events_wraps_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Badminton", "time": "2026-10-18T10:00:00Z", "location": "Gym", "attendee_count": 4},
            {"id": 2, "title": "Chess"}
        ])))
        .mount(&server)
        .await;

    let payload = client(&server, MemorySession::new())
        .get_events()
        .await
        .unwrap();

    assert_eq!(payload.events.len(), 2);
    assert_eq!(payload.events[0].attendee_count, Some(4));
    assert_eq!(payload.events[1].title, "Chess");
}

#[tokio::test]
async fn test_get_event_not_found_merges_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Event not found"})))
        .mount(&server)
        .await;

    let err = client(&server, MemorySession::new())
        .get_event(99)
        .await
        .unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Unknown);
    assert_eq!(err.message, "Event not found");
    assert_eq!(err.messages, vec!["Event not found"]);
}

#[tokio::test]
async fn test_server_error_without_json_is_generic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client(&server, MemorySession::new())
        .get_categories()
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::something_went_wrong());
    assert!(!err.messages.is_empty());
}

#[tokio::test]
async fn test_undecodable_success_body_is_generic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events/1/attendees"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server, MemorySession::new())
        .get_attendees(1)
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::something_went_wrong());
}

#[tokio::test]
async fn test_network_failure_is_generic() {
    // Nothing listens on the discard port.
    let client = EventoClient::new(
        ClientConfig::new("http://127.0.0.1:9"),
        MemorySession::new(),
    )
    .unwrap();
    let err = client.get_events().await.unwrap_err();

    assert_eq!(err, ApiError::something_went_wrong());
}

#[tokio::test]
async fn test_signin_persists_session_and_returns_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .and(body_json(json!({"email": "ada@example.com", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"auth_token": "T", "user": {"id": 1}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let client = client(&server, CookieFileSession::new(&session_path));

    let result = client.signin("ada@example.com", "pw").await;
    assert_eq!(
        serde_json::to_value(Envelope::from(result)).unwrap(),
        json!({"success": true, "payload": {"user": {"id": 1}, "auth_token": "T"}})
    );

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&session_path).unwrap()).unwrap();
    assert_eq!(stored, json!({"auth_token": "\"T\"", "user": "{\"id\":1}"}));
    assert!(client.session().is_logged_in());
}

#[tokio::test]
async fn test_signin_keeps_user_object_as_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(
                    r#"{"user": {"name": "Ada", "id": 3, "avatar_url": "/a.png"}, "auth_token": "T"}"#,
                ),
        )
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let session_path = dir.path().join("session.json");
    let client = client(&server, CookieFileSession::new(&session_path));

    let payload = client.signin("ada@example.com", "pw").await.unwrap();
    assert_eq!(payload.user["avatar_url"], json!("/a.png"));
    assert_eq!(payload.user_info().map(|u| u.id), Some(3));

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&session_path).unwrap()).unwrap();
    assert_eq!(
        stored["user"],
        json!(r#"{"name":"Ada","id":3,"avatar_url":"/a.png"}"#)
    );
    assert_eq!(client.session().user().map(|u| u.id), Some(3));
}

#[tokio::test]
async fn test_signin_rejected_defaults_to_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client(&server, MemorySession::new());
    let err = client.signin("ada@example.com", "wrong").await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Auth);
    assert_eq!(err.message, "Invalid credentials");
    assert_eq!(err.messages, vec!["Invalid credentials"]);
    assert!(!client.session().is_logged_in());
}

#[tokio::test]
async fn test_auth_required_calls_short_circuit_when_logged_out() {
    let server = MockServer::start().await;
    forbid_requests(&server).await;
    let client = client(&server, MemorySession::new());

    let expected = json!({
        "success": false,
        "error": {"type": "auth", "message": "You must be logged in", "messages": ["You must be logged in"]}
    });

    let attending = client.update_is_attending(1, true).await;
    assert_eq!(serde_json::to_value(Envelope::from(attending)).unwrap(), expected);

    let created = client.create_new_event(&new_event()).await;
    assert_eq!(serde_json::to_value(Envelope::from(created)).unwrap(), expected);

    let mine = client.get_user_events().await;
    assert_eq!(serde_json::to_value(Envelope::from(mine)).unwrap(), expected);
}

#[tokio::test]
async fn test_user_events_uses_session_user_and_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/7/events"))
        .and(header("cookie", "auth_token=%22T%22; user=%7B%22id%22%3A7%7D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 3, "title": "Quiz"}])))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client(&server, logged_in())
        .get_user_events()
        .await
        .unwrap();

    assert_eq!(payload.events[0].id, 3);
}

#[tokio::test]
async fn test_update_is_attending_picks_method() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events/5/attendees"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/events/5/attendees"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, logged_in());
    client.update_is_attending(5, true).await.unwrap();
    client.update_is_attending(5, false).await.unwrap();
}

#[tokio::test]
async fn test_create_event_sends_image_url_and_returns_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(body_json(json!({
            "title": "Chess night",
            "description": "Bring a board",
            "category_id": 2,
            "time": "2026-10-20T18:00:00+03:00",
            "location": "Library",
            "image_url": "ftp://nope"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 11, "title": "Chess night", "image": "ftp://nope"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client(&server, logged_in())
        .create_new_event(&new_event())
        .await
        .unwrap();

    assert_eq!(payload.event.id, 11);
    assert_eq!(payload.event.image.as_deref(), Some("ftp://nope"));
}

#[tokio::test]
async fn test_create_event_failure_aliases_image_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "image_url": ["invalid"],
            "title": ["can't be blank"]
        })))
        .mount(&server)
        .await;

    let err = client(&server, logged_in())
        .create_new_event(&new_event())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Unknown);
    assert_eq!(err.field_messages("image"), Some(&["invalid".to_string()][..]));
    assert_eq!(err.field_error("title"), Some("can't be blank"));
    assert_eq!(err.messages, vec!["image_url invalid", "title can't be blank"]);
}

#[tokio::test]
async fn test_register_failure_exposes_field_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(body_json(json!({"name": "Ada", "email": "ada", "password": "pw"})))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"email": ["is invalid"]})))
        .mount(&server)
        .await;

    let err = client(&server, MemorySession::new())
        .register("Ada", "ada", "pw")
        .await
        .unwrap_err();

    assert_eq!(err.message, "email is invalid");
    assert_eq!(err.field_error("email"), Some("is invalid"));
}

#[tokio::test]
async fn test_register_banner_is_first_field_the_server_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(422)
                .insert_header("content-type", "application/json")
                .set_body_string(r#"{"password": ["is too short"], "email": ["has already been taken"]}"#),
        )
        .mount(&server)
        .await;

    let err = client(&server, MemorySession::new())
        .register("Ada", "ada@example.com", "pw")
        .await
        .unwrap_err();

    assert_eq!(err.message, "password is too short");
    assert_eq!(
        err.messages,
        vec!["password is too short", "email has already been taken"]
    );
}

#[tokio::test]
async fn test_authentication_status_false_resets_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/authentication"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"authenticated": false})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, logged_in());
    let status = client.get_authentication_status().await.unwrap();

    assert!(!status.is_authenticated);
    assert!(!client.session().is_logged_in());
}

#[tokio::test]
async fn test_authentication_status_true_keeps_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/authentication"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"authenticated": true})))
        .mount(&server)
        .await;

    let client = client(&server, logged_in());
    let status = client.get_authentication_status().await.unwrap();

    assert!(status.is_authenticated);
    assert!(client.session().is_logged_in());
}

#[tokio::test]
async fn test_registration_form_mismatch_makes_no_request() {
    let server = MockServer::start().await;
    forbid_requests(&server).await;

    let form = RegistrationForm {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password: "one".to_string(),
        password_confirmation: "two".to_string(),
    };
    let err = form
        .submit(&client(&server, MemorySession::new()))
        .await
        .unwrap_err();

    assert_eq!(
        err.fields.get("password_confirmation"),
        Some("Passwords do not match")
    );
}

#[tokio::test]
async fn test_registration_form_signs_in_after_register() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"auth_token": "T2", "user": {"id": 9}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let form = RegistrationForm {
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        password: "pw".to_string(),
        password_confirmation: "pw".to_string(),
    };
    let client = client(&server, MemorySession::new());
    let payload = form.submit(&client).await.unwrap();

    assert_eq!(payload.user, json!({"id": 9}));
    assert_eq!(client.session().auth_token(), Some(json!("T2")));
}

#[tokio::test]
async fn test_new_event_form_unknown_category_skips_create() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "name": "Sports"}])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let form = NewEventForm {
        title: "Chess night".to_string(),
        category: "Games".to_string(),
        start_time: Some("2026-10-20T18:00:00+03:00".to_string()),
        ..NewEventForm::default()
    };
    let err = form.submit(&client(&server, logged_in())).await.unwrap_err();

    assert_eq!(err.fields.get("category"), Some("not found"));
}
