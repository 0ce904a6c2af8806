use actix_web::cookie::time::Duration;
use actix_web::{test, web, App};
use medgate::{routes::config, AppState, BackendClient, ProxyConfig};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_state(mock: &MockServer) -> AppState {
    AppState {
        backend: BackendClient::new(ProxyConfig::new(mock.uri())),
    }
}

#[actix_web::test]
async fn successful_login_issues_both_session_cookies() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(serde_json::json!({"email": "a@b.c", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "a1",
            "refreshToken": "r1",
            "user": {"email": "a@b.c", "name": "Admin"}
        })))
        .mount(&mock_server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&mock_server)))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({"email": "a@b.c", "password": "pw"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let cookies: Vec<_> = resp.response().cookies().collect();
    let access = cookies.iter().find(|c| c.name() == "accessToken").unwrap();
    let refresh = cookies.iter().find(|c| c.name() == "refreshToken").unwrap();
    assert_eq!(access.value(), "a1");
    assert_eq!(access.http_only(), Some(true));
    assert_eq!(access.path(), Some("/"));
    assert_eq!(access.max_age(), Some(Duration::seconds(900)));
    assert_eq!(refresh.value(), "r1");
    assert_eq!(refresh.max_age(), Some(Duration::seconds(2_592_000)));

    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["user"]["name"], "Admin");
}

#[actix_web::test]
async fn failed_login_relays_the_upstream_message_without_cookies() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"message": "bad credentials"})),
        )
        .mount(&mock_server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&mock_server)))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({"email": "a@b.c", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.response().cookies().count(), 0);

    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["message"], "bad credentials");
}

#[actix_web::test]
async fn failed_login_without_message_falls_back_to_unauthorized() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(503).set_body_string("gateway down"))
        .mount(&mock_server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&mock_server)))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({"email": "a@b.c", "password": "pw"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);
    let body: serde_json::Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["message"], "Unauthorized");
}

#[actix_web::test]
async fn logout_clears_both_cookies() {
    // Logout never touches the backend; a dead address is fine.
    let state = AppState {
        backend: BackendClient::new(ProxyConfig::new("http://127.0.0.1:9")),
    };
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/auth/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let cookies: Vec<_> = resp.response().cookies().collect();
    assert_eq!(cookies.len(), 2);
    for cookie in &cookies {
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
