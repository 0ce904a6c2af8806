use actix_web::cookie::Cookie;
use actix_web::{test, web, App};
use medgate::{routes::config, AppState, BackendClient, ProxyConfig};
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_state(mock: &MockServer) -> AppState {
    AppState {
        backend: BackendClient::new(ProxyConfig::new(mock.uri())),
    }
}

fn access_cookie() -> Cookie<'static> {
    Cookie::new("accessToken", "tok")
}

#[actix_web::test]
async fn bearer_attached_and_plain_text_body_relayed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/pages/home"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string("not json"),
        )
        .mount(&mock_server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&mock_server)))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/admin/pages/home")
        .cookie(access_cookie())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let ct = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(ct.starts_with("text/plain"), "content-type was {ct}");
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"not json");
}

#[actix_web::test]
async fn missing_upstream_content_type_defaults_to_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/org"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes("{}"))
        .mount(&mock_server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&mock_server)))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/admin/org")
        .cookie(access_cookie())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let ct = resp.headers().get("content-type").unwrap().to_str().unwrap();
    assert!(ct.starts_with("application/json"), "content-type was {ct}");
}

#[actix_web::test]
async fn no_content_status_drops_any_upstream_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/admin/catalog/services/3"))
        .respond_with(ResponseTemplate::new(204).set_body_string("spurious"))
        .mount(&mock_server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&mock_server)))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri("/api/admin/catalog/services/3")
        .cookie(access_cookie())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);
    let body = test::read_body(resp).await;
    assert!(body.is_empty());
}

#[actix_web::test]
async fn upstream_error_status_and_body_relayed_unchanged() {
    let mock_server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/admin/org"))
        .respond_with(
            ResponseTemplate::new(422)
                .insert_header("content-type", "application/json")
                .set_body_string(r#"{"message":"invalid phone"}"#),
        )
        .mount(&mock_server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&mock_server)))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::put()
        .uri("/api/admin/org")
        .cookie(access_cookie())
        .set_json(serde_json::json!({"phone": "nope"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], br#"{"message":"invalid phone"}"#);
}

#[actix_web::test]
async fn list_query_string_is_forwarded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/admin/leads"))
        .and(query_param("status", "new"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&mock_server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&mock_server)))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/admin/leads?status=new&page=2")
        .cookie(access_cookie())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn create_payload_forwarded_as_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/catalog/services"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({"title": "Massage"})))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id":1}"#))
        .mount(&mock_server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&mock_server)))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/admin/catalog/services")
        .cookie(access_cookie())
        .set_json(serde_json::json!({"title": "Massage"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
}

#[actix_web::test]
async fn admin_scope_rejects_requests_without_session_cookies() {
    let mock_server = MockServer::start().await;
    // The guard must answer before any upstream round trip.
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(app_state(&mock_server)))
            .configure(config),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/admin/leads").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
