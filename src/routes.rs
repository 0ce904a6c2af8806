use actix_multipart::Multipart;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt as _;
use reqwest::Method;
use serde_json::{json, Value};

use crate::envelope::unwrap_data;
use crate::error::ApiError;
use crate::guard::SessionGuard;
use crate::media;
use crate::relay::relay_with_cookies;
use crate::session::{clear_cookies, issue_cookies, Session, TokenPair};
use crate::upstream::{BackendClient, UpstreamRequest};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .service(web::resource("/login").route(web::post().to(login)))
                    .service(web::resource("/logout").route(web::post().to(logout))),
            )
            .service(
                web::scope("/admin")
                    .wrap(SessionGuard)
                    .service(
                        web::resource("/catalog/categories")
                            .route(web::get().to(list_categories))
                            .route(web::post().to(create_category)),
                    )
                    .service(
                        web::resource("/catalog/categories/by-slug/{slug}")
                            .route(web::get().to(get_category_by_slug)),
                    )
                    .service(
                        web::resource("/catalog/services")
                            .route(web::get().to(list_services))
                            .route(web::post().to(create_service)),
                    )
                    .service(
                        web::resource("/catalog/services/{id}")
                            .route(web::get().to(get_service))
                            .route(web::put().to(update_service))
                            .route(web::delete().to(delete_service)),
                    )
                    .service(
                        web::resource("/catalog/devices")
                            .route(web::get().to(list_devices))
                            .route(web::post().to(create_device)),
                    )
                    .service(
                        web::resource("/catalog/devices/{id}")
                            .route(web::get().to(get_device))
                            .route(web::put().to(update_device))
                            .route(web::delete().to(delete_device)),
                    )
                    .service(
                        web::resource("/catalog/specialists")
                            .route(web::get().to(list_specialists))
                            .route(web::post().to(create_specialist)),
                    )
                    .service(
                        web::resource("/catalog/specialists/{id}")
                            .route(web::get().to(get_specialist))
                            .route(web::put().to(update_specialist))
                            .route(web::delete().to(delete_specialist)),
                    )
                    .service(
                        web::resource("/org")
                            .route(web::get().to(get_org))
                            .route(web::put().to(update_org)),
                    )
                    .service(web::resource("/leads").route(web::get().to(list_leads)))
                    .service(
                        web::resource("/leads/{id}/status")
                            .route(web::patch().to(update_lead_status)),
                    )
                    .service(
                        web::resource("/pages/{page}")
                            .route(web::get().to(get_page))
                            .route(web::put().to(update_page)),
                    )
                    .service(web::resource("/files/upload").route(web::post().to(upload_file))),
            ),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub backend: BackendClient,
}

fn query_suffix(req: &HttpRequest) -> String {
    let q = req.query_string();
    if q.is_empty() {
        String::new()
    } else {
        format!("?{q}")
    }
}

// Editors submit empty bodies for "reset" updates; the backend expects a
// JSON object either way.
fn json_or_empty(body: web::Bytes) -> web::Bytes {
    if body.is_empty() {
        web::Bytes::from_static(b"{}")
    } else {
        body
    }
}

/// Shared pass-through: cookies in, authenticated call (with the single
/// refresh retry), relay out.
async fn proxy(
    state: &AppState,
    req: &HttpRequest,
    upstream: UpstreamRequest,
) -> Result<HttpResponse, ApiError> {
    let session = Session::from_request(req);
    let outcome = state.backend.call(&session, &upstream).await?;
    relay_with_cookies(outcome.response, outcome.rotated).await
}

// ---------------- Session endpoints -----------------------------------

#[utoipa::path(
    post,
    path = "/api/auth/login",
    responses(
        (status = 200, description = "Session cookies issued"),
        (status = 401, description = "Backend rejected the credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let res = state.backend.login(json_or_empty(body)).await?;
    let status = StatusCode::from_u16(res.status().as_u16()).map_err(|_| ApiError::Internal)?;
    let payload: Value = res.json().await.unwrap_or(Value::Null);

    if !status.is_success() {
        let message = payload
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unauthorized");
        return Ok(HttpResponse::build(status).json(json!({ "message": message })));
    }

    let pair = serde_json::from_value::<TokenPair>(payload.clone()).map_err(|e| {
        log::error!("login response missing token pair: {e}");
        ApiError::Internal
    })?;
    let user = payload.get("user").cloned().unwrap_or(Value::Null);

    let mut builder = HttpResponse::Ok();
    for cookie in issue_cookies(&pair) {
        builder.cookie(cookie);
    }
    Ok(builder.json(json!({ "ok": true, "user": user })))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Session cookies cleared")),
    tag = "auth"
)]
pub async fn logout() -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    for cookie in clear_cookies() {
        builder.cookie(cookie);
    }
    builder.json(json!({ "ok": true }))
}

// ---------------- Catalog pass-through --------------------------------
// Lists for categories and devices come from the public endpoints (the
// dashboard shows the same records the site renders); mutations always go
// through the admin endpoints.

pub async fn list_categories(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, "/service-categories")).await
}

pub async fn create_category(req: HttpRequest, state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::json(Method::POST, "/admin/catalog/categories", json_or_empty(body))).await
}

pub async fn get_category_by_slug(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, format!("/service-categories/{}", path.into_inner()))).await
}

pub async fn list_services(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, format!("/admin/catalog/services{}", query_suffix(&req)))).await
}

pub async fn create_service(req: HttpRequest, state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::json(Method::POST, "/admin/catalog/services", json_or_empty(body))).await
}

// The public card endpoint serves the edit form too: the list only carries
// slugs, and the public read returns the full record.
pub async fn get_service(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, format!("/services/{}", path.into_inner()))).await
}

pub async fn update_service(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::json(Method::PUT, format!("/admin/catalog/services/{}", path.into_inner()), json_or_empty(body))).await
}

pub async fn delete_service(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::DELETE, format!("/admin/catalog/services/{}", path.into_inner()))).await
}

pub async fn list_devices(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, format!("/devices{}", query_suffix(&req)))).await
}

pub async fn create_device(req: HttpRequest, state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::json(Method::POST, "/admin/catalog/devices", json_or_empty(body))).await
}

pub async fn get_device(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, format!("/devices/{}", path.into_inner()))).await
}

pub async fn update_device(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::json(Method::PUT, format!("/admin/catalog/devices/{}", path.into_inner()), json_or_empty(body))).await
}

pub async fn delete_device(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::DELETE, format!("/admin/catalog/devices/{}", path.into_inner()))).await
}

pub async fn list_specialists(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, format!("/admin/catalog/specialists{}", query_suffix(&req)))).await
}

pub async fn create_specialist(req: HttpRequest, state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::json(Method::POST, "/admin/catalog/specialists", json_or_empty(body))).await
}

pub async fn get_specialist(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, format!("/admin/catalog/specialists/{}", path.into_inner()))).await
}

pub async fn update_specialist(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::json(Method::PUT, format!("/admin/catalog/specialists/{}", path.into_inner()), json_or_empty(body))).await
}

pub async fn delete_specialist(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::DELETE, format!("/admin/catalog/specialists/{}", path.into_inner()))).await
}

// ---------------- Org / leads / pages ---------------------------------

pub async fn get_org(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, "/admin/org")).await
}

pub async fn update_org(req: HttpRequest, state: web::Data<AppState>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::json(Method::PUT, "/admin/org", json_or_empty(body))).await
}

#[utoipa::path(
    get,
    path = "/api/admin/leads",
    responses((status = 200, description = "Relayed backend lead list")),
    tag = "admin"
)]
pub async fn list_leads(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, format!("/admin/leads{}", query_suffix(&req)))).await
}

pub async fn update_lead_status(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::json(Method::PATCH, format!("/admin/leads/{}/status", path.into_inner()), json_or_empty(body))).await
}

#[utoipa::path(
    get,
    path = "/api/admin/pages/{page}",
    params(("page" = String, Path, description = "Page slug (home, about, contacts, prices, ...)")),
    responses((status = 200, description = "Relayed page content")),
    tag = "admin"
)]
pub async fn get_page(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::new(Method::GET, format!("/admin/pages/{}", path.into_inner()))).await
}

#[utoipa::path(
    put,
    path = "/api/admin/pages/{page}",
    params(("page" = String, Path, description = "Page slug")),
    responses((status = 200, description = "Relayed backend response")),
    tag = "admin"
)]
pub async fn update_page(req: HttpRequest, state: web::Data<AppState>, path: web::Path<String>, body: web::Bytes) -> Result<HttpResponse, ApiError> {
    proxy(&state, &req, UpstreamRequest::json(Method::PUT, format!("/admin/pages/{}", path.into_inner()), json_or_empty(body))).await
}

// ---------------- File upload -----------------------------------------

const UPLOAD_SIZE_LIMIT: usize = 25 * 1024 * 1024;

/// Forward a multipart upload to the backend, then normalize the reply into
/// the canonical media shape: the envelope is unwrapped and `fileId` /
/// `previewUrl` resolved, so the uploader widget never sees the backend's
/// version-dependent file record variants.
#[utoipa::path(
    post,
    path = "/api/admin/files/upload",
    responses(
        (status = 200, description = "Stored file with resolved fileId and previewUrl", body = crate::media::ResolvedMedia),
        (status = 400, description = "No 'file' part in the form"),
        (status = 413, description = "Upload exceeds the size cap")
    ),
    tag = "admin"
)]
pub async fn upload_file(
    req: HttpRequest,
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    while let Some(field) = payload.try_next().await.map_err(|e| {
        log::error!("multipart error: {e}");
        ApiError::Internal
    })? {
        let (filename, mime) = {
            let cd = field.content_disposition();
            if cd.get_name() != Some("file") {
                continue;
            }
            (
                cd.get_filename().unwrap_or("upload.bin").to_string(),
                field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into()),
            )
        };

        let mut bytes: Vec<u8> = Vec::new();
        let mut stream = field;
        while let Some(chunk) = stream.try_next().await.map_err(|e| {
            log::error!("stream read error: {e}");
            ApiError::Internal
        })? {
            if bytes.len() + chunk.len() > UPLOAD_SIZE_LIMIT {
                return Err(ApiError::PayloadTooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }

        let session = Session::from_request(&req);
        let upstream =
            UpstreamRequest::file("/admin/files/upload", filename, mime, web::Bytes::from(bytes));
        let outcome = state.backend.call(&session, &upstream).await?;

        if !outcome.response.status().is_success() {
            return relay_with_cookies(outcome.response, outcome.rotated).await;
        }

        let status = StatusCode::from_u16(outcome.response.status().as_u16())
            .map_err(|_| ApiError::Internal)?;
        let record = unwrap_data(outcome.response.json::<Value>().await.unwrap_or(Value::Null));
        let resolved = media::resolve(&record, state.backend.config());
        let mut body = match record {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        body.insert("fileId".into(), json!(resolved.file_id));
        body.insert("previewUrl".into(), json!(resolved.preview_url));

        let mut builder = HttpResponse::build(status);
        if let Some(pair) = outcome.rotated {
            for cookie in issue_cookies(&pair) {
                builder.cookie(cookie);
            }
        }
        return Ok(builder.json(Value::Object(body)));
    }

    Ok(HttpResponse::BadRequest()
        .json(json!({ "message": "expected 'file' in multipart/form-data" })))
}
