//! Routes, handlers and middleware for the REST API.

use crate::config::ServerConfig;
use crate::error::{
    panic_response, ApiError, Operation, METHOD_NOT_ALLOWED, NOT_FOUND, NO_IMAGE,
    SEARCH_QUERY_REQUIRED,
};
use crate::security::{rate_limit, refuse_dotfiles, security_headers, RateLimiter};
use crate::upload::read_upload_form;
use api_shared::{
    HealthRes, HealthService, MessageRes, SearchParams, UploadForm, WallpaperRes,
};
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{PathRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path as AxumPath, Query, State,
    },
    http::{header, Method, StatusCode},
    middleware,
    response::Json,
    routing::{delete, get},
    Router,
};
use std::path::Path;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use wallpaper_core::{CatalogService, MAX_FILE_SIZE_BYTES};

/// Request body cap: one maximum-size image plus room for the other form parts.
const UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE_BYTES as usize + 1024 * 1024;

/// Application state for the REST API server
///
/// Shared by all request handlers. The catalog service is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    service: CatalogService,
}

impl AppState {
    pub fn new(service: CatalogService) -> Self {
        Self { service }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_wallpapers,
        search_wallpapers,
        upload_wallpaper,
        delete_wallpaper,
    ),
    components(schemas(HealthRes, MessageRes, WallpaperRes, UploadForm))
)]
pub struct ApiDoc;

/// Build the application router.
///
/// API routes live under `/api`; every other path is served from `public_dir`,
/// except hidden files. Every response passes the per-client rate limit and
/// carries the protective headers.
pub fn router(state: AppState, public_dir: &Path, cfg: &ServerConfig) -> Router {
    let api = Router::new()
        .route(
            "/wallpapers",
            get(list_wallpapers)
                .post(upload_wallpaper)
                .fallback(api_method_not_allowed),
        )
        .route(
            "/wallpapers/search",
            get(search_wallpapers).fallback(api_method_not_allowed),
        )
        .route(
            "/wallpapers/:id",
            delete(delete_wallpaper).fallback(api_method_not_allowed),
        )
        .fallback(api_not_found)
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

    let static_files = ServiceBuilder::new()
        .layer(middleware::from_fn(refuse_dotfiles))
        .service(ServeDir::new(public_dir));

    let limiter = RateLimiter::new(cfg.rate_limit_max(), cfg.rate_limit_window());

    let cors = CorsLayer::new()
        .allow_origin(cfg.cors_origin().clone())
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(limiter, rate_limit))
        .layer(cors);

    security_headers()
        .into_iter()
        .fold(app, |app, headers| app.layer(headers))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/api/wallpapers",
    responses(
        (status = 200, description = "All wallpapers, newest first", body = [WallpaperRes]),
        (status = 500, description = "Internal server error", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn list_wallpapers(
    State(state): State<AppState>,
) -> Result<Json<Vec<WallpaperRes>>, ApiError> {
    let wallpapers = state
        .service
        .list()
        .await
        .map_err(|e| ApiError::catalog(Operation::List, e))?;
    Ok(Json(wallpapers.into_iter().map(WallpaperRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/wallpapers/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching wallpapers, newest first", body = [WallpaperRes]),
        (status = 400, description = "Missing or blank query", body = MessageRes),
        (status = 500, description = "Internal server error", body = MessageRes)
    )
)]
/// Search by name (substring) or tag (exact), ignoring case.
#[axum::debug_handler]
async fn search_wallpapers(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<WallpaperRes>>, ApiError> {
    // A query string that does not decode (such as a repeated `q`) carries
    // no usable search text.
    let Query(params) = params.map_err(|_| ApiError::bad_request(SEARCH_QUERY_REQUIRED))?;
    let query = params.q.unwrap_or_default();
    let wallpapers = state
        .service
        .search(&query)
        .await
        .map_err(|e| ApiError::catalog(Operation::Search, e))?;
    Ok(Json(wallpapers.into_iter().map(WallpaperRes::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/wallpapers",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Wallpaper created", body = WallpaperRes),
        (status = 400, description = "Missing fields, no tags, or a rejected image", body = MessageRes),
        (status = 500, description = "Internal server error", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn upload_wallpaper(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<WallpaperRes>), ApiError> {
    // A body that is not multipart carries no file.
    let multipart = multipart.map_err(|_| ApiError::bad_request(NO_IMAGE))?;
    let request = read_upload_form(multipart).await?;

    let wallpaper = state
        .service
        .upload(request)
        .await
        .map_err(|e| ApiError::catalog(Operation::Upload, e))?;
    Ok((StatusCode::CREATED, Json(wallpaper.into())))
}

#[utoipa::path(
    delete,
    path = "/api/wallpapers/{id}",
    params(("id" = i64, Path, description = "Wallpaper id")),
    responses(
        (status = 200, description = "Wallpaper deleted", body = MessageRes),
        (status = 404, description = "Wallpaper not found", body = MessageRes),
        (status = 500, description = "Internal server error", body = MessageRes)
    )
)]
#[axum::debug_handler]
async fn delete_wallpaper(
    State(state): State<AppState>,
    id: Result<AxumPath<String>, PathRejection>,
) -> Result<Json<MessageRes>, ApiError> {
    // Ids are integers; anything else cannot name an existing wallpaper.
    let id: i64 = id
        .ok()
        .and_then(|AxumPath(id)| id.parse().ok())
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    state
        .service
        .delete(id)
        .await
        .map_err(|e| ApiError::catalog(Operation::Delete, e))?;
    Ok(Json(MessageRes::new("Wallpaper deleted successfully")))
}

async fn api_not_found() -> ApiError {
    ApiError::not_found("Not found")
}

async fn api_method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tower::ServiceExt;
    use wallpaper_core::CoreConfig;

    const BOUNDARY: &str = "wallpaper-test-boundary";
    const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    enum Part<'a> {
        Text(&'a str, &'a str),
        File {
            field: &'a str,
            file_name: &'a str,
            content_type: &'a str,
            bytes: &'a [u8],
        },
    }

    fn png_part(bytes: &[u8]) -> Part<'_> {
        Part::File {
            field: "image",
            file_name: "lake.png",
            content_type: "image/png",
            bytes,
        }
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File {
                    field,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    struct TestApp {
        _temp: TempDir,
        public_dir: std::path::PathBuf,
        router: Router,
    }

    impl TestApp {
        async fn new() -> Self {
            Self::with_config(ServerConfig::from_env_values(None, None, None).unwrap()).await
        }

        async fn with_config(server_cfg: ServerConfig) -> Self {
            let temp = TempDir::new().unwrap();
            let public_dir = temp.path().join("public");
            std::fs::create_dir_all(&public_dir).unwrap();
            std::fs::write(public_dir.join("index.html"), "<h1>Wallpapers</h1>").unwrap();

            let core_cfg = CoreConfig::new(temp.path().join("catalog.db"), public_dir.clone())
                .unwrap();
            let service = CatalogService::open(&core_cfg).await.unwrap();
            let router = router(AppState::new(service), &public_dir, &server_cfg);

            Self {
                _temp: temp,
                public_dir,
                router,
            }
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let body = response.into_body().collect().await.unwrap().to_bytes();
            (status, body.to_vec())
        }

        async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        async fn delete(&self, uri: &str) -> (StatusCode, Vec<u8>) {
            self.send(Request::delete(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn upload(&self, parts: &[Part<'_>]) -> (StatusCode, Vec<u8>) {
            let request = Request::post("/api/wallpapers")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(parts)))
                .unwrap();
            self.send(request).await
        }

        fn stored_file_count(&self) -> usize {
            std::fs::read_dir(self.public_dir.join("uploads"))
                .unwrap()
                .count()
        }
    }

    fn message(body: &[u8]) -> String {
        serde_json::from_slice::<MessageRes>(body).unwrap().message
    }

    fn wallpapers(body: &[u8]) -> Vec<WallpaperRes> {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/health").await;

        assert_eq!(status, StatusCode::OK);
        let res: HealthRes = serde_json::from_slice(&body).unwrap();
        assert!(res.ok);
    }

    #[tokio::test]
    async fn test_upload_list_and_serve_image() {
        let app = TestApp::new().await;

        let (status, body) = app
            .upload(&[
                Part::Text("name", "Mountain Lake"),
                Part::Text("tags", " nature, , Water "),
                png_part(PNG_BYTES),
            ])
            .await;

        assert_eq!(status, StatusCode::CREATED);
        let created: WallpaperRes = serde_json::from_slice(&body).unwrap();
        assert_eq!(created.name, "Mountain Lake");
        assert_eq!(created.tags, vec!["nature", "Water"]);
        assert_eq!(created.file_size, PNG_BYTES.len() as u64);
        assert_eq!(created.mime_type, "image/png");

        let (status, body) = app.get("/api/wallpapers").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(wallpapers(&body), vec![created.clone()]);

        let (status, body) = app.get(&created.image_url).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, PNG_BYTES);
    }

    #[tokio::test]
    async fn test_search() {
        let app = TestApp::new().await;
        app.upload(&[
            Part::Text("name", "Mountain Lake"),
            Part::Text("tags", "nature"),
            png_part(PNG_BYTES),
        ])
        .await;
        app.upload(&[
            Part::Text("name", "Dark Forest"),
            Part::Text("tags", "Nature, trees"),
            png_part(PNG_BYTES),
        ])
        .await;

        let (status, body) = app.get("/api/wallpapers/search?q=lake").await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = wallpapers(&body).into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["Mountain Lake"]);

        let (_, body) = app.get("/api/wallpapers/search?q=NATURE").await;
        assert_eq!(wallpapers(&body).len(), 2);

        let (_, body) = app.get("/api/wallpapers/search?q=volcano").await;
        assert!(wallpapers(&body).is_empty());
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let app = TestApp::new().await;

        for uri in ["/api/wallpapers/search", "/api/wallpapers/search?q=%20%20"] {
            let (status, body) = app.get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(message(&body), "Search query is required");
        }
    }

    #[tokio::test]
    async fn test_repeated_search_query_is_json_400() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/api/wallpapers/search?q=a&q=b").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "Search query is required");
    }

    #[tokio::test]
    async fn test_search_matches_query_as_given() {
        let app = TestApp::new().await;
        app.upload(&[
            Part::Text("name", "Mountain Lake"),
            Part::Text("tags", "nature"),
            png_part(PNG_BYTES),
        ])
        .await;

        let (_, body) = app.get("/api/wallpapers/search?q=%20Lake").await;
        assert_eq!(wallpapers(&body).len(), 1);

        let (_, body) = app.get("/api/wallpapers/search?q=nature%20").await;
        assert!(wallpapers(&body).is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let app = TestApp::new().await;
        let (_, body) = app
            .upload(&[
                Part::Text("name", "Short-lived"),
                Part::Text("tags", "temp"),
                png_part(PNG_BYTES),
            ])
            .await;
        let created: WallpaperRes = serde_json::from_slice(&body).unwrap();
        let uri = format!("/api/wallpapers/{}", created.id);

        let (status, body) = app.delete(&uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(message(&body), "Wallpaper deleted successfully");
        assert_eq!(app.stored_file_count(), 0);

        let (status, body) = app.delete(&uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message(&body), "Wallpaper not found");
    }

    #[tokio::test]
    async fn test_delete_non_numeric_id_is_not_found() {
        let app = TestApp::new().await;

        let (status, body) = app.delete("/api/wallpapers/abc").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message(&body), "Wallpaper not found");
    }

    #[tokio::test]
    async fn test_upload_rejections_leave_nothing_behind() {
        let app = TestApp::new().await;
        let too_big = vec![0u8; MAX_FILE_SIZE_BYTES as usize + 1];

        let cases: Vec<(Vec<Part<'_>>, &str)> = vec![
            (
                vec![Part::Text("name", "a"), Part::Text("tags", "b")],
                "No image file provided",
            ),
            (
                vec![Part::Text("tags", "b"), png_part(PNG_BYTES)],
                "Name and tags are required",
            ),
            (
                vec![
                    Part::Text("name", "a"),
                    Part::Text("tags", " , "),
                    png_part(PNG_BYTES),
                ],
                "At least one tag is required",
            ),
            (
                vec![
                    Part::Text("name", "a"),
                    Part::Text("tags", "   "),
                    png_part(PNG_BYTES),
                ],
                "At least one tag is required",
            ),
            (
                vec![
                    Part::Text("name", "a"),
                    Part::Text("tags", "b"),
                    Part::File {
                        field: "image",
                        file_name: "clip.mp4",
                        content_type: "video/mp4",
                        bytes: PNG_BYTES,
                    },
                ],
                "Only image files are allowed!",
            ),
            (
                vec![
                    Part::Text("name", "a"),
                    Part::Text("tags", "b"),
                    png_part(&too_big),
                ],
                "File size too large. Maximum size is 10MB.",
            ),
        ];

        for (parts, expected) in cases {
            let (status, body) = app.upload(&parts).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{expected}");
            assert_eq!(message(&body), expected);
        }

        let (_, body) = app.get("/api/wallpapers").await;
        assert!(wallpapers(&body).is_empty());
        assert_eq!(app.stored_file_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_without_multipart_body() {
        let app = TestApp::new().await;
        let request = Request::post("/api/wallpapers")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"a","tags":"b"}"#))
            .unwrap();

        let (status, body) = app.send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&body), "No image file provided");
    }

    #[tokio::test]
    async fn test_unknown_api_route_is_json_404() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/api/nothing-here").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message(&body), "Not found");
    }

    #[tokio::test]
    async fn test_wrong_method_on_api_route_is_json_405() {
        let app = TestApp::new().await;

        for (method, uri) in [
            (Method::PUT, "/api/wallpapers"),
            (Method::POST, "/api/wallpapers/search"),
            (Method::GET, "/api/wallpapers/1"),
        ] {
            let request = Request::builder()
                .method(method.clone())
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let (status, body) = app.send(request).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
            assert_eq!(message(&body), "Method not allowed");
        }
    }

    #[tokio::test]
    async fn test_hidden_files_are_not_served() {
        let app = TestApp::new().await;
        std::fs::write(app.public_dir.join(".secret"), "hidden").unwrap();
        std::fs::create_dir_all(app.public_dir.join("uploads")).unwrap();
        std::fs::write(app.public_dir.join("uploads/.keep"), "hidden").unwrap();

        for uri in ["/.secret", "/uploads/.keep", "/%2Esecret"] {
            let (status, body) = app.get(uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(message(&body), "Not found");
        }

        let (status, _) = app.get("/index.html").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protective_headers_on_every_response() {
        let app = TestApp::new().await;

        for uri in ["/health", "/index.html", "/api/nothing-here", "/api/wallpapers"] {
            let request = Request::get(uri).body(Body::empty()).unwrap();
            let response = app.router.clone().oneshot(request).await.unwrap();
            let headers = response.headers();

            assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff", "{uri}");
            assert_eq!(headers[header::X_FRAME_OPTIONS], "SAMEORIGIN", "{uri}");
            assert_eq!(headers[header::REFERRER_POLICY], "no-referrer", "{uri}");
            assert_eq!(headers["cross-origin-resource-policy"], "same-origin", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_per_client_and_json() {
        let cfg = ServerConfig::from_env_values(None, None, None)
            .unwrap()
            .with_rate_limit(2, Duration::from_secs(60));
        let app = TestApp::with_config(cfg).await;

        let from = |peer: &str| {
            let mut request = Request::get("/api/wallpapers").body(Body::empty()).unwrap();
            request
                .extensions_mut()
                .insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
            request
        };

        for _ in 0..2 {
            let (status, _) = app.send(from("192.0.2.1:5000")).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = app.send(from("192.0.2.1:5001")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(message(&body), "Too many requests, please try again later.");

        let (status, _) = app.send(from("192.0.2.2:5000")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_index_served() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<h1>Wallpapers</h1>");
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let app = TestApp::new().await;
        let request = Request::get("/api/wallpapers")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );
    }

    #[tokio::test]
    async fn test_openapi_document_served() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/api-docs/openapi.json").await;

        assert_eq!(status, StatusCode::OK);
        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"]["/api/wallpapers"].is_object());
        assert_eq!(
            doc["components"]["schemas"]["WallpaperRes"]["properties"]["tags"]["example"],
            serde_json::json!(["nature", "water"])
        );
    }
}
