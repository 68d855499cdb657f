//! Harness for driving the full router in-process.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pulse_analytics::InMemoryMetricStore;
use pulse_api::{ApiServer, Services};
use pulse_core::config::AppConfig;
use pulse_core::Role;
use pulse_management::PasswordHasher;
use serde_json::{json, Value};
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PASSWORD: &str = "s3cret-pass";

pub struct TestApp {
    pub router: Router,
    pub services: Services,
    pub records: Arc<InMemoryMetricStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let records = Arc::new(InMemoryMetricStore::new());
        let services = Services::new(config, records.clone())
            .with_hasher(PasswordHasher::with_params(8, 1, 1).unwrap());
        let router = ApiServer::new(services.clone()).router();
        Self {
            router,
            services,
            records,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.send(request(method, uri, token, Some(body))).await
    }

    /// Register an account and return its bearer token.
    pub async fn register(&self, email: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/auth/register",
                None,
                json!({ "email": email, "password": PASSWORD, "firstName": "Test" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Register, promote to admin, and log in again so the session carries
    /// the new role.
    pub async fn admin(&self, email: &str) -> String {
        self.register(email).await;
        let user = self.services.directory.find_user_by_email(email).unwrap();
        self.services.directory.set_role(user.id, Role::Admin).unwrap();
        let (status, body) = self
            .json(
                Method::POST,
                "/api/auth/login",
                None,
                json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn upload(&self, token: &str, content_type: &str, bytes: &[u8]) -> (StatusCode, Value) {
        self.send(multipart_request(token, "file", content_type, bytes)).await
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

pub fn multipart_request(token: &str, field: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "pulse-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"metrics.xlsx\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/api/upload/excel")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// One-sheet workbook: header row then one row per `(date, sales,
/// performance)` triple. Dates are text in `DD-MM-YYYY`.
pub fn sales_workbook(rows: &[(String, f64, f64)]) -> Vec<u8> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
    for (c, name) in ["date", "sales", "newClients", "activeUsers", "performance"]
        .iter()
        .enumerate()
    {
        sheet.get_cell_mut((c as u32 + 1, 1)).set_value_string(*name);
    }
    for (r, (date, sales, performance)) in rows.iter().enumerate() {
        let row = r as u32 + 2;
        sheet.get_cell_mut((1, row)).set_value_string(date.as_str());
        sheet.get_cell_mut((2, row)).set_value_number(*sales);
        sheet.get_cell_mut((3, row)).set_value_number(1.0);
        sheet.get_cell_mut((4, row)).set_value_number(10.0);
        sheet.get_cell_mut((5, row)).set_value_number(*performance);
    }
    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out).unwrap();
    out.into_inner()
}
