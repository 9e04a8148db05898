// ABOUTME: Admin route handlers for the record browser and bulk record operations
// ABOUTME: Every route sits behind the HTTP Basic-Auth guard
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse},
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};

use crate::admin::{AdminAuthService, AdminPrincipal, AdminService, AdminSnapshot};
use crate::errors::{AppError, AppResult};
use crate::middleware::admin_guard::require_admin;

/// Admin routes implementation
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes, guarded by Basic authentication
    pub fn routes(service: AdminService, auth: AdminAuthService) -> Router {
        Router::new()
            .route("/admin", get(handle_admin_page))
            .route("/admin/data", get(handle_list_data))
            .route("/admin/invites", post(handle_create_invite))
            .route("/admin/:collection/:id", patch(handle_patch_record))
            .with_state(Arc::new(service))
            .layer(middleware::from_fn_with_state(auth, require_admin))
    }
}

/// Parse a JSON request body, reporting syntax errors as 400
fn parse_body(body: &Bytes) -> AppResult<Value> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_input(format!("Malformed JSON body: {e}")))
}

async fn handle_admin_page(Extension(_admin): Extension<AdminPrincipal>) -> Html<&'static str> {
    Html(ADMIN_PAGE)
}

async fn handle_list_data(
    State(service): State<Arc<AdminService>>,
    Extension(admin): Extension<AdminPrincipal>,
) -> AppResult<Json<AdminSnapshot>> {
    Ok(Json(service.list_all(&admin).await?))
}

async fn handle_create_invite(
    State(service): State<Arc<AdminService>>,
    Extension(admin): Extension<AdminPrincipal>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let id = service.create_invite(&admin, parse_body(&body)?).await?;
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "id": id }))))
}

async fn handle_patch_record(
    State(service): State<Arc<AdminService>>,
    Extension(admin): Extension<AdminPrincipal>,
    Path((collection, id)): Path<(String, String)>,
    body: Bytes,
) -> AppResult<Json<Value>> {
    service
        .patch_record(&admin, &collection, &id, parse_body(&body)?)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

/// Record browser; loads data from `admin/data` with the browser's cached credentials
const ADMIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>RSVP Admin</title>
<style>
body { font-family: system-ui, sans-serif; margin: 2rem; }
table { border-collapse: collapse; margin-bottom: 2rem; }
th, td { border: 1px solid #ccc; padding: 0.25rem 0.5rem; text-align: left; }
</style>
</head>
<body>
<h1>RSVP Admin</h1>
<h2>Invites</h2>
<table id="invites"></table>
<h2>Responses</h2>
<table id="responses"></table>
<script>
function render(id, rows) {
  const table = document.getElementById(id);
  const keys = [...new Set(rows.flatMap(Object.keys))];
  const head = "<tr>" + keys.map(k => "<th>" + k + "</th>").join("") + "</tr>";
  const body = rows.map(r =>
    "<tr>" + keys.map(k => "<td>" + (r[k] ?? "") + "</td>").join("") + "</tr>").join("");
  table.innerHTML = head + body;
}
fetch("admin/data", { credentials: "same-origin" })
  .then(r => r.json())
  .then(d => { render("invites", d.invites); render("responses", d.responses); });
</script>
</body>
</html>
"#;
