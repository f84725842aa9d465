//! Notification API handlers.
//!
//! ```text
//! POST   /api/v1/notifications              send to one user (admin/trainer)
//! POST   /api/v1/notifications/role         fan out to a role (admin/trainer)
//! GET    /api/v1/notifications              caller's feed, newest first
//! POST   /api/v1/notifications/{id}/read    mark one read
//! POST   /api/v1/notifications/read-all     mark all read
//! GET    /api/v1/admin/notifications        system-wide window (admin)
//! DELETE /api/v1/admin/notifications/{id}   hard delete (admin)
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::FanOutReport;
use crate::domain::{
    Error, Notification, NotificationChannel, NotificationDraft, NotificationId,
    NotificationValidationError, Role, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::{require_account, require_admin, require_sender};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Request body for `POST /api/v1/notifications`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    /// Recipient id.
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationChannel,
}

/// Request body for `POST /api/v1/notifications/role`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendToRoleRequest {
    /// Role whose members receive independent copies.
    pub role: Role,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationChannel,
}

/// Response body for `POST /api/v1/notifications/read-all`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadAllResponse {
    /// Number of rows flipped to read.
    pub updated: u64,
}

fn map_validation_error(error: NotificationValidationError) -> Error {
    let field = match &error {
        NotificationValidationError::EmptyTitle
        | NotificationValidationError::TitleTooLong { .. } => "title",
        NotificationValidationError::MessageTooLong { .. } => "message",
        NotificationValidationError::UnknownChannel { .. } => "notificationType",
    };
    Error::invalid_request(error.to_string()).with_details(json!({ "field": field }))
}

/// Send a notification to a single user.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = SendNotificationRequest,
    responses(
        (status = 201, description = "Notification stored", body = Notification),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller may not send notifications", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "sendNotification"
)]
#[post("/notifications")]
pub async fn send_notification(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SendNotificationRequest>,
) -> ApiResult<HttpResponse> {
    require_sender(state.directory.as_ref(), &session).await?;

    let body = payload.into_inner();
    let recipient = UserId::new(&body.user_id)
        .map_err(|error| Error::invalid_request(format!("userId: {error}")))?;
    let draft = NotificationDraft::new(recipient, body.title, body.message, body.notification_type)
        .map_err(map_validation_error)?;

    let stored = state.commands.send_to_user(draft).await?;
    Ok(HttpResponse::Created().json(stored))
}

/// Fan a notification out to every member of a role.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/role",
    request_body = SendToRoleRequest,
    responses(
        (status = 200, description = "Fan-out outcome, including partial failures", body = FanOutReport),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Caller may not send notifications", body = Error),
        (status = 503, description = "Store or directory unavailable", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "sendNotificationToRole"
)]
#[post("/notifications/role")]
pub async fn send_to_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SendToRoleRequest>,
) -> ApiResult<web::Json<FanOutReport>> {
    require_sender(state.directory.as_ref(), &session).await?;

    let body = payload.into_inner();
    let report = state
        .commands
        .send_to_role(body.role, body.title, body.message, body.notification_type)
        .await?;
    Ok(web::Json(report))
}

/// The caller's recent notifications, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "Recent notifications, newest first", body = [Notification]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Notification>>> {
    let account = require_account(state.directory.as_ref(), &session).await?;
    let feed = state.queries.list_for_user(&account.id).await?;
    Ok(web::Json(feed))
}

/// Mark one of the caller's notifications read.
///
/// Ids the caller does not own, and ids that no longer exist, succeed as
/// no-ops; the read flag only ever moves one way and retries are harmless.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Read state applied (or already applied)"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[post("/notifications/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let account = require_account(state.directory.as_ref(), &session).await?;
    let id = NotificationId::from_uuid(path.into_inner());
    state.commands.mark_read(&account.id, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Mark all of the caller's notifications read.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "Count of rows flipped", body = ReadAllResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[post("/notifications/read-all")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ReadAllResponse>> {
    let account = require_account(state.directory.as_ref(), &session).await?;
    let updated = state.commands.mark_all_read(&account.id).await?;
    Ok(web::Json(ReadAllResponse { updated }))
}

/// The recent system-wide notification window.
#[utoipa::path(
    get,
    path = "/api/v1/admin/notifications",
    responses(
        (status = 200, description = "Recent notifications across all users", body = [Notification]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["admin"],
    operation_id = "listAllNotifications"
)]
#[get("/admin/notifications")]
pub async fn list_all_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<Notification>>> {
    require_admin(state.directory.as_ref(), &session).await?;
    let rows = state.queries.list_all().await?;
    Ok(web::Json(rows))
}

/// Hard-delete a notification.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Notification removed (or already gone)"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["admin"],
    operation_id = "deleteNotification"
)]
#[delete("/admin/notifications/{id}")]
pub async fn delete_notification(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    require_admin(state.directory.as_ref(), &session).await?;
    let id = NotificationId::from_uuid(path.into_inner());
    if !state.commands.delete(&id).await? {
        debug!(notification_id = %id.as_uuid(), "delete was a no-op");
    }
    Ok(HttpResponse::NoContent().finish())
}
