//! Session establishment and role checks for the HTTP surface.
//!
//! ```text
//! POST /api/v1/login  {"userId":"3fa85f64-..."}
//! POST /api/v1/logout
//! ```
//!
//! Identity verification proper lives outside this service; login accepts a
//! directory-known user id and binds it to a session cookie. Role checks
//! always resolve the role through the directory at request time rather
//! than trusting anything stored client-side.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{Error, Role, UserAccount, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Directory identifier of the user logging in.
    pub user_id: String,
}

/// Profile returned on successful login.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: UserId,
    pub display_name: String,
    pub role: Role,
}

pub(crate) fn map_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { .. } => {
            Error::service_unavailable("user directory is unavailable")
        }
        UserDirectoryError::Query { .. } => Error::internal(format!("directory query: {error}")),
    }
}

/// Resolve the session's user through the directory.
///
/// A session naming a user the directory no longer knows is treated as
/// unauthenticated, not as an internal error; stale cookies outlive account
/// deletion.
pub(crate) async fn require_account(
    directory: &dyn UserDirectory,
    session: &SessionContext,
) -> ApiResult<UserAccount> {
    let user_id = session.require_user_id()?;
    directory
        .find(&user_id)
        .await
        .map_err(map_directory_error)?
        .ok_or_else(|| Error::unauthorized("login required"))
}

/// Require a role allowed to send notifications (admin or trainer).
pub(crate) async fn require_sender(
    directory: &dyn UserDirectory,
    session: &SessionContext,
) -> ApiResult<UserAccount> {
    let account = require_account(directory, session).await?;
    if !account.role.may_send_notifications() {
        return Err(Error::forbidden("sending notifications requires an admin or trainer role"));
    }
    Ok(account)
}

/// Require the admin role.
pub(crate) async fn require_admin(
    directory: &dyn UserDirectory,
    session: &SessionContext,
) -> ApiResult<UserAccount> {
    let account = require_account(directory, session).await?;
    if account.role != Role::Admin {
        return Err(Error::forbidden("admin role required"));
    }
    Ok(account)
}

/// Bind a directory-known user to a session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse,
         headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unknown user", body = Error),
        (status = 503, description = "Directory unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let user_id = UserId::new(&payload.user_id)
        .map_err(|error| Error::invalid_request(format!("userId: {error}")))?;

    let account = state
        .directory
        .find(&user_id)
        .await
        .map_err(map_directory_error)?
        .ok_or_else(|| Error::unauthorized("unknown user"))?;

    session.persist_user(&account.id)?;
    Ok(web::Json(LoginResponse {
        id: account.id,
        display_name: account.display_name,
        role: account.role,
    }))
}

/// Drop the caller's session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmailAddress;
    use crate::domain::ports::{
        FixtureNotificationCommand, FixtureNotificationQuery, MockUserDirectory,
    };
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn account(id: &UserId, role: Role) -> UserAccount {
        UserAccount {
            id: id.clone(),
            display_name: "Jo Trainer".to_owned(),
            email: EmailAddress::new("jo@gym.example").expect("fixture email"),
            role,
        }
    }

    fn test_app(
        directory: MockUserDirectory,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let state = HttpState::new(
            Arc::new(FixtureNotificationCommand),
            Arc::new(FixtureNotificationQuery),
            Arc::new(directory),
        );
        App::new()
            .app_data(web::Data::new(state))
            .wrap(crate::inbound::http::test_utils::test_session_middleware())
            .service(web::scope("/api/v1").service(login).service(logout))
    }

    #[actix_web::test]
    async fn login_persists_session_for_known_user() {
        let user_id = UserId::random();
        let found = account(&user_id, Role::Trainer);

        let mut directory = MockUserDirectory::new();
        directory
            .expect_find()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));

        let app = actix_test::init_service(test_app(directory)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({ "userId": user_id.to_string() }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .response()
                .cookies()
                .any(|cookie| cookie.name() == "session"),
            "login must set a session cookie"
        );
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body.get("role").and_then(Value::as_str), Some("trainer"));
        assert_eq!(
            body.get("displayName").and_then(Value::as_str),
            Some("Jo Trainer")
        );
    }

    #[actix_web::test]
    async fn login_rejects_unknown_user() {
        let mut directory = MockUserDirectory::new();
        directory.expect_find().times(1).returning(|_| Ok(None));

        let app = actix_test::init_service(test_app(directory)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({ "userId": UserId::random().to_string() }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn login_rejects_malformed_user_id() {
        let directory = MockUserDirectory::new();
        let app = actix_test::init_service(test_app(directory)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({ "userId": "not-a-uuid" }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn login_maps_directory_outage_to_service_unavailable() {
        let mut directory = MockUserDirectory::new();
        directory
            .expect_find()
            .times(1)
            .returning(|_| Err(UserDirectoryError::connection("refused")));

        let app = actix_test::init_service(test_app(directory)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(json!({ "userId": UserId::random().to_string() }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
