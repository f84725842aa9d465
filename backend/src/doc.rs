//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: All HTTP endpoints from the inbound layer (auth,
//!   notifications, health)
//! - **Schemas**: Domain and request/response types deriving `ToSchema`
//! - **Security**: Session cookie authentication scheme
//!
//! The generated specification is served by Swagger UI in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{FanOutFailure, FanOutReport};
use crate::domain::{Error, ErrorCode, Notification, NotificationChannel, NotificationId, Role};
use crate::inbound::http::auth::{LoginRequest, LoginResponse};
use crate::inbound::http::notifications::{
    ReadAllResponse, SendNotificationRequest, SendToRoleRequest,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Gym notifications API",
        description = "HTTP interface for member notifications, role fan-out, and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::notifications::send_notification,
        crate::inbound::http::notifications::send_to_role,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::notifications::mark_all_read,
        crate::inbound::http::notifications::list_all_notifications,
        crate::inbound::http::notifications::delete_notification,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Notification,
        NotificationChannel,
        NotificationId,
        Role,
        FanOutReport,
        FanOutFailure,
        LoginRequest,
        LoginResponse,
        SendNotificationRequest,
        SendToRoleRequest,
        ReadAllResponse,
    )),
    tags(
        (name = "auth", description = "Session login and logout"),
        (name = "notifications", description = "Notification feeds and delivery"),
        (name = "admin", description = "Administrative notification management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
