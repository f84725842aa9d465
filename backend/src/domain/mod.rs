//! Domain layer: entities, ports, and the services behind them.
//!
//! Everything here is transport- and storage-agnostic. Inbound adapters
//! (HTTP, WebSocket) drive the [`ports`] traits; outbound adapters
//! (persistence, email, realtime) implement them.

pub mod delivery;
pub mod error;
pub mod feed;
pub mod notification;
pub mod ports;
pub mod user;

pub use delivery::NotificationDeliveryService;
pub use error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use feed::{FeedError, NotificationFeed, RefreshOutcome, RefreshTicket};
pub use notification::{
    MAX_MESSAGE_LEN, MAX_TITLE_LEN, Notification, NotificationChannel, NotificationDraft,
    NotificationEvent, NotificationId, NotificationValidationError,
};
pub use user::{EmailAddress, Role, UserAccount, UserId, UserValidationError};

/// Result alias for operations surfacing the domain error envelope.
pub type ApiResult<T> = Result<T, Error>;
