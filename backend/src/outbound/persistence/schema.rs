//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations exactly; Diesel uses them for
//! compile-time query validation. Regenerate with `diesel print-schema` when
//! migrations change.

diesel::table! {
    /// Registered gym members and staff.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Name shown in notification greetings and admin listings.
        display_name -> Varchar,
        /// Address targeted by the email side channel.
        email -> Varchar,
        /// Application role: `admin`, `trainer`, or `client`.
        role -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-recipient notification rows; fan-out writes one row per user.
    notifications (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning recipient (FK to users.id).
        user_id -> Uuid,
        /// Short heading, at most 200 characters.
        title -> Varchar,
        /// Body text, at most 4000 characters.
        message -> Text,
        /// Delivery channel: `app`, `email`, or `both`.
        notification_type -> Varchar,
        /// Read flag; only ever flips false to true.
        read -> Bool,
        /// Creation timestamp; listings order by this, descending.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(notifications -> users (user_id));
diesel::allow_tables_to_appear_in_same_query!(notifications, users);
