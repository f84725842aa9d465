//! Notification delivery service.
//!
//! Implements the driving ports: single-recipient sends with a best-effort
//! email side effect, independent per-user role fan-out, owner-scoped read
//! transitions, and admin deletes. Every successful insert is pushed to the
//! recipient's realtime stream; read transitions push a refresh signal so
//! other sessions reconcile against the store instead of merging deltas.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::ports::{
    ADMIN_FEED_LIMIT, EmailRequest, EmailSender, FanOutFailure, FanOutReport, NotificationCommand,
    NotificationPublisher, NotificationQuery, NotificationRepository, NotificationRepositoryError,
    USER_FEED_LIMIT, UserDirectory, UserDirectoryError,
};
use crate::domain::{
    Error, Notification, NotificationChannel, NotificationDraft, NotificationEvent,
    NotificationId, NotificationValidationError, Role, UserId,
};

/// Delivery service wiring the store, directory, email channel, and realtime
/// publisher together behind the driving ports.
pub struct NotificationDeliveryService<R: ?Sized, D: ?Sized, E: ?Sized> {
    repository: Arc<R>,
    directory: Arc<D>,
    email: Arc<E>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl<R: ?Sized, D: ?Sized, E: ?Sized> Clone for NotificationDeliveryService<R, D, E> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            directory: self.directory.clone(),
            email: self.email.clone(),
            publisher: self.publisher.clone(),
        }
    }
}

impl<R: ?Sized, D: ?Sized, E: ?Sized> NotificationDeliveryService<R, D, E> {
    /// Create a new service over the given port implementations.
    pub fn new(
        repository: Arc<R>,
        directory: Arc<D>,
        email: Arc<E>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            repository,
            directory,
            email,
            publisher,
        }
    }
}

fn map_repository_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification store unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification store error: {message}"))
        }
        NotificationRepositoryError::Constraint { message } => {
            Error::invalid_request(format!("notification rejected: {message}"))
        }
    }
}

fn map_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}

fn map_validation_error(error: NotificationValidationError) -> Error {
    Error::invalid_request(error.to_string())
}

impl<R, D, E> NotificationDeliveryService<R, D, E>
where
    R: NotificationRepository + ?Sized,
    D: UserDirectory + ?Sized,
    E: EmailSender + ?Sized,
{
    /// Insert one row, push it to the recipient's stream, and fire the email
    /// side channel when the draft asks for it.
    async fn deliver(&self, draft: &NotificationDraft) -> Result<Notification, Error> {
        let stored = self
            .repository
            .insert(draft)
            .await
            .map_err(map_repository_error)?;

        self.publisher
            .publish(&stored.user_id, NotificationEvent::Created(stored.clone()));

        if stored.channel.includes_email() {
            self.send_email_best_effort(&stored).await;
        }

        Ok(stored)
    }

    /// Email is at-most-once and never disturbs the persisted notification:
    /// lookup and send failures are logged and swallowed here.
    async fn send_email_best_effort(&self, notification: &Notification) {
        let account = match self.directory.find(&notification.user_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                warn!(
                    notification_id = %notification.id,
                    user_id = %notification.user_id,
                    "email skipped: recipient not found in directory"
                );
                return;
            }
            Err(error) => {
                warn!(
                    notification_id = %notification.id,
                    user_id = %notification.user_id,
                    error = %error,
                    "email skipped: recipient lookup failed"
                );
                return;
            }
        };

        let request = EmailRequest {
            to: account.email,
            title: notification.title.clone(),
            message: notification.message.clone(),
            notification_id: Some(notification.id),
        };

        match self.email.send(&request).await {
            Ok(receipt) => {
                debug!(
                    notification_id = %notification.id,
                    provider_id = receipt.provider_id.as_deref().unwrap_or("-"),
                    "email dispatched"
                );
            }
            Err(error) => {
                warn!(
                    notification_id = %notification.id,
                    error = %error,
                    "email send failed; notification remains delivered in-app"
                );
            }
        }
    }
}

#[async_trait]
impl<R, D, E> NotificationCommand for NotificationDeliveryService<R, D, E>
where
    R: NotificationRepository + ?Sized,
    D: UserDirectory + ?Sized,
    E: EmailSender + ?Sized,
{
    async fn send_to_user(&self, draft: NotificationDraft) -> Result<Notification, Error> {
        self.deliver(&draft).await
    }

    async fn send_to_role(
        &self,
        role: Role,
        title: String,
        message: String,
        channel: NotificationChannel,
    ) -> Result<FanOutReport, Error> {
        NotificationDraft::validate_content(&title, &message).map_err(map_validation_error)?;

        let members = self
            .directory
            .users_with_role(role)
            .await
            .map_err(map_directory_error)?;

        let requested = members.len();
        let mut delivered = Vec::with_capacity(requested);
        let mut failed = Vec::new();

        for member in members {
            let draft = match NotificationDraft::new(
                member.id.clone(),
                title.clone(),
                message.clone(),
                channel,
            ) {
                Ok(draft) => draft,
                Err(error) => {
                    failed.push(FanOutFailure {
                        user_id: member.id,
                        reason: error.to_string(),
                    });
                    continue;
                }
            };

            match self.deliver(&draft).await {
                Ok(stored) => delivered.push(stored.id),
                Err(error) => {
                    warn!(
                        user_id = %draft.user_id(),
                        role = %role,
                        error = %error,
                        "fan-out insert failed; continuing with remaining recipients"
                    );
                    failed.push(FanOutFailure {
                        user_id: draft.user_id().clone(),
                        reason: error.message().to_owned(),
                    });
                }
            }
        }

        Ok(FanOutReport {
            role,
            requested,
            delivered,
            failed,
        })
    }

    async fn mark_read(&self, owner: &UserId, id: &NotificationId) -> Result<(), Error> {
        let changed = self
            .repository
            .mark_read(owner, id)
            .await
            .map_err(map_repository_error)?;

        if changed {
            self.publisher.publish(owner, NotificationEvent::Refresh);
        } else {
            // Unknown id or already read. The surface stays a silent no-op;
            // the log line is the audit trail.
            debug!(owner = %owner, notification_id = %id, "mark_read had no effect");
        }

        Ok(())
    }

    async fn mark_all_read(&self, owner: &UserId) -> Result<u64, Error> {
        let changed = self
            .repository
            .mark_all_read_for_user(owner)
            .await
            .map_err(map_repository_error)?;

        if changed > 0 {
            self.publisher.publish(owner, NotificationEvent::Refresh);
        }

        Ok(changed)
    }

    async fn delete(&self, id: &NotificationId) -> Result<bool, Error> {
        // The change stream carries inserts and updates only; deletions are
        // observed on the next refresh.
        self.repository
            .delete(id)
            .await
            .map_err(map_repository_error)
    }
}

#[async_trait]
impl<R, D, E> NotificationQuery for NotificationDeliveryService<R, D, E>
where
    R: NotificationRepository + ?Sized,
    D: UserDirectory + ?Sized,
    E: EmailSender + ?Sized,
{
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, Error> {
        self.repository
            .list_for_user(user_id, USER_FEED_LIMIT)
            .await
            .map_err(map_repository_error)
    }

    async fn list_all(&self) -> Result<Vec<Notification>, Error> {
        self.repository
            .list_all(ADMIN_FEED_LIMIT)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        EmailReceipt, EmailSenderError, MockEmailSender, MockNotificationPublisher,
        MockNotificationRepository, MockUserDirectory,
    };
    use crate::domain::{EmailAddress, ErrorCode, UserAccount};
    use chrono::Utc;
    use mockall::predicate;

    fn account(role: Role) -> UserAccount {
        UserAccount {
            id: UserId::random(),
            display_name: "Sam".to_owned(),
            email: EmailAddress::new("sam@gym.example").expect("address is valid"),
            role,
        }
    }

    fn stored_from(draft: &NotificationDraft) -> Notification {
        Notification {
            id: NotificationId::random(),
            user_id: draft.user_id().clone(),
            title: draft.title().to_owned(),
            message: draft.message().to_owned(),
            channel: draft.channel(),
            read: false,
            created_at: Utc::now(),
        }
    }

    fn service(
        repository: MockNotificationRepository,
        directory: MockUserDirectory,
        email: MockEmailSender,
        publisher: MockNotificationPublisher,
    ) -> NotificationDeliveryService<
        MockNotificationRepository,
        MockUserDirectory,
        MockEmailSender,
    > {
        NotificationDeliveryService::new(
            Arc::new(repository),
            Arc::new(directory),
            Arc::new(email),
            Arc::new(publisher),
        )
    }

    #[tokio::test]
    async fn app_channel_send_never_touches_email_ports() {
        let draft = NotificationDraft::new(
            UserId::random(),
            "Welcome",
            "Your membership is active.",
            NotificationChannel::App,
        )
        .expect("draft is valid");
        let stored = stored_from(&draft);
        let stored_for_repo = stored.clone();

        let mut repository = MockNotificationRepository::new();
        repository
            .expect_insert()
            .times(1)
            .returning(move |_| Ok(stored_for_repo.clone()));

        let mut publisher = MockNotificationPublisher::new();
        let expected_owner = stored.user_id.clone();
        publisher
            .expect_publish()
            .withf(move |owner, event| {
                *owner == expected_owner && matches!(event, NotificationEvent::Created(_))
            })
            .times(1)
            .return_const(());

        let directory = MockUserDirectory::new();
        let email = MockEmailSender::new();

        let result = service(repository, directory, email, publisher)
            .send_to_user(draft)
            .await
            .expect("send succeeds");
        assert_eq!(result.id, stored.id);
    }

    #[tokio::test]
    async fn email_lookup_failure_keeps_the_stored_notification() {
        let draft = NotificationDraft::new(
            UserId::random(),
            "Invoice",
            "Your invoice is ready.",
            NotificationChannel::Email,
        )
        .expect("draft is valid");
        let stored = stored_from(&draft);
        let stored_for_repo = stored.clone();

        let mut repository = MockNotificationRepository::new();
        repository
            .expect_insert()
            .times(1)
            .returning(move |_| Ok(stored_for_repo.clone()));

        let mut directory = MockUserDirectory::new();
        directory
            .expect_find()
            .times(1)
            .returning(|_| Err(UserDirectoryError::query("directory offline")));

        // The adapter must never be invoked when the lookup fails.
        let email = MockEmailSender::new();

        let mut publisher = MockNotificationPublisher::new();
        publisher.expect_publish().times(1).return_const(());

        let result = service(repository, directory, email, publisher)
            .send_to_user(draft)
            .await
            .expect("send succeeds despite lookup failure");
        assert_eq!(result.id, stored.id);
    }

    #[tokio::test]
    async fn email_send_failure_does_not_propagate() {
        let draft = NotificationDraft::new(
            UserId::random(),
            "Reminder",
            "Session tomorrow at 9.",
            NotificationChannel::Both,
        )
        .expect("draft is valid");
        let stored = stored_from(&draft);
        let stored_for_repo = stored.clone();
        let recipient = account(Role::Client);

        let mut repository = MockNotificationRepository::new();
        repository
            .expect_insert()
            .times(1)
            .returning(move |_| Ok(stored_for_repo.clone()));

        let mut directory = MockUserDirectory::new();
        directory
            .expect_find()
            .times(1)
            .returning(move |_| Ok(Some(recipient.clone())));

        let mut email = MockEmailSender::new();
        email
            .expect_send()
            .times(1)
            .returning(|_| Err(EmailSenderError::upstream("provider returned 500")));

        let mut publisher = MockNotificationPublisher::new();
        publisher.expect_publish().times(1).return_const(());

        let result = service(repository, directory, email, publisher)
            .send_to_user(draft)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn fan_out_continues_past_a_failed_insert() {
        let alice = account(Role::Client);
        let bob = account(Role::Client);
        let carol = account(Role::Client);
        let failing_id = bob.id.clone();
        let members = vec![alice.clone(), bob.clone(), carol.clone()];

        let mut directory = MockUserDirectory::new();
        directory
            .expect_users_with_role()
            .with(predicate::eq(Role::Client))
            .times(1)
            .returning(move |_| Ok(members.clone()));

        let mut repository = MockNotificationRepository::new();
        let failing_for_repo = failing_id.clone();
        repository.expect_insert().times(3).returning(move |draft| {
            if *draft.user_id() == failing_for_repo {
                Err(NotificationRepositoryError::query("insert failed"))
            } else {
                Ok(Notification {
                    id: NotificationId::random(),
                    user_id: draft.user_id().clone(),
                    title: draft.title().to_owned(),
                    message: draft.message().to_owned(),
                    channel: draft.channel(),
                    read: false,
                    created_at: Utc::now(),
                })
            }
        });

        let mut publisher = MockNotificationPublisher::new();
        publisher.expect_publish().times(2).return_const(());

        let email = MockEmailSender::new();

        let report = service(repository, directory, email, publisher)
            .send_to_role(
                Role::Client,
                "Holiday hours".to_owned(),
                "Closed on Monday.".to_owned(),
                NotificationChannel::App,
            )
            .await
            .expect("fan-out reports in aggregate");

        assert_eq!(report.requested, 3);
        assert_eq!(report.delivered.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed.first().map(|f| f.user_id.clone()), Some(failing_id));
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn fan_out_rejects_invalid_content_before_resolving_members() {
        let repository = MockNotificationRepository::new();
        let directory = MockUserDirectory::new();
        let email = MockEmailSender::new();
        let publisher = MockNotificationPublisher::new();

        let error = service(repository, directory, email, publisher)
            .send_to_role(
                Role::Client,
                "   ".to_owned(),
                "body".to_owned(),
                NotificationChannel::App,
            )
            .await
            .expect_err("blank title is rejected");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn mark_read_publishes_a_refresh_only_when_a_row_flipped() {
        let owner = UserId::random();
        let id = NotificationId::random();

        let mut repository = MockNotificationRepository::new();
        repository
            .expect_mark_read()
            .times(1)
            .returning(|_, _| Ok(true));

        let mut publisher = MockNotificationPublisher::new();
        let expected_owner = owner.clone();
        publisher
            .expect_publish()
            .withf(move |user, event| {
                *user == expected_owner && *event == NotificationEvent::Refresh
            })
            .times(1)
            .return_const(());

        service(
            repository,
            MockUserDirectory::new(),
            MockEmailSender::new(),
            publisher,
        )
        .mark_read(&owner, &id)
        .await
        .expect("mark_read succeeds");
    }

    #[tokio::test]
    async fn mark_read_on_unknown_id_is_a_silent_no_op() {
        let mut repository = MockNotificationRepository::new();
        repository
            .expect_mark_read()
            .times(1)
            .returning(|_, _| Ok(false));

        // No refresh is pushed when nothing changed.
        let publisher = MockNotificationPublisher::new();

        service(
            repository,
            MockUserDirectory::new(),
            MockEmailSender::new(),
            publisher,
        )
        .mark_read(&UserId::random(), &NotificationId::random())
        .await
        .expect("no-op mark_read still succeeds");
    }

    #[tokio::test]
    async fn mark_all_read_reports_the_store_count() {
        let mut repository = MockNotificationRepository::new();
        repository
            .expect_mark_all_read_for_user()
            .times(1)
            .returning(|_| Ok(2));

        let mut publisher = MockNotificationPublisher::new();
        publisher.expect_publish().times(1).return_const(());

        let changed = service(
            repository,
            MockUserDirectory::new(),
            MockEmailSender::new(),
            publisher,
        )
        .mark_all_read(&UserId::random())
        .await
        .expect("mark_all_read succeeds");
        assert_eq!(changed, 2);
    }

    #[tokio::test]
    async fn delete_is_idempotent_over_missing_rows() {
        let mut repository = MockNotificationRepository::new();
        repository.expect_delete().times(1).returning(|_| Ok(false));

        let existed = service(
            repository,
            MockUserDirectory::new(),
            MockEmailSender::new(),
            MockNotificationPublisher::new(),
        )
        .delete(&NotificationId::random())
        .await
        .expect("deleting a missing row is not an error");
        assert!(!existed);
    }

    #[tokio::test]
    async fn store_connection_failures_surface_as_service_unavailable() {
        let mut repository = MockNotificationRepository::new();
        repository
            .expect_list_for_user()
            .times(1)
            .returning(|_, _| Err(NotificationRepositoryError::connection("refused")));

        let error = service(
            repository,
            MockUserDirectory::new(),
            MockEmailSender::new(),
            MockNotificationPublisher::new(),
        )
        .list_for_user(&UserId::random())
        .await
        .expect_err("connection failure surfaces");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }

    #[tokio::test]
    async fn successful_email_send_records_the_receipt() {
        let draft = NotificationDraft::new(
            UserId::random(),
            "Welcome",
            "See you soon.",
            NotificationChannel::Email,
        )
        .expect("draft is valid");
        let stored = stored_from(&draft);
        let stored_for_repo = stored.clone();
        let recipient = account(Role::Client);

        let mut repository = MockNotificationRepository::new();
        repository
            .expect_insert()
            .times(1)
            .returning(move |_| Ok(stored_for_repo.clone()));

        let mut directory = MockUserDirectory::new();
        directory
            .expect_find()
            .times(1)
            .returning(move |_| Ok(Some(recipient.clone())));

        let expected_id = stored.id;
        let mut email = MockEmailSender::new();
        email
            .expect_send()
            .withf(move |request| request.notification_id == Some(expected_id))
            .times(1)
            .returning(|_| {
                Ok(EmailReceipt {
                    provider_id: Some("msg-42".to_owned()),
                })
            });

        let mut publisher = MockNotificationPublisher::new();
        publisher.expect_publish().times(1).return_const(());

        service(repository, directory, email, publisher)
            .send_to_user(draft)
            .await
            .expect("send succeeds");
    }
}
