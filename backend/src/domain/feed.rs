//! Client-held notification feed state.
//!
//! [`NotificationFeed`] is the reducer a connected client keeps between the
//! store and its view: fetched history, realtime inserts, and user actions
//! all merge here into one ordered collection with an incrementally
//! maintained unread count. The store stays authoritative; this state must
//! always be reconcilable with it by a refresh.
//!
//! Two failure modes of the source system are tightened here:
//! - overlapping refreshes carry a monotonic ticket, and a stale response
//!   can never overwrite a fresher one;
//! - optimistic mark-read flips are reverted when the store call fails, and
//!   the unread count is recomputed from the reverted entries.

use tracing::debug;

use crate::domain::ports::{
    NotificationRepository, NotificationRepositoryError, USER_FEED_LIMIT,
};
use crate::domain::{Notification, NotificationId, UserId};

/// Errors surfaced to feed callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    /// The backing store rejected or failed the operation.
    #[error("notification store failed: {0}")]
    Store(#[from] NotificationRepositoryError),
}

/// Token tying a refresh response back to the request that started it.
///
/// Only the most recently issued ticket may complete; anything older is a
/// stale in-flight response and gets discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    seq: u64,
}

/// Outcome of completing a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the feed contents.
    Applied,
    /// A newer refresh superseded this one; the response was dropped.
    Stale,
}

/// In-memory reducer over one user's notification feed.
#[derive(Debug, Default)]
pub struct NotificationFeed {
    notifications: Vec<Notification>,
    unread_count: usize,
    loading: bool,
    issued_seq: u64,
}

impl NotificationFeed {
    /// Empty feed, not loading.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entries, newest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Count of entries with `read == false`.
    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    /// Whether the most recently issued refresh is still in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start a refresh and obtain the ticket its response must present.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued_seq += 1;
        self.loading = true;
        RefreshTicket {
            seq: self.issued_seq,
        }
    }

    /// Apply a refresh response.
    ///
    /// Responses from superseded tickets are discarded without touching the
    /// feed. A failed fetch for the current ticket leaves prior entries
    /// intact and surfaces the error.
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<Notification>, NotificationRepositoryError>,
    ) -> Result<RefreshOutcome, FeedError> {
        if ticket.seq != self.issued_seq {
            debug!(
                ticket = ticket.seq,
                current = self.issued_seq,
                "discarding stale refresh response"
            );
            return Ok(RefreshOutcome::Stale);
        }

        self.loading = false;
        let rows = result?;
        self.unread_count = rows.iter().filter(|n| !n.read).count();
        self.notifications = rows;
        Ok(RefreshOutcome::Applied)
    }

    /// Fetch the full feed from the store and replace local state.
    ///
    /// This is also the handler for realtime update signals: updates carry
    /// no payload, so the response to one is a re-fetch of truth.
    pub async fn refresh(
        &mut self,
        store: &dyn NotificationRepository,
        user: &UserId,
    ) -> Result<(), FeedError> {
        let ticket = self.begin_refresh();
        let result = store.list_for_user(user, USER_FEED_LIMIT).await;
        self.complete_refresh(ticket, result).map(|_| ())
    }

    /// Merge a realtime insert.
    ///
    /// The event is prepended without re-sorting: realtime delivery is
    /// assumed to preserve recency, and entries sharing a timestamp keep
    /// their arrival order. An id already present locally (the echo of a
    /// row picked up by an interleaved refresh) is ignored.
    pub fn on_insert(&mut self, notification: Notification) {
        if self
            .notifications
            .iter()
            .any(|existing| existing.id == notification.id)
        {
            return;
        }
        if !notification.read {
            self.unread_count += 1;
        }
        self.notifications.insert(0, notification);
    }

    /// Mark one entry read, optimistically and with rollback.
    ///
    /// The local flip happens before the store call so the UI never waits on
    /// the network; if the store then fails, the flip is reverted and the
    /// unread count recomputed from the entries, keeping client and store
    /// reconcilable.
    pub async fn mark_read(
        &mut self,
        store: &dyn NotificationRepository,
        owner: &UserId,
        id: &NotificationId,
    ) -> Result<(), FeedError> {
        let flipped = self.flip_read(id);

        match store.mark_read(owner, id).await {
            Ok(_changed) => Ok(()),
            Err(error) => {
                if flipped {
                    self.unflip_read(id);
                }
                Err(FeedError::Store(error))
            }
        }
    }

    /// Mark every entry read, optimistically and with rollback.
    ///
    /// On success the store's authoritative changed-count is returned for
    /// display; on failure exactly the entries flipped here are reverted.
    pub async fn mark_all_read(
        &mut self,
        store: &dyn NotificationRepository,
        owner: &UserId,
    ) -> Result<u64, FeedError> {
        let flipped: Vec<NotificationId> = self
            .notifications
            .iter_mut()
            .filter(|n| !n.read)
            .map(|n| {
                n.read = true;
                n.id
            })
            .collect();
        self.unread_count = 0;

        match store.mark_all_read_for_user(owner).await {
            Ok(changed) => Ok(changed),
            Err(error) => {
                for id in &flipped {
                    self.unflip_read(id);
                }
                Err(FeedError::Store(error))
            }
        }
    }

    /// Flip one entry to read; returns whether anything changed.
    fn flip_read(&mut self, id: &NotificationId) -> bool {
        let Some(entry) = self
            .notifications
            .iter_mut()
            .find(|n| n.id == *id && !n.read)
        else {
            return false;
        };
        entry.read = true;
        self.unread_count = self.unread_count.saturating_sub(1);
        true
    }

    /// Revert a flipped entry and recompute the unread count.
    fn unflip_read(&mut self, id: &NotificationId) {
        if let Some(entry) = self.notifications.iter_mut().find(|n| n.id == *id) {
            entry.read = false;
        }
        self.unread_count = self.notifications.iter().filter(|n| !n.read).count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotificationChannel;
    use crate::domain::ports::MockNotificationRepository;
    use chrono::{Duration, Utc};

    fn entry(read: bool, age_minutes: i64) -> Notification {
        Notification {
            id: NotificationId::random(),
            user_id: UserId::random(),
            title: "title".to_owned(),
            message: "message".to_owned(),
            channel: NotificationChannel::App,
            read,
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn feed_with(entries: Vec<Notification>) -> NotificationFeed {
        let mut feed = NotificationFeed::new();
        let ticket = feed.begin_refresh();
        feed.complete_refresh(ticket, Ok(entries))
            .expect("seeding the feed succeeds");
        feed
    }

    #[test]
    fn refresh_replaces_state_and_recomputes_unread() {
        let feed = feed_with(vec![entry(false, 0), entry(true, 1), entry(false, 2)]);
        assert_eq!(feed.notifications().len(), 3);
        assert_eq!(feed.unread_count(), 2);
        assert!(!feed.is_loading());
    }

    #[test]
    fn failed_refresh_leaves_prior_state_intact() {
        let mut feed = feed_with(vec![entry(false, 0)]);

        let ticket = feed.begin_refresh();
        let result = feed.complete_refresh(
            ticket,
            Err(NotificationRepositoryError::connection("refused")),
        );

        assert!(result.is_err());
        assert_eq!(feed.notifications().len(), 1);
        assert_eq!(feed.unread_count(), 1);
        assert!(!feed.is_loading());
    }

    #[test]
    fn stale_refresh_response_is_discarded() {
        let mut feed = NotificationFeed::new();

        let older = feed.begin_refresh();
        let newer = feed.begin_refresh();

        let fresh_rows = vec![entry(false, 0)];
        let outcome = feed
            .complete_refresh(newer, Ok(fresh_rows))
            .expect("current ticket applies");
        assert_eq!(outcome, RefreshOutcome::Applied);

        // The older in-flight response arrives late and must not clobber
        // the newer state.
        let outcome = feed
            .complete_refresh(older, Ok(vec![entry(true, 5), entry(true, 6)]))
            .expect("stale ticket is not an error");
        assert_eq!(outcome, RefreshOutcome::Stale);
        assert_eq!(feed.notifications().len(), 1);
        assert_eq!(feed.unread_count(), 1);
    }

    #[test]
    fn stale_failure_does_not_clear_the_loading_flag_of_a_newer_refresh() {
        let mut feed = NotificationFeed::new();

        let older = feed.begin_refresh();
        let _newer = feed.begin_refresh();

        let outcome = feed
            .complete_refresh(older, Err(NotificationRepositoryError::query("timeout")))
            .expect("stale failure is swallowed");
        assert_eq!(outcome, RefreshOutcome::Stale);
        assert!(feed.is_loading());
    }

    #[test]
    fn on_insert_prepends_and_bumps_unread_by_one() {
        let mut feed = feed_with(vec![entry(true, 10)]);
        let incoming = entry(false, 0);
        let incoming_id = incoming.id;

        feed.on_insert(incoming);

        assert_eq!(feed.notifications().len(), 2);
        assert_eq!(feed.notifications().first().map(|n| n.id), Some(incoming_id));
        assert_eq!(feed.unread_count(), 1);
    }

    #[test]
    fn on_insert_ignores_an_id_already_present() {
        let existing = entry(false, 0);
        let mut feed = feed_with(vec![existing.clone()]);

        feed.on_insert(existing);

        assert_eq!(feed.notifications().len(), 1);
        assert_eq!(feed.unread_count(), 1);
    }

    #[test]
    fn on_insert_of_a_read_row_does_not_touch_the_unread_count() {
        let mut feed = feed_with(vec![]);
        feed.on_insert(entry(true, 0));
        assert_eq!(feed.unread_count(), 0);
    }

    #[tokio::test]
    async fn refresh_pulls_through_the_store_port() {
        let user = UserId::random();
        let rows = vec![entry(false, 0), entry(true, 1)];
        let rows_for_store = rows.clone();

        let mut store = MockNotificationRepository::new();
        store
            .expect_list_for_user()
            .times(1)
            .returning(move |_, _| Ok(rows_for_store.clone()));

        let mut feed = NotificationFeed::new();
        feed.refresh(&store, &user).await.expect("refresh succeeds");

        assert_eq!(feed.notifications(), rows.as_slice());
        assert_eq!(feed.unread_count(), 1);
    }

    #[tokio::test]
    async fn mark_read_flips_locally_and_confirms_with_the_store() {
        let target = entry(false, 0);
        let target_id = target.id;
        let mut feed = feed_with(vec![target, entry(false, 1)]);

        let mut store = MockNotificationRepository::new();
        store
            .expect_mark_read()
            .times(1)
            .returning(|_, _| Ok(true));

        feed.mark_read(&store, &UserId::random(), &target_id)
            .await
            .expect("mark_read succeeds");

        assert_eq!(feed.unread_count(), 1);
        let flipped = feed
            .notifications()
            .iter()
            .find(|n| n.id == target_id)
            .expect("entry is still present");
        assert!(flipped.read);
    }

    #[tokio::test]
    async fn mark_read_reverts_the_flip_when_the_store_fails() {
        let target = entry(false, 0);
        let target_id = target.id;
        let mut feed = feed_with(vec![target, entry(false, 1)]);

        let mut store = MockNotificationRepository::new();
        store
            .expect_mark_read()
            .times(1)
            .returning(|_, _| Err(NotificationRepositoryError::query("write failed")));

        let result = feed.mark_read(&store, &UserId::random(), &target_id).await;

        assert!(result.is_err());
        assert_eq!(feed.unread_count(), 2);
        let reverted = feed
            .notifications()
            .iter()
            .find(|n| n.id == target_id)
            .expect("entry is still present");
        assert!(!reverted.read);
    }

    #[tokio::test]
    async fn mark_read_twice_is_idempotent() {
        let target = entry(false, 0);
        let target_id = target.id;
        let mut feed = feed_with(vec![target]);

        let mut store = MockNotificationRepository::new();
        // First call flips the row; the second is a store-side no-op.
        let mut flipped = false;
        store.expect_mark_read().times(2).returning(move |_, _| {
            let changed = !flipped;
            flipped = true;
            Ok(changed)
        });

        feed.mark_read(&store, &UserId::random(), &target_id)
            .await
            .expect("first mark_read succeeds");
        feed.mark_read(&store, &UserId::random(), &target_id)
            .await
            .expect("second mark_read succeeds");

        assert_eq!(feed.unread_count(), 0);
        assert!(feed.notifications().iter().all(|n| n.read));
    }

    #[tokio::test]
    async fn mark_all_read_zeroes_the_count_and_reports_the_store_total() {
        let mut feed = feed_with(vec![entry(false, 0), entry(false, 1), entry(true, 2)]);

        let mut store = MockNotificationRepository::new();
        store
            .expect_mark_all_read_for_user()
            .times(1)
            .returning(|_| Ok(2));

        let changed = feed
            .mark_all_read(&store, &UserId::random())
            .await
            .expect("mark_all_read succeeds");

        assert_eq!(changed, 2);
        assert_eq!(feed.unread_count(), 0);
        assert!(feed.notifications().iter().all(|n| n.read));
    }

    #[tokio::test]
    async fn mark_all_read_reverts_exactly_the_flipped_entries_on_failure() {
        let already_read = entry(true, 2);
        let already_read_id = already_read.id;
        let mut feed = feed_with(vec![entry(false, 0), entry(false, 1), already_read]);

        let mut store = MockNotificationRepository::new();
        store
            .expect_mark_all_read_for_user()
            .times(1)
            .returning(|_| Err(NotificationRepositoryError::connection("refused")));

        let result = feed.mark_all_read(&store, &UserId::random()).await;

        assert!(result.is_err());
        assert_eq!(feed.unread_count(), 2);
        let untouched = feed
            .notifications()
            .iter()
            .find(|n| n.id == already_read_id)
            .expect("read entry is still present");
        assert!(untouched.read, "previously read entries stay read");
    }

    #[test]
    fn unread_count_matches_the_entries_after_any_refresh() {
        let feed = feed_with(vec![
            entry(false, 0),
            entry(true, 1),
            entry(false, 2),
            entry(true, 3),
        ]);
        let expected = feed.notifications().iter().filter(|n| !n.read).count();
        assert_eq!(feed.unread_count(), expected);
    }
}
