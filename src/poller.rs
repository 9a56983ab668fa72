use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::model::{Cursor, CursorPolicy};
use crate::notifier::{Delivery, Messenger, Notifier};
use crate::response::{self, ShapeError};
use crate::tracking::{TrackingApi, TrackingError};
use crate::verdict::{self, StatusError};

/// Prefix of the notice sent to the chat when a cycle fails.
pub const FAILURE_NOTICE_PREFIX: &str = "Сбой в работе программы";

#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Tracking(#[from] TrackingError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Status(#[from] StatusError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub retry_period: Duration,
    pub advance_cursor_on: CursorPolicy,
    pub notify_errors: bool,
}

/// What a finished cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The API had no entries in the poll window.
    NoData,
    /// An entry was rendered and handed to the notifier.
    Notified(Delivery),
}

pub struct Poller<T, M> {
    tracker: T,
    notifier: Notifier<M>,
    cursor: Cursor,
    settings: PollSettings,
}

impl<T: TrackingApi, M: Messenger> Poller<T, M> {
    pub fn new(tracker: T, notifier: Notifier<M>, cursor: Cursor, settings: PollSettings) -> Self {
        Self {
            tracker,
            notifier,
            cursor,
            settings,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn notifier(&self) -> &Notifier<M> {
        &self.notifier
    }

    /// Fetch, validate, render and deliver once. Errors from every stage come
    /// back typed; nothing here sleeps or touches the cursor.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let payload = self.tracker.fetch(self.cursor).await?;
        let Some(homework) = response::extract(&payload)? else {
            return Ok(CycleOutcome::NoData);
        };
        let message = verdict::render(&homework)?;
        Ok(CycleOutcome::Notified(self.notifier.deliver(&message).await))
    }

    /// One full cycle with failure isolation and cursor bookkeeping.
    #[instrument(skip_all, fields(cursor = self.cursor.as_secs()))]
    pub async fn tick(&mut self) -> Result<CycleOutcome, CycleError> {
        let result = self.run_cycle().await;
        match &result {
            Ok(CycleOutcome::NoData) => info!("no new homework statuses"),
            Ok(CycleOutcome::Notified(delivery)) => info!(?delivery, "status processed"),
            Err(err) => {
                match err {
                    CycleError::Tracking(err) => error!(%err, "tracking API unavailable"),
                    CycleError::Shape(err) => error!(%err, "unexpected tracking API response"),
                    CycleError::Status(err) => error!(%err, "cannot render homework status"),
                }
                if self.settings.notify_errors {
                    let notice = format!("{FAILURE_NOTICE_PREFIX}: {err}");
                    self.notifier.deliver(&notice).await;
                }
            }
        }
        self.advance_cursor(result.is_ok(), Cursor::now());
        result
    }

    /// Move the cursor to `now` when the policy allows it.
    pub fn advance_cursor(&mut self, cycle_succeeded: bool, now: Cursor) {
        if self.settings.advance_cursor_on.should_advance(cycle_succeeded) {
            self.cursor = now;
        }
    }

    /// Poll until `shutdown` resolves. A running cycle always completes;
    /// the shutdown signal is only observed while sleeping.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            period_secs = self.settings.retry_period.as_secs(),
            policy = self.settings.advance_cursor_on.as_str(),
            "starting poll loop"
        );
        loop {
            // Errors are already logged and reported inside tick.
            let _ = self.tick().await;
            tokio::select! {
                _ = tokio::time::sleep(self.settings.retry_period) => {}
                _ = &mut shutdown => {
                    info!("shutdown requested; leaving poll loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::DeliveryError;
    use crate::tracking::PollResult;
    use async_trait::async_trait;
    use serde_json::json;
    use teloxide::types::{ChatId, Recipient};

    struct Fixed(serde_json::Value);

    #[async_trait]
    impl TrackingApi for Fixed {
        async fn fetch(&self, _cursor: Cursor) -> PollResult {
            Ok(self.0.clone())
        }
    }

    struct Silent;

    #[async_trait]
    impl Messenger for Silent {
        async fn send_text(&self, _chat: &Recipient, _text: &str) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    fn poller(payload: serde_json::Value, policy: CursorPolicy) -> Poller<Fixed, Silent> {
        Poller::new(
            Fixed(payload),
            Notifier::new(Silent, ChatId(1)),
            Cursor(100),
            PollSettings {
                retry_period: Duration::from_secs(600),
                advance_cursor_on: policy,
                notify_errors: false,
            },
        )
    }

    #[test]
    fn advance_follows_policy() {
        let mut p = poller(json!({}), CursorPolicy::SuccessOnly);
        p.advance_cursor(false, Cursor(200));
        assert_eq!(p.cursor(), Cursor(100));
        p.advance_cursor(true, Cursor(300));
        assert_eq!(p.cursor(), Cursor(300));

        let mut p = poller(json!({}), CursorPolicy::Never);
        p.advance_cursor(true, Cursor(300));
        assert_eq!(p.cursor(), Cursor(100));

        let mut p = poller(json!({}), CursorPolicy::EveryCycle);
        p.advance_cursor(false, Cursor(400));
        assert_eq!(p.cursor(), Cursor(400));
    }

    #[tokio::test]
    async fn run_cycle_leaves_cursor_alone() {
        let mut p = poller(json!({ "homeworks": [] }), CursorPolicy::EveryCycle);
        assert_eq!(p.run_cycle().await.unwrap(), CycleOutcome::NoData);
        assert_eq!(p.cursor(), Cursor(100));
    }

    #[tokio::test]
    async fn shape_errors_surface_as_cycle_errors() {
        let mut p = poller(json!({ "items": [] }), CursorPolicy::SuccessOnly);
        let err = p.tick().await.unwrap_err();
        assert!(matches!(err, CycleError::Shape(ShapeError::MissingHomeworks)));
        assert_eq!(p.cursor(), Cursor(100));
    }

    #[tokio::test]
    async fn unknown_status_surfaces_as_cycle_error() {
        let mut p = poller(
            json!({ "homeworks": [{ "homework_name": "hw", "status": "lost" }] }),
            CursorPolicy::EveryCycle,
        );
        let err = p.tick().await.unwrap_err();
        assert!(matches!(err, CycleError::Status(StatusError::Unknown(_))));
        assert!(p.cursor() > Cursor(100));
    }
}
