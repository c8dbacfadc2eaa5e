use crate::db::CredentialStore;
use crate::error::AppError;
use crate::slack::client::{SlackApi, SlackProfile};
use crate::spotify::client::SpotifyApi;
use crate::status::format::format_status;
use crate::status::guard::{MARKER_EMOJI, can_overwrite};
use std::sync::Arc;

/// Outcome of one user's pass through the reconciliation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// A new status was written to Slack and persisted.
    Updated,
    /// Fast-path skip (intent unchanged) or the overwrite guard said no.
    Unchanged,
    /// User has no linked credential or no Slack token; nothing fetched.
    Skipped,
    /// A provider reported revocation; all stored data was deleted.
    TornDown,
}

/// What happened during one tick. Failures are per-user and never abort
/// the remainder of the batch.
#[derive(Debug, Default)]
pub struct TickReport {
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub torn_down: usize,
    pub failures: Vec<(String, AppError)>,
}

/// The status reconciliation engine. One `run_tick` call is one pass
/// over every connected user, sequentially.
pub struct SyncEngine {
    store: Arc<dyn CredentialStore>,
    spotify: Arc<dyn SpotifyApi>,
    slack: Arc<dyn SlackApi>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        spotify: Arc<dyn SpotifyApi>,
        slack: Arc<dyn SlackApi>,
    ) -> Self {
        Self {
            store,
            spotify,
            slack,
        }
    }

    /// Run one reconciliation pass. Only a failure to list users aborts
    /// the tick; every per-user error lands in the report instead.
    pub async fn run_tick(&self) -> Result<TickReport, AppError> {
        let users = self.store.list_connected_users().await?;

        let mut report = TickReport::default();
        for user in users {
            match self.sync_user(&user).await {
                Ok(SyncOutcome::Updated) => report.updated += 1,
                Ok(SyncOutcome::Unchanged) => report.unchanged += 1,
                Ok(SyncOutcome::Skipped) => report.skipped += 1,
                Ok(SyncOutcome::TornDown) => report.torn_down += 1,
                Err(err) => {
                    tracing::warn!(user_id = %user, error = %err, "Status sync failed for user");
                    report.failures.push((user, err));
                }
            }
        }

        Ok(report)
    }

    /// The read-decide-write subsequence for a single user.
    pub async fn sync_user(&self, user_id: &str) -> Result<SyncOutcome, AppError> {
        let Some(credential) = self.store.get_credential(user_id).await? else {
            return Ok(SyncOutcome::Skipped);
        };
        let Some(slack_token) = self.store.get_slack_token(user_id).await? else {
            return Ok(SyncOutcome::Skipped);
        };

        let snapshot = match self.spotify.currently_playing(&credential.access_token).await {
            Ok(snapshot) => snapshot,
            Err(err) if err.is_revocation() => return self.teardown(user_id).await,
            Err(err) => return Err(err),
        };

        let intent = format_status(snapshot.as_ref());

        // Fast path: nothing changed since our last write, no Slack call.
        let last_applied = self.store.get_last_status(user_id).await?.unwrap_or_default();
        if last_applied == intent {
            return Ok(SyncOutcome::Unchanged);
        }

        // Live read, not the cached value: the user or another system may
        // have changed the status out-of-band since our last write.
        let current = match self.slack.get_profile(&slack_token, user_id).await {
            Ok(profile) => profile,
            Err(err) if err.is_revocation() => return self.teardown(user_id).await,
            Err(err) => return Err(err),
        };

        if !can_overwrite(&current) {
            tracing::debug!(user_id = user_id, "Overwrite guard denied status update");
            return Ok(SyncOutcome::Unchanged);
        }

        let next = SlackProfile {
            status_text: intent.clone(),
            status_emoji: if intent.is_empty() {
                String::new()
            } else {
                MARKER_EMOJI.to_string()
            },
            status_expiration: 0,
        };

        match self.slack.set_profile(&slack_token, &next).await {
            Ok(()) => {}
            Err(err) if err.is_revocation() => return self.teardown(user_id).await,
            Err(err) => return Err(err),
        }

        self.store.set_last_status(user_id, &intent).await?;

        tracing::info!(user_id = user_id, status = %intent, "Updated Slack status");
        Ok(SyncOutcome::Updated)
    }

    // Revocation is treated as a disconnect, not a retryable error.
    async fn teardown(&self, user_id: &str) -> Result<SyncOutcome, AppError> {
        tracing::info!(user_id = user_id, "Credential revoked, tearing down user data");
        self.store.delete_all_data(user_id).await?;
        Ok(SyncOutcome::TornDown)
    }
}
