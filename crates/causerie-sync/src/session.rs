//! Session context: the authenticated identity and its teardown.
//!
//! Constructed explicitly at startup and injected into the synchronizer;
//! sign-out clears it and shuts the realtime channel down. No ambient
//! globals.

use tokio::sync::mpsc;
use tracing::info;

use causerie_api::ApiClient;
use causerie_realtime::ChannelCommand;
use causerie_shared::Identity;

use crate::error::SyncError;

/// The process-wide authenticated session.
pub struct Session {
    identity: Identity,
    channel: mpsc::Sender<ChannelCommand>,
}

impl Session {
    /// Verify the identity-provider credential and establish a session.
    ///
    /// Fails with [`SyncError::Api`] (auth variant) when the backend
    /// rejects the credential; callers drop to the sign-in flow rather
    /// than rendering partial UI.
    pub async fn sign_in(
        api: &ApiClient,
        credential: &str,
        channel: mpsc::Sender<ChannelCommand>,
    ) -> Result<Self, SyncError> {
        let identity = api.verify(credential).await?;
        info!(uid = %identity.uid, name = %identity.name, "Session established");
        Ok(Self { identity, channel })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub(crate) fn channel(&self) -> &mpsc::Sender<ChannelCommand> {
        &self.channel
    }

    /// Tear the session down: the realtime channel is closed and the
    /// identity dropped with `self`.
    pub async fn sign_out(self) {
        info!(uid = %self.identity.uid, "Session torn down");
        let _ = self.channel.send(ChannelCommand::Shutdown).await;
    }
}
