use std::path::Path;

use futures_util::future::join_all;
use packhub_types::{ListParams, Pack, PackKind, PublishPackRequest, User};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::http::ApiClient;
use crate::ClientError;

/// One remote backend node. The id is local bookkeeping only, never shared
/// with any server; name and description are captured from `/api/info` when
/// the channel is added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A listed pack attributed to the channel it came from. The attribution is
/// additive metadata for the UI; the pack shape itself is untouched.
#[derive(Debug, Clone, Serialize)]
pub struct RemotePack {
    pub channel_name: String,
    pub channel_url: String,
    #[serde(flatten)]
    pub pack: Pack,
}

/// The set of configured channels. Channels are fully independent: one
/// channel's token, name, or reachability never affects another.
#[derive(Debug, Default)]
pub struct ChannelSet {
    channels: Vec<Channel>,
}

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; a missing file is an empty set.
    pub fn load(path: &Path) -> Result<Self, ClientError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let channels = serde_json::from_str(&data)?;
        Ok(Self { channels })
    }

    pub fn save(&self, path: &Path) -> Result<(), ClientError> {
        std::fs::write(path, serde_json::to_string_pretty(&self.channels)?)?;
        Ok(())
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    /// Probe the candidate backend and record it on success. Any probe
    /// failure (network, non-2xx, malformed body) adds nothing.
    pub async fn add_channel(
        &mut self,
        url: &str,
        token: Option<String>,
    ) -> Result<Channel, ClientError> {
        let client = ApiClient::new(url);
        let info = client.info().await?;

        let channel = Channel {
            id: Uuid::new_v4().to_string(),
            url: client.base_url().to_string(),
            token,
            name: info.name,
            description: info.description,
        };
        self.channels.push(channel.clone());
        Ok(channel)
    }

    /// Purely local bookkeeping; there is no server-side deregistration.
    pub fn remove_channel(&mut self, id: &str) -> bool {
        let before = self.channels.len();
        self.channels.retain(|c| c.id != id);
        self.channels.len() != before
    }

    /// Register against one channel and store the returned token on it. On
    /// failure the channel's token is left untouched.
    pub async fn register(
        &mut self,
        channel_id: &str,
        username: &str,
        display_name: &str,
    ) -> Result<User, ClientError> {
        let channel = self
            .channels
            .iter_mut()
            .find(|c| c.id == channel_id)
            .ok_or(ClientError::UnknownChannel)?;

        let user = ApiClient::new(&channel.url)
            .register(username, display_name)
            .await?;
        channel.token = Some(user.token.clone());
        Ok(user)
    }

    /// Publish a pack's publishable subset to one channel. Fails locally,
    /// without a network call, when the channel has no token. No automatic
    /// retry; transient failures are the caller's to retry.
    pub async fn publish(
        &self,
        channel_id: &str,
        kind: PackKind,
        pack: &Pack,
    ) -> Result<Pack, ClientError> {
        let channel = self.channel(channel_id).ok_or(ClientError::UnknownChannel)?;
        let token = channel.token.as_deref().ok_or(ClientError::NotAuthenticated)?;

        let req = PublishPackRequest {
            name: pack.name.clone(),
            description: pack.description.clone(),
            version: pack.version.clone(),
            system_prompt: pack.system_prompt.clone(),
            rules: pack.rules.clone(),
            // Memos ride along only on the memo-pack path.
            memos: match kind {
                PackKind::Memo => pack.memos.clone(),
                PackKind::Rule => Vec::new(),
            },
            tags: pack.tags.clone(),
        };

        ApiClient::new(&channel.url).publish(kind, token, &req).await
    }

    /// One listing request per channel, issued concurrently, all-settled: a
    /// failing channel contributes zero items and never delays or aborts the
    /// others.
    pub async fn fetch_all(&self, kind: PackKind, params: &ListParams) -> Vec<RemotePack> {
        let fetches = self.channels.iter().map(|channel| {
            let client = ApiClient::new(&channel.url);
            let params = params.clone();
            async move { (channel, client.list_packs(kind, &params).await) }
        });

        let mut items = Vec::new();
        for (channel, outcome) in join_all(fetches).await {
            match outcome {
                Ok(list) => items.extend(list.items.into_iter().map(|pack| RemotePack {
                    channel_name: channel.name.clone(),
                    channel_url: channel.url.clone(),
                    pack,
                })),
                Err(e) => {
                    warn!(
                        channel = %channel.name,
                        url = %channel.url,
                        "channel fetch failed: {e}"
                    );
                }
            }
        }
        items
    }
}
