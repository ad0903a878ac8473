//! Avatar resolution by probing the image host.
//!
//! Profile images live at `<base>/profile-images/<id>/profile1.png`. A HEAD
//! request answering 200 means the image exists and its URL is returned;
//! any other status, a timeout, or a transport error resolves to "".

use std::time::Duration;

use chatify_core::avatar::AvatarResolver;
use chatify_types::config::ServerConfig;
use chatify_types::user::UserId;
use reqwest::StatusCode;

/// Public URL of a user's profile image under `base_url`.
pub fn profile_image_url(base_url: &str, user_id: UserId) -> String {
    format!(
        "{}/profile-images/{user_id}/profile1.png",
        base_url.trim_end_matches('/')
    )
}

/// `AvatarResolver` backed by HTTP HEAD probes.
///
/// With no base URL configured every lookup resolves to "" without any
/// network traffic.
#[derive(Debug, Clone)]
pub struct HttpAvatarResolver {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpAvatarResolver {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.avatar_base_url.clone(),
            Duration::from_millis(config.avatar_probe_timeout_ms),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }
}

impl AvatarResolver for HttpAvatarResolver {
    async fn resolve_avatar_url(&self, user_id: UserId) -> String {
        let Some(base_url) = self.base_url.as_deref() else {
            return String::new();
        };
        let url = profile_image_url(base_url, user_id);

        match self.client.head(&url).send().await {
            Ok(response) if response.status() == StatusCode::OK => url,
            Ok(response) => {
                tracing::debug!(%user_id, status = %response.status(), "No profile image");
                String::new()
            }
            Err(err) => {
                tracing::debug!(%user_id, error = %err, "Avatar probe failed");
                String::new()
            }
        }
    }
}
