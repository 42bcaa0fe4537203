use packhub_types::{
    ErrorBody, ListParams, Pack, PackKind, PackList, PublishPackRequest, RegisterRequest,
    ServerInfo, User,
};
use serde::de::DeserializeOwned;

use crate::ClientError;

/// Thin wrapper over one backend node's HTTP API.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, kind: PackKind) -> String {
        format!("{}/api/{}", self.base_url, kind.collection())
    }

    pub async fn info(&self) -> Result<ServerInfo, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/info", self.base_url))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn register(
        &self,
        username: &str,
        display_name: &str,
    ) -> Result<User, ClientError> {
        let body = RegisterRequest {
            username: username.to_string(),
            display_name: display_name.to_string(),
        };
        let resp = self
            .http
            .post(format!("{}/api/register", self.base_url))
            .json(&body)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn me(&self, token: &str) -> Result<User, ClientError> {
        let resp = self
            .http
            .get(format!("{}/api/me", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn list_packs(
        &self,
        kind: PackKind,
        params: &ListParams,
    ) -> Result<PackList, ClientError> {
        let resp = self
            .http
            .get(self.collection_url(kind))
            .query(params)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn get_pack(&self, kind: PackKind, id: &str) -> Result<Pack, ClientError> {
        let resp = self
            .http
            .get(format!("{}/{}", self.collection_url(kind), id))
            .send()
            .await?;
        decode(resp).await
    }

    /// Fetch a pack through the download endpoint; the server bumps the
    /// counter and returns the pack with the incremented count.
    pub async fn download_pack(&self, kind: PackKind, id: &str) -> Result<Pack, ClientError> {
        let resp = self
            .http
            .get(format!("{}/{}/download", self.collection_url(kind), id))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn publish(
        &self,
        kind: PackKind,
        token: &str,
        req: &PublishPackRequest,
    ) -> Result<Pack, ClientError> {
        let resp = self
            .http
            .post(self.collection_url(kind))
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn update(
        &self,
        kind: PackKind,
        token: &str,
        id: &str,
        req: &PublishPackRequest,
    ) -> Result<Pack, ClientError> {
        let resp = self
            .http
            .put(format!("{}/{}", self.collection_url(kind), id))
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn delete(
        &self,
        kind: PackKind,
        token: &str,
        id: &str,
    ) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(format!("{}/{}", self.collection_url(kind), id))
            .bearer_auth(token)
            .send()
            .await?;
        let _: serde_json::Value = decode(resp).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp.json::<T>().await?)
    } else {
        let msg = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("server returned {status}"),
        };
        Err(ClientError::Api(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new("http://example.com:8080/");
        assert_eq!(client.base_url(), "http://example.com:8080");
        assert_eq!(
            client.collection_url(PackKind::Rule),
            "http://example.com:8080/api/rule-packs"
        );
        assert_eq!(
            client.collection_url(PackKind::Memo),
            "http://example.com:8080/api/memo-packs"
        );
    }
}
