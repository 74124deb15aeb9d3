use crate::config::{BlueskyConfig, Credentials};
use crate::facets::{self, Facet};
use crate::fetcher::http_client;
use crate::traits::Publisher;
use crate::types::{FetchConfig, PosterError, PublishReceipt, PublishRequest, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use url::Url;

const POST_COLLECTION: &str = "app.bsky.feed.post";
const EXTERNAL_EMBED: &str = "app.bsky.embed.external";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
}

#[derive(Debug, Serialize)]
struct CreateSession<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadBlobResponse {
    blob: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct CreateRecord<'a> {
    repo: &'a str,
    collection: &'a str,
    record: PostRecord,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord {
    #[serde(rename = "$type")]
    kind: &'static str,
    text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    facets: Vec<Facet>,
    embed: ExternalEmbed,
    created_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    langs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ExternalEmbed {
    #[serde(rename = "$type")]
    kind: &'static str,
    external: External,
}

#[derive(Debug, Serialize)]
struct External {
    uri: String,
    title: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumb: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct XrpcError {
    error: Option<String>,
    message: Option<String>,
}

/// Authenticated XRPC client for a Bluesky PDS.
pub struct BlueskyClient {
    client: Client,
    service: Url,
    session: Session,
}

impl BlueskyClient {
    /// Logs in with a client built from the same fetch settings as the feed downloads.
    pub async fn login(config: &BlueskyConfig, fetch: &FetchConfig) -> Result<Self> {
        Self::login_with(http_client(fetch)?, &config.service, &config.credentials).await
    }

    pub async fn login_with(client: Client, service: &str, credentials: &Credentials) -> Result<Self> {
        let service = Url::parse(service)?;
        let endpoint = xrpc(&service, "com.atproto.server.createSession")?;

        let response = client
            .post(endpoint)
            .json(&CreateSession {
                identifier: &credentials.identifier,
                password: &credentials.password,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let reason = describe_failure(response).await;
            error!("Failed to authenticate with Bluesky: {}", reason);
            return Err(PosterError::Auth(reason));
        }

        let session: Session = response.json().await?;
        info!("Authenticated successfully to Bluesky as {}", session.did);

        Ok(Self {
            client,
            service,
            session,
        })
    }

    pub fn did(&self) -> &str {
        &self.session.did
    }

    /// Downloads an image and stores it as a blob. `None` when anything goes wrong.
    pub async fn upload_image(&self, image_url: &Url) -> Option<serde_json::Value> {
        match self.try_upload_image(image_url).await {
            Ok(blob) => {
                debug!("Image uploaded successfully, blob reference: {}", blob);
                Some(blob)
            }
            Err(e) => {
                error!("Error uploading image {} to Bluesky: {}", image_url, e);
                None
            }
        }
    }

    async fn try_upload_image(&self, image_url: &Url) -> Result<serde_json::Value> {
        debug!("Uploading image from URL: {}", image_url);
        let response = self.client.get(image_url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(PosterError::General(format!(
                "failed to fetch image: {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .filter(|ct| ct.starts_with("image/"))
            .ok_or_else(|| PosterError::General("response is not an image".to_string()))?;

        let bytes = response.bytes().await?;

        let upload = self
            .client
            .post(xrpc(&self.service, "com.atproto.repo.uploadBlob")?)
            .bearer_auth(&self.session.access_jwt)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        if !upload.status().is_success() {
            return Err(PosterError::Publish(describe_failure(upload).await));
        }

        Ok(upload.json::<UploadBlobResponse>().await?.blob)
    }

    async fn build_record(&self, request: &PublishRequest) -> PostRecord {
        let thumb = match &request.thumbnail_source_url {
            Some(url) => {
                let blob = self.upload_image(url).await;
                if blob.is_none() {
                    warn!("Image upload failed; posting embed without a thumbnail.");
                }
                blob
            }
            None => None,
        };

        PostRecord {
            kind: POST_COLLECTION,
            text: request.text.clone(),
            facets: facets::detect(&request.text),
            embed: ExternalEmbed {
                kind: EXTERNAL_EMBED,
                external: External {
                    uri: request.external_link.to_string(),
                    title: request.external_title.clone(),
                    description: request.external_description.clone(),
                    thumb,
                },
            },
            created_at: request
                .created_at
                .unwrap_or_else(Utc::now)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            langs: request
                .languages
                .iter()
                .filter(|l| !l.is_empty())
                .cloned()
                .collect(),
            tags: request.tags.iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl Publisher for BlueskyClient {
    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt> {
        let record = self.build_record(request).await;

        let response = self
            .client
            .post(xrpc(&self.service, "com.atproto.repo.createRecord")?)
            .bearer_auth(&self.session.access_jwt)
            .json(&CreateRecord {
                repo: &self.session.did,
                collection: POST_COLLECTION,
                record,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PosterError::Publish(describe_failure(response).await));
        }

        let receipt: PublishReceipt = response.json().await?;
        info!("Successfully posted to Bluesky: {}", receipt.uri);
        Ok(receipt)
    }
}

fn xrpc(service: &Url, method: &str) -> Result<Url> {
    Ok(service.join(&format!("/xrpc/{}", method))?)
}

async fn describe_failure(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<XrpcError>().await {
        Ok(XrpcError {
            error: Some(error),
            message,
        }) => format!("{} {}: {}", status, error, message.unwrap_or_default()),
        _ if status == StatusCode::UNAUTHORIZED => format!("{} (check credentials)", status),
        _ => status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xrpc_paths_are_rooted_at_the_service() {
        let service = Url::parse("https://bsky.social/some/path").unwrap();
        let url = xrpc(&service, "com.atproto.repo.createRecord").unwrap();
        assert_eq!(url.as_str(), "https://bsky.social/xrpc/com.atproto.repo.createRecord");
    }

    #[test]
    fn record_uses_lexicon_field_names() {
        let record = PostRecord {
            kind: POST_COLLECTION,
            text: "Hello".to_string(),
            facets: Vec::new(),
            embed: ExternalEmbed {
                kind: EXTERNAL_EMBED,
                external: External {
                    uri: "https://a/".to_string(),
                    title: "Hello".to_string(),
                    description: String::new(),
                    thumb: None,
                },
            },
            created_at: "2024-01-01T09:30:00.000Z".to_string(),
            langs: vec!["en".to_string()],
            tags: Vec::new(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["$type"], "app.bsky.feed.post");
        assert_eq!(json["createdAt"], "2024-01-01T09:30:00.000Z");
        assert_eq!(json["embed"]["$type"], "app.bsky.embed.external");
        assert!(json.get("facets").is_none());
        assert!(json.get("tags").is_none());
        assert!(json["embed"]["external"].get("thumb").is_none());
    }
}
