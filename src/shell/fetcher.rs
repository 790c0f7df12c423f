use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::error::ShellError;

/// A stored or fetched asset response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl AssetResponse {
  /// Stand-in returned when neither cache nor network could answer.
  pub fn network_error() -> Self {
    Self {
      status: 0,
      content_type: None,
      body: Vec::new(),
    }
  }

  pub fn is_ok(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Source of asset responses on the network
#[async_trait]
pub trait AssetFetcher: Send + Sync {
  /// Fetch `url`. Any HTTP response is `Ok`, whatever its status.
  async fn fetch(&self, url: &Url) -> Result<AssetResponse, ShellError>;
}

/// Fetches assets over HTTP.
#[derive(Clone, Default)]
pub struct HttpAssetFetcher {
  client: reqwest::Client,
}

impl HttpAssetFetcher {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
  async fn fetch(&self, url: &Url) -> Result<AssetResponse, ShellError> {
    debug!(%url, "Fetching asset");
    let response = self.client.get(url.clone()).send().await?;

    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get(reqwest::header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    let body = response.bytes().await?.to_vec();

    Ok(AssetResponse {
      status,
      content_type,
      body,
    })
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_is_ok() {
    let mut response = AssetResponse::network_error();
    assert!(!response.is_ok());
    response.status = 204;
    assert!(response.is_ok());
    response.status = 304;
    assert!(!response.is_ok());
  }
}
