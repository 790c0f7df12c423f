//! The versioned list of page assets kept for offline loads.

use url::Url;

use crate::config::ShellConfig;

use super::error::ShellError;

/// Fixed set of static paths for one release, plus the bucket naming scheme.
///
/// Buckets are named `{app_id}-static-v{version}`. Every bucket that starts
/// with `{app_id}-` belongs to this app, whatever its version.
#[derive(Debug, Clone)]
pub struct AssetManifest {
  origin: Url,
  app_id: String,
  version: u32,
  paths: Vec<String>,
}

impl AssetManifest {
  pub fn new(origin: Url, app_id: &str, version: u32, paths: Vec<String>) -> Self {
    Self {
      origin,
      app_id: app_id.to_string(),
      version,
      paths,
    }
  }

  pub fn from_config(config: &ShellConfig) -> Result<Self, ShellError> {
    let origin = Url::parse(&config.origin)?;
    Ok(Self::new(
      origin,
      &config.app_id,
      config.version,
      config.assets.clone(),
    ))
  }

  pub fn origin(&self) -> &Url {
    &self.origin
  }

  pub fn bucket_name(&self) -> String {
    format!("{}-static-v{}", self.app_id, self.version)
  }

  pub fn prefix(&self) -> String {
    format!("{}-", self.app_id)
  }

  /// Absolute URLs for every manifest path.
  pub fn urls(&self) -> Result<Vec<Url>, ShellError> {
    self
      .paths
      .iter()
      .map(|p| self.origin.join(p).map_err(ShellError::from))
      .collect()
  }

  /// URL of the cached page served for navigations to the origin root.
  pub fn shell_url(&self) -> Result<Url, ShellError> {
    let has_index = self
      .paths
      .iter()
      .any(|p| p.trim_start_matches('.').trim_start_matches('/') == "index.html");
    let path = if has_index { "/index.html" } else { "/" };
    Ok(self.origin.join(path)?)
  }

  /// True if `url` is the root of the manifest's origin.
  pub fn is_origin_root(&self, url: &Url) -> bool {
    url.origin() == self.origin.origin() && url.path() == "/"
  }
}

/// Key under which a response for `url` is stored; fragments never matter.
pub fn cache_key(url: &Url) -> String {
  let mut url = url.clone();
  url.set_fragment(None);
  url.to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn manifest() -> AssetManifest {
    AssetManifest::from_config(&ShellConfig::default()).unwrap()
  }

  #[test]
  fn test_bucket_naming() {
    let m = manifest();
    assert_eq!(m.bucket_name(), "BrightsCurrencyConverter-static-v4");
    assert_eq!(m.prefix(), "BrightsCurrencyConverter-");
    assert!(m.bucket_name().starts_with(&m.prefix()));
  }

  #[test]
  fn test_urls_resolve_against_origin() {
    let urls: Vec<String> = manifest().urls().unwrap().iter().map(|u| u.to_string()).collect();
    assert_eq!(
      urls,
      vec![
        "http://localhost:8080/",
        "http://localhost:8080/index.html",
        "http://localhost:8080/assets/js/appcontroller.js",
        "http://localhost:8080/assets/css/ux.css",
      ]
    );
  }

  #[test]
  fn test_shell_url_prefers_index() {
    assert_eq!(
      manifest().shell_url().unwrap().as_str(),
      "http://localhost:8080/index.html"
    );

    let origin = Url::parse("http://localhost:8080").unwrap();
    let bare = AssetManifest::new(origin, "App", 1, vec!["/".to_string()]);
    assert_eq!(bare.shell_url().unwrap().as_str(), "http://localhost:8080/");
  }

  #[test]
  fn test_is_origin_root() {
    let m = manifest();
    assert!(m.is_origin_root(&Url::parse("http://localhost:8080/").unwrap()));
    assert!(m.is_origin_root(&Url::parse("http://localhost:8080/?utm=x").unwrap()));
    assert!(!m.is_origin_root(&Url::parse("http://localhost:8080/index.html").unwrap()));
    assert!(!m.is_origin_root(&Url::parse("http://localhost:9090/").unwrap()));
  }

  #[test]
  fn test_cache_key_drops_fragment() {
    let url = Url::parse("http://localhost:8080/index.html#top").unwrap();
    assert_eq!(cache_key(&url), "http://localhost:8080/index.html");
  }
}
