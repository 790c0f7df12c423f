//! Presentation boundary.
//!
//! The fetch layer and the converter only ever talk to the outside world
//! through [`Render`].

use std::io::Write;
use std::sync::Mutex;

/// Status shown while a conversion request is outstanding
pub const MSG_IN_PROGRESS: &str = "conversion in progress, please wait...";
/// Status after the currency list came from the network
pub const MSG_ONLINE: &str = "You are online";
/// Status after the currency list came from the cache
pub const MSG_OFFLINE: &str = "You are offline.";
/// Status when both the network and the rate cache failed
pub const MSG_OFFLINE_NO_RATE: &str = "You are offline and no currency rate was found in cache";

/// Receiver for everything the core wants to show.
pub trait Render: Send + Sync {
  fn render_currency_option(&self, id: &str, label: &str);
  fn render_result(&self, value: f64);
  fn render_status_message(&self, text: &str);
}

/// Writes rendered output as plain lines to stdout.
pub struct ConsoleRenderer {
  out: Mutex<std::io::Stdout>,
}

impl ConsoleRenderer {
  pub fn new() -> Self {
    Self {
      out: Mutex::new(std::io::stdout()),
    }
  }

  fn line(&self, text: &str) {
    if let Ok(mut out) = self.out.lock() {
      // stdout closed underneath us (e.g. broken pipe); nothing useful to do
      let _ = writeln!(out, "{}", text);
    }
  }
}

impl Default for ConsoleRenderer {
  fn default() -> Self {
    Self::new()
  }
}

impl Render for ConsoleRenderer {
  fn render_currency_option(&self, id: &str, label: &str) {
    self.line(&format!("{:<6}{}", id, label));
  }

  fn render_result(&self, value: f64) {
    self.line(&format!("{}", value));
  }

  fn render_status_message(&self, text: &str) {
    self.line(&format!("[{}]", text));
  }
}

/// Something rendered, as captured by [`RecordingRenderer`]
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
  Option { id: String, label: String },
  Result(f64),
  Status(String),
}

/// Renderer that remembers every call, for tests
#[cfg(test)]
#[derive(Default)]
pub struct RecordingRenderer {
  calls: Mutex<Vec<Rendered>>,
}

#[cfg(test)]
impl RecordingRenderer {
  pub fn calls(&self) -> Vec<Rendered> {
    self.calls.lock().unwrap().clone()
  }

  pub fn statuses(&self) -> Vec<String> {
    self
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        Rendered::Status(s) => Some(s),
        _ => None,
      })
      .collect()
  }

  pub fn options(&self) -> Vec<String> {
    self
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        Rendered::Option { id, .. } => Some(id),
        _ => None,
      })
      .collect()
  }

  pub fn results(&self) -> Vec<f64> {
    self
      .calls()
      .into_iter()
      .filter_map(|c| match c {
        Rendered::Result(v) => Some(v),
        _ => None,
      })
      .collect()
  }
}

#[cfg(test)]
impl Render for RecordingRenderer {
  fn render_currency_option(&self, id: &str, label: &str) {
    self.calls.lock().unwrap().push(Rendered::Option {
      id: id.to_string(),
      label: label.to_string(),
    });
  }

  fn render_result(&self, value: f64) {
    self.calls.lock().unwrap().push(Rendered::Result(value));
  }

  fn render_status_message(&self, text: &str) {
    self
      .calls
      .lock()
      .unwrap()
      .push(Rendered::Status(text.to_string()));
  }
}
