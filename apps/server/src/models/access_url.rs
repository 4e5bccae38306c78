//! Public access URLs for stored files.

use serde::Serialize;
use std::fmt;

/// URL route segment a stored file is served under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// 3D models, served under `/model/`
    Model,
    /// Every other category, served under `/image/`
    Image,
}

impl RouteKind {
    /// Route segment as it appears in the URL path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-expiring URL locating a stored file.
///
/// Format: `http://{host}/{route}/bucket/{subfolder}/{filename}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessUrl(String);

impl AccessUrl {
    /// Build the URL for a (subfolder, filename) key.
    pub fn build(host: &str, route: RouteKind, subfolder: &str, filename: &str) -> Self {
        Self(format!(
            "http://{}/{}/bucket/{}/{}",
            host,
            route,
            urlencoding::encode(subfolder),
            urlencoding::encode(filename)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
