//! Release domain types and event payload parsing.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a release.
///
/// Only [`ReleaseState::Published`] triggers the pipeline; every other
/// state is a no-op for the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseState {
    Published,
    Draft,
    Prerelease,
    /// Any state this client does not model
    #[serde(other)]
    Unknown,
}

/// The triggering entity: a versioned publication event on the host.
///
/// Created and mutated externally; read-only to the pipeline. The upload
/// endpoint, when present in the payload, is a hypermedia template and is
/// normalized before use (see [`Release::normalized_upload_url`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    /// Host-assigned release identifier.
    pub id: u64,

    /// Tag the release was cut from (e.g. `v2.0.3`).
    pub tag: String,

    /// Lifecycle state; must be `published` to trigger the pipeline.
    pub state: ReleaseState,

    /// Upload endpoint template, if the event payload carried one.
    #[serde(default)]
    pub upload_url: Option<String>,
}

impl Release {
    /// Whether this release should trigger the pipeline.
    pub fn is_published(&self) -> bool {
        self.state == ReleaseState::Published
    }

    /// Upload endpoint with the hypermedia template suffix stripped.
    ///
    /// Hosts advertise endpoints like
    /// `https://uploads.example.com/releases/1/assets{?name,label}`;
    /// the `{?name,label}` part is documentation, not URL.
    pub fn normalized_upload_url(&self) -> Option<String> {
        self.upload_url.as_deref().map(strip_url_template)
    }
}

/// Strips a trailing `{...}` hypermedia template from an endpoint URL.
pub(crate) fn strip_url_template(url: &str) -> String {
    match url.find('{') {
        Some(idx) => url[..idx].to_string(),
        None => url.to_string(),
    }
}

/// A named binary object attached to a release, as returned by the host
/// after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Host-assigned asset identifier.
    pub id: u64,

    /// Asset name; equal to the uploaded archive's file name.
    pub name: String,

    /// Download URL for the created asset.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_is_published() {
        let release = Release {
            id: 1,
            tag: "v1.0.0".to_string(),
            state: ReleaseState::Published,
            upload_url: None,
        };
        assert!(release.is_published());
    }

    #[test]
    fn test_draft_release_is_not_published() {
        let release = Release {
            id: 1,
            tag: "v1.0.0".to_string(),
            state: ReleaseState::Draft,
            upload_url: None,
        };
        assert!(!release.is_published());
    }

    #[test]
    fn test_unknown_state_deserializes() {
        let release: Release = serde_json::from_str(
            r#"{"id": 7, "tag": "v0.1.0", "state": "yanked"}"#,
        )
        .expect("payload should parse");
        assert_eq!(release.state, ReleaseState::Unknown);
        assert!(!release.is_published());
    }

    #[test]
    fn test_strip_url_template() {
        assert_eq!(
            strip_url_template("https://uploads.example.com/releases/1/assets{?name,label}"),
            "https://uploads.example.com/releases/1/assets"
        );
        assert_eq!(
            strip_url_template("https://uploads.example.com/releases/1/assets"),
            "https://uploads.example.com/releases/1/assets"
        );
    }

    #[test]
    fn test_normalized_upload_url() {
        let release = Release {
            id: 1,
            tag: "v1.0.0".to_string(),
            state: ReleaseState::Published,
            upload_url: Some(
                "https://uploads.example.com/releases/1/assets{?name,label}".to_string(),
            ),
        };
        assert_eq!(
            release.normalized_upload_url().as_deref(),
            Some("https://uploads.example.com/releases/1/assets")
        );
    }

    #[test]
    fn test_event_payload_round_trip() {
        let payload = r#"{
            "id": 42,
            "tag": "v2.0.3",
            "state": "published",
            "upload_url": "https://uploads.example.com/releases/42/assets{?name,label}"
        }"#;
        let release: Release = serde_json::from_str(payload).expect("payload should parse");
        assert_eq!(release.id, 42);
        assert_eq!(release.tag, "v2.0.3");
        assert!(release.is_published());
    }
}
