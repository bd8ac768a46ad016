//! In-memory fakes for the release host (testing only)
//!
//! Provides `MemoryReleaseHost`, which satisfies the [`ReleaseHost`]
//! contract without any network access: uploads are recorded in a map and
//! duplicate asset names collide exactly like a real host.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::ReleaseHost;
use crate::error::PublishError;
use crate::release::{AssetRef, Release};
use crate::Result;

/// In-memory release host backed by a `Mutex<HashMap<endpoint, assets>>`.
#[derive(Debug, Default)]
pub struct MemoryReleaseHost {
    assets: Mutex<HashMap<String, Vec<AssetRef>>>,
    next_asset_id: AtomicU64,
    fail_auth: bool,
}

impl MemoryReleaseHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that rejects every call with an authentication error.
    pub fn with_auth_failure() -> Self {
        MemoryReleaseHost {
            fail_auth: true,
            ..Self::default()
        }
    }

    /// Endpoint this fake resolves for a release.
    pub fn endpoint_for(release_id: u64) -> String {
        format!("memory://releases/{}/assets", release_id)
    }

    /// Names of all assets uploaded for a release, in upload order.
    pub fn asset_names(&self, release_id: u64) -> Vec<String> {
        let assets = self.assets.lock().unwrap();
        assets
            .get(&Self::endpoint_for(release_id))
            .map(|list| list.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Total number of uploaded assets across all releases.
    pub fn upload_count(&self) -> usize {
        let assets = self.assets.lock().unwrap();
        assets.values().map(|list| list.len()).sum()
    }
}

#[async_trait]
impl ReleaseHost for MemoryReleaseHost {
    async fn resolve_upload_url(&self, release: &Release) -> Result<String> {
        if self.fail_auth {
            return Err(PublishError::Auth { status: 401 });
        }
        Ok(Self::endpoint_for(release.id))
    }

    async fn upload_asset(
        &self,
        endpoint: &str,
        asset_name: &str,
        _bytes: Vec<u8>,
    ) -> Result<AssetRef> {
        if self.fail_auth {
            return Err(PublishError::Auth { status: 401 });
        }

        let mut assets = self.assets.lock().unwrap();
        let list = assets.entry(endpoint.to_string()).or_default();

        if list.iter().any(|a| a.name == asset_name) {
            return Err(PublishError::NameCollision {
                name: asset_name.to_string(),
            });
        }

        let id = self.next_asset_id.fetch_add(1, Ordering::SeqCst) + 1;
        let asset = AssetRef {
            id,
            name: asset_name.to_string(),
            url: format!("{}/{}", endpoint, id),
        };
        list.push(asset.clone());
        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::ReleaseState;

    fn published_release(id: u64) -> Release {
        Release {
            id,
            tag: "v1.0.0".to_string(),
            state: ReleaseState::Published,
            upload_url: None,
        }
    }

    #[tokio::test]
    async fn test_upload_and_list_assets() {
        let host = MemoryReleaseHost::new();
        let release = published_release(1);

        let endpoint = host.resolve_upload_url(&release).await.expect("resolve failed");
        let asset = host
            .upload_asset(&endpoint, "app-linux.tar.gz", vec![1, 2, 3])
            .await
            .expect("upload failed");

        assert_eq!(asset.name, "app-linux.tar.gz");
        assert_eq!(host.asset_names(1), vec!["app-linux.tar.gz"]);
        assert_eq!(host.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_collides() {
        let host = MemoryReleaseHost::new();
        let release = published_release(1);
        let endpoint = host.resolve_upload_url(&release).await.expect("resolve failed");

        host.upload_asset(&endpoint, "app-linux.tar.gz", vec![1])
            .await
            .expect("first upload failed");
        let second = host.upload_asset(&endpoint, "app-linux.tar.gz", vec![1]).await;

        assert!(matches!(
            second,
            Err(PublishError::NameCollision { name }) if name == "app-linux.tar.gz"
        ));
        assert_eq!(host.upload_count(), 1, "Collision must not overwrite");
    }

    #[tokio::test]
    async fn test_auth_failure_rejects_resolve() {
        let host = MemoryReleaseHost::with_auth_failure();
        let release = published_release(1);

        let result = host.resolve_upload_url(&release).await;
        assert!(matches!(result, Err(PublishError::Auth { status: 401 })));
    }

    #[tokio::test]
    async fn test_distinct_names_do_not_collide() {
        let host = MemoryReleaseHost::new();
        let release = published_release(2);
        let endpoint = host.resolve_upload_url(&release).await.expect("resolve failed");

        host.upload_asset(&endpoint, "app-linux.tar.gz", vec![])
            .await
            .expect("linux upload failed");
        host.upload_asset(&endpoint, "app-macos.tar.gz", vec![])
            .await
            .expect("macos upload failed");

        assert_eq!(
            host.asset_names(2),
            vec!["app-linux.tar.gz", "app-macos.tar.gz"]
        );
    }
}
