//! Metadata service adapter
//!
//! Resolves a work into its ordered volume list and a volume into its
//! ordered image list. The production impl queries the BDRC endpoints:
//! `volumesForWork` (SPARQL table JSON) for volumes and the iiifpres image
//! list for a volume's pages.

use crate::error::MetadataError;
use crate::models::{ImageDescriptor, VolumeInfo, WorkId};
use async_trait::async_trait;
use serde_json::Value;

/// Metadata lookup collaborator interface
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Ordered volumes of a work, ascending by imagegroup id. An empty
    /// result is valid (the work has no volumes yet).
    async fn list_volumes(&self, work: &WorkId) -> Result<Vec<VolumeInfo>, MetadataError>;

    /// Ordered page images of a volume.
    async fn list_images(&self, volume: &VolumeInfo) -> Result<Vec<ImageDescriptor>, MetadataError>;
}

/// `MetadataClient` backed by the BDRC public endpoints
pub struct BdrcMetadataClient {
    http: reqwest::Client,
    metadata_base_url: String,
    image_list_base_url: String,
}

impl BdrcMetadataClient {
    pub fn new(metadata_base_url: &str, image_list_base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            metadata_base_url: metadata_base_url.trim_end_matches('/').to_string(),
            image_list_base_url: image_list_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, url: &str, resource: &str) -> Result<Value, MetadataError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MetadataError::unavailable(resource, e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetadataError::unavailable(
                resource,
                format!("status code: {}", response.status()),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| MetadataError::BadResponse {
                resource: resource.to_string(),
                source: Box::new(e),
            })
    }
}

/// Value of a SPARQL table cell: literals verbatim, URIs as `bdr:` qnames.
fn node_value(node: &Value) -> Option<String> {
    let value = node.get("value")?.as_str()?;
    if node.get("type")?.as_str()? == "literal" {
        Some(value.to_string())
    } else {
        let local = value.rsplit('/').next()?;
        Some(format!("bdr:{}", local))
    }
}

fn parse_volume_binding(binding: &Value) -> Option<VolumeInfo> {
    let vol_num = node_value(binding.get("volnum")?)?.parse().ok()?;
    let volume_prefix_url = node_value(binding.get("volid")?)?;
    let imagegroup = node_value(binding.get("imggroup")?)?;
    // qnames carry a namespace prefix; the imagegroup id is the local part
    let imagegroup = imagegroup
        .rsplit_once(':')
        .map(|(_, local)| local.to_string())
        .unwrap_or(imagegroup);
    Some(VolumeInfo {
        vol_num,
        volume_prefix_url,
        imagegroup,
    })
}

#[async_trait]
impl MetadataClient for BdrcMetadataClient {
    async fn list_volumes(&self, work: &WorkId) -> Result<Vec<VolumeInfo>, MetadataError> {
        let url = format!(
            "{}/query/table/volumesForWork?R_RES={}&format=json&pageSize=400",
            self.metadata_base_url, work.qualified
        );
        let body = self.get_json(&url, &work.qualified).await?;

        let bindings = body
            .pointer("/results/bindings")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                MetadataError::unavailable(&work.qualified, "missing results.bindings")
            })?;

        let volumes = bindings.iter().filter_map(parse_volume_binding).collect();
        Ok(volumes)
    }

    async fn list_images(&self, volume: &VolumeInfo) -> Result<Vec<ImageDescriptor>, MetadataError> {
        let url = format!(
            "{}/il/v:{}",
            self.image_list_base_url, volume.volume_prefix_url
        );
        let body = self.get_json(&url, &volume.volume_prefix_url).await?;

        let entries = body.as_array().ok_or_else(|| {
            MetadataError::unavailable(&volume.volume_prefix_url, "image list is not an array")
        })?;

        let images = entries
            .iter()
            .filter_map(|entry| entry.get("filename")?.as_str())
            .map(|filename| ImageDescriptor {
                filename: filename.to_string(),
            })
            .collect();
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_value_literal() {
        let node = json!({"type": "literal", "value": "1"});
        assert_eq!(node_value(&node), Some("1".to_string()));
    }

    #[test]
    fn test_node_value_uri_becomes_qname() {
        let node = json!({"type": "uri", "value": "http://purl.bdrc.io/resource/V22084_I0886"});
        assert_eq!(node_value(&node), Some("bdr:V22084_I0886".to_string()));
    }

    #[test]
    fn test_parse_volume_binding() {
        let binding = json!({
            "volnum": {"type": "literal", "value": "1"},
            "volid": {"type": "uri", "value": "http://purl.bdrc.io/resource/V22084_I0886"},
            "imggroup": {"type": "uri", "value": "http://purl.bdrc.io/resource/I0886"},
        });
        let volume = parse_volume_binding(&binding).unwrap();
        assert_eq!(volume.vol_num, 1);
        assert_eq!(volume.volume_prefix_url, "bdr:V22084_I0886");
        assert_eq!(volume.imagegroup, "I0886");
    }

    #[test]
    fn test_parse_volume_binding_missing_field() {
        let binding = json!({
            "volnum": {"type": "literal", "value": "1"},
        });
        assert!(parse_volume_binding(&binding).is_none());
    }
}
