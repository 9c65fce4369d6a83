use super::{LookupCache, RawCommon, ResourceCollector, Tenancy, list_for_session};
use crate::core::{
    domain::{
        error::OpenStackResult,
        model::{
            resource::{Resource, ResourceDetails, ResourceType, VolumeAttachment, VolumeProperties},
            scope::ScopeNames,
        },
        value_object::serde_helpers::{bool_or_string, string_or_null},
    },
    infrastructure::session::{ListingMode, Session},
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

const PATH: &str = "volumes/detail";
const KEY: &str = "volumes";

/// Block storage volumes, with attached server names resolved.
pub struct VolumeCollector;

#[derive(Deserialize)]
struct RawVolume {
    #[serde(flatten)]
    common: RawCommon,
    #[serde(default)]
    size: u64,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    volume_type: String,
    #[serde(default, deserialize_with = "bool_or_string::deserialize")]
    bootable: bool,
    #[serde(default)]
    attachments: Vec<RawAttachment>,
}

#[derive(Deserialize)]
struct RawAttachment {
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    server_id: String,
    #[serde(default, deserialize_with = "string_or_null::deserialize")]
    device: String,
}

impl VolumeCollector {
    /// Per-project listing. When the filtered call is refused, everything the
    /// session can see is listed and attributed to the session's project.
    async fn list_scoped(session: &Session) -> OpenStackResult<(Vec<RawVolume>, bool)> {
        let scope = session.scope();
        if scope.is_placeholder() {
            return Ok((session.block_storage.list(PATH, &[], KEY).await?, false));
        }
        match session
            .block_storage
            .list(PATH, &[("project_id", scope.id.as_str())], KEY)
            .await
        {
            Ok(volumes) => Ok((volumes, false)),
            Err(e) => {
                warn!(
                    project = %scope.name,
                    error = %e,
                    "project-filtered volume listing failed, attributing unfiltered listing to the session project"
                );
                Ok((session.block_storage.list(PATH, &[], KEY).await?, true))
            }
        }
    }
}

#[async_trait]
impl ResourceCollector for VolumeCollector {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Volume
    }

    async fn collect(&self, session: &Session, names: &ScopeNames) -> OpenStackResult<Vec<Resource>> {
        let (raw, force_session_owner) = match session.mode() {
            ListingMode::Scoped => Self::list_scoped(session).await?,
            ListingMode::AllTenants => (
                list_for_session(&session.block_storage, session, Tenancy::AllTenantsFlag, PATH, KEY).await?,
                false,
            ),
        };

        let mut cache = LookupCache::default();
        let mut resources = Vec::with_capacity(raw.len());
        for mut volume in raw {
            let mut attachments = Vec::with_capacity(volume.attachments.len());
            for attachment in volume.attachments.drain(..) {
                let server_name = if attachment.server_id.is_empty() {
                    String::new()
                } else {
                    cache.server_name(session, &attachment.server_id).await
                };
                attachments.push(VolumeAttachment {
                    server_id: attachment.server_id,
                    server_name,
                    device: attachment.device,
                });
            }
            let attached_to = attachments
                .first()
                .map(|a| a.server_name.clone())
                .unwrap_or_default();

            if force_session_owner {
                volume.common.tenant_id = None;
                volume.common.project_id = None;
            }
            let details = ResourceDetails::Volume(VolumeProperties {
                size: volume.size,
                volume_type: volume.volume_type,
                bootable: volume.bootable,
                attachments,
                attached_to,
            });
            resources.push(volume.common.into_resource(names, session, details));
        }
        Ok(resources)
    }
}
