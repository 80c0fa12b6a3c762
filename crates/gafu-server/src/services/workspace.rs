//! Workspace service client (object store)

use super::rpc::JsonRpcClient;
use super::ObjectStore;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use gafu_common::types::{ObjectInfo, ObjectRef};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

const GET_OBJECT_INFO_METHOD: &str = "Workspace.get_object_info_new";

#[derive(Debug, Serialize)]
struct ObjectSpecification<'a> {
    #[serde(rename = "ref")]
    reference: &'a str,
}

#[derive(Debug, Serialize)]
struct GetObjectInfoParams<'a> {
    objects: Vec<ObjectSpecification<'a>>,
    #[serde(rename = "includeMetadata")]
    include_metadata: i64,
    #[serde(rename = "ignoreErrors")]
    ignore_errors: i64,
}

pub struct WorkspaceClient {
    rpc: JsonRpcClient,
}

impl WorkspaceClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            rpc: JsonRpcClient::new(url, timeout)?,
        })
    }
}

#[async_trait]
impl ObjectStore for WorkspaceClient {
    #[instrument(skip(self, token), fields(reference = %reference))]
    async fn get_object_info(
        &self,
        reference: &ObjectRef,
        token: Option<&str>,
    ) -> Result<ObjectInfo> {
        let params = GetObjectInfoParams {
            objects: vec![ObjectSpecification {
                reference: reference.as_str(),
            }],
            include_metadata: 0,
            ignore_errors: 0,
        };

        let infos: Vec<Option<ObjectInfo>> =
            self.rpc.call(GET_OBJECT_INFO_METHOD, params, token).await?;

        let info = infos
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| anyhow!("Workspace returned no object info for {}", reference))?;

        debug!(name = %info.name, version = info.version, "Resolved object");
        Ok(info)
    }
}
