use crate::vfs::{
    model::{VfsError, VfsResult},
    storage::{
        md5_hex,
        object_store::{ObjectListing, ObjectMeta, ObjectStoreClient, StoredObject},
    },
};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

type Bucket = BTreeMap<String, StoredObject>;

/// 进程内的对象存储，行为与 S3 的 put/get/head/delete/list 一致。
/// ETag 为带引号的内容 MD5
#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn buckets(&self) -> VfsResult<MutexGuard<'_, HashMap<String, Bucket>>> {
        self.buckets
            .lock()
            .map_err(|e| VfsError::RemoteFailure(format!("对象存储锁异常: {}", e)))
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryObjectStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> VfsResult<()> {
        let content_type = mime_guess::from_path(key)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let meta = ObjectMeta {
            key: key.to_string(),
            size: body.len() as u64,
            last_modified: Some(Utc::now()),
            etag: Some(format!("\"{}\"", md5_hex(&body))),
            content_type: Some(content_type),
        };
        debug!("putObject {}/{} ({} 字节)", bucket, key, body.len());
        self.buckets()?
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), StoredObject { meta, body });
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> VfsResult<Option<StoredObject>> {
        Ok(self
            .buckets()?
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> VfsResult<Option<ObjectMeta>> {
        Ok(self
            .buckets()?
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.meta.clone()))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> VfsResult<()> {
        if let Some(objects) = self.buckets()?.get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        delimiter: Option<&str>,
    ) -> VfsResult<ObjectListing> {
        let buckets = self.buckets()?;
        let Some(objects) = buckets.get(bucket) else {
            return Ok(ObjectListing::default());
        };
        let prefix = prefix.unwrap_or("");

        let mut listing = ObjectListing::default();
        for (key, object) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            let folded = delimiter
                .filter(|d| !d.is_empty())
                .and_then(|d| rest.find(d).map(|idx| idx + d.len()));
            match folded {
                Some(end) => {
                    let common = format!("{}{}", prefix, &rest[..end]);
                    if listing.common_prefixes.last() != Some(&common) {
                        listing.common_prefixes.push(common);
                    }
                }
                None => listing.contents.push(object.meta.clone()),
            }
        }
        Ok(listing)
    }
}
