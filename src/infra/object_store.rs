// ============================================================
// Layer 6 — Artifact Store Bridge
// ============================================================
// Publishes and fetches model directories through any
// `ObjectStore`. The production store is S3 (aws-sdk-s3);
// credentials, region and endpoint come from the standard AWS
// environment, so `AWS_ENDPOINT_URL` points it at MinIO or
// LocalStack.
//
// Upload layout for prefix "imdb/latest":
//
//   imdb/latest/model.mpk
//   imdb/latest/tokenizer.json
//   imdb/latest/config.json
//   imdb/latest/_manifest.json   ← written LAST
//
// The manifest lists every file with its size and SHA-256 and
// acts as the commit marker: a prefix without one is either a
// legacy upload or an interrupted one. Files are hashed and
// uploaded from disk in a streaming fashion. Downloads verify
// each manifest entry and never write the manifest locally.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::domain::traits::ObjectStore;
use crate::error::{PipelineError, Result};

pub const MANIFEST_FILE: &str = "_manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path relative to the uploaded directory, `/`-separated
    pub path:   String,
    pub size:   u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub files: Vec<ManifestEntry>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// (size, SHA-256) of a file, read through a fixed buffer.
fn file_digest(path: &Path) -> Result<(u64, String)> {
    let mut file   = io::BufReader::new(fs::File::open(path)?);
    let mut hasher = Sha256::new();
    let size = io::copy(&mut file, &mut hasher)?;
    Ok((size, hex::encode(hasher.finalize())))
}

fn join_key(prefix: &str, relative: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        relative.to_string()
    } else {
        format!("{prefix}/{relative}")
    }
}

// ─── ArtifactStore ────────────────────────────────────────────────────────────
/// Directory-level operations on one bucket of an `ObjectStore`.
pub struct ArtifactStore<S: ObjectStore> {
    store:  S,
    bucket: String,
}

impl<S: ObjectStore> ArtifactStore<S> {
    pub fn new(store: S, bucket: impl Into<String>) -> Self {
        Self { store, bucket: bucket.into() }
    }

    /// Create the bucket unless it already exists.
    pub fn ensure_bucket(&self) -> Result<()> {
        let buckets = self.store.list_buckets()?;
        if buckets.iter().any(|b| b == &self.bucket) {
            tracing::debug!(bucket = %self.bucket, "Bucket exists");
            return Ok(());
        }
        self.store.create_bucket(&self.bucket)?;
        tracing::info!(bucket = %self.bucket, "Created bucket");
        Ok(())
    }

    /// Upload every file under `local` to `prefix/<relative path>`,
    /// then the manifest.
    pub fn upload_directory(&self, local: &Path, prefix: &str) -> Result<Manifest> {
        if !local.is_dir() {
            return Err(PipelineError::DataNotFound(local.display().to_string()));
        }

        let mut manifest = Manifest::default();
        for entry in WalkDir::new(local).sort_by_file_name() {
            let entry = entry.map_err(|e| PipelineError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(local)
                .map_err(|e| PipelineError::InvalidInput(e.to_string()))?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if relative == MANIFEST_FILE {
                continue;
            }

            let (size, sha256) = file_digest(entry.path())?;
            manifest.files.push(ManifestEntry { path: relative.clone(), size, sha256 });

            let key = join_key(prefix, &relative);
            self.store.put_file(&self.bucket, &key, entry.path())?;
            tracing::debug!(bucket = %self.bucket, key = %key, "Uploaded file");
        }

        let body = serde_json::to_vec_pretty(&manifest)?;
        self.store.put_object(&self.bucket, &join_key(prefix, MANIFEST_FILE), body)?;

        tracing::info!(
            bucket = %self.bucket,
            prefix,
            files = manifest.files.len(),
            "Uploaded directory"
        );
        Ok(manifest)
    }

    /// Mirror `prefix/` into `local`, verifying against the manifest
    /// when one exists.
    pub fn download_directory(&self, prefix: &str, local: &Path) -> Result<Vec<PathBuf>> {
        let dir_prefix = join_key(prefix, "");
        let keys = self.store.list_objects(&self.bucket, &dir_prefix)?;
        let manifest_key = join_key(prefix, MANIFEST_FILE);

        let mut written = Vec::new();
        if keys.contains(&manifest_key) {
            let manifest: Manifest = serde_json::from_slice(&self.store.get_object(&self.bucket, &manifest_key)?)?;
            for entry in &manifest.files {
                let key = join_key(prefix, &entry.path);
                if !keys.contains(&key) {
                    return Err(PipelineError::Integrity(format!("manifest lists '{key}' but it is missing")));
                }
                let bytes = self.store.get_object(&self.bucket, &key)?;
                if bytes.len() as u64 != entry.size || sha256_hex(&bytes) != entry.sha256 {
                    return Err(PipelineError::Integrity(format!("'{key}' does not match its manifest entry")));
                }
                written.push(write_mirrored(local, &entry.path, &bytes)?);
            }
        } else {
            tracing::warn!(bucket = %self.bucket, prefix, "No manifest under prefix; fetching every object unverified");
            for key in &keys {
                let Some(relative) = key.strip_prefix(&dir_prefix) else { continue };
                // zero-byte "directory" markers
                if relative.is_empty() || relative.ends_with('/') {
                    continue;
                }
                let bytes = self.store.get_object(&self.bucket, key)?;
                written.push(write_mirrored(local, relative, &bytes)?);
            }
        }

        if written.is_empty() {
            return Err(PipelineError::DataNotFound(format!("s3://{}/{}", self.bucket, dir_prefix)));
        }

        tracing::info!(bucket = %self.bucket, prefix, files = written.len(), local = %local.display(), "Downloaded directory");
        Ok(written)
    }
}

fn write_mirrored(local: &Path, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
    let mut path = local.to_path_buf();
    for part in relative.split('/') {
        if part.is_empty() || part == "." || part == ".." {
            return Err(PipelineError::Integrity(format!("refusing to write unsafe key path '{relative}'")));
        }
        path.push(part);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, bytes)?;
    Ok(path)
}

// ─── S3ObjectStore ────────────────────────────────────────────────────────────
/// Blocking facade over the async S3 client.
pub struct S3ObjectStore {
    client:  aws_sdk_s3::Client,
    region:  Option<String>,
    runtime: tokio::runtime::Runtime,
}

impl S3ObjectStore {
    /// Build a client from the standard AWS environment.
    pub fn from_env() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let config = runtime.block_on(aws_config::load_defaults(aws_config::BehaviorVersion::latest()));
        let region = config.region().map(|r| r.as_ref().to_string());

        tracing::debug!(region = ?region, "Initialised S3 client");
        Ok(Self { client: aws_sdk_s3::Client::new(&config), region, runtime })
    }
}

impl ObjectStore for S3ObjectStore {
    fn list_buckets(&self) -> Result<Vec<String>> {
        let out = self
            .runtime
            .block_on(self.client.list_buckets().send())
            .map_err(PipelineError::store)?;
        Ok(out
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    fn create_bucket(&self, bucket: &str) -> Result<()> {
        use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};

        let mut request = self.client.create_bucket().bucket(bucket);
        // us-east-1 rejects an explicit location constraint
        if let Some(region) = self.region.as_deref().filter(|r| *r != "us-east-1") {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        self.runtime.block_on(request.send()).map_err(PipelineError::store)?;
        Ok(())
    }

    fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(aws_sdk_s3::primitives::ByteStream::from(body));
        self.runtime.block_on(request.send()).map_err(PipelineError::store)?;
        Ok(())
    }

    fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        self.runtime.block_on(async {
            let body = aws_sdk_s3::primitives::ByteStream::from_path(path)
                .await
                .map_err(PipelineError::store)?;
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .send()
                .await
                .map_err(PipelineError::store)?;
            Ok(())
        })
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        self.runtime.block_on(async {
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .into_paginator()
                .send();

            let mut keys = Vec::new();
            while let Some(page) = pages.next().await {
                let page = page.map_err(PipelineError::store)?;
                keys.extend(page.contents().iter().filter_map(|o| o.key().map(str::to_string)));
            }
            Ok(keys)
        })
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.runtime.block_on(async {
            let out = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(PipelineError::store)?;
            let data = out.body.collect().await.map_err(PipelineError::store)?;
            Ok(data.into_bytes().to_vec())
        })
    }
}
