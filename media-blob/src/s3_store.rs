use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream as AwsByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_sdk_s3::Client;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tracing::{debug, info, warn};

use crate::store::public_url;
use crate::{ByteStream, GetResult, MediaError, MediaResult, MediaStore, PutResult};

/// Smallest part S3 accepts for all but the last part of a multipart upload
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// S3-compatible (MinIO, RustFS, AWS) connection settings
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Host[:port] or full URL of the object store
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Scheme used when `endpoint` carries none
    pub use_ssl: bool,
    pub bucket: String,
    /// Base of public file URLs; empty disables URL generation
    pub public_url: String,
    pub region: String,
    /// Bodies of at least this size are sent as multipart uploads
    pub part_size: usize,
}

impl S3Config {
    pub fn new<E: Into<String>, B: Into<String>>(endpoint: E, bucket: B) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: String::new(),
            secret_key: String::new(),
            use_ssl: true,
            bucket: bucket.into(),
            public_url: String::new(),
            region: "us-east-1".to_string(),
            part_size: 8 * 1024 * 1024, // 8MB
        }
    }

    pub fn with_credentials<A: Into<String>, S: Into<String>>(mut self, access_key: A, secret_key: S) -> Self {
        self.access_key = access_key.into();
        self.secret_key = secret_key.into();
        self
    }

    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn with_public_url<S: Into<String>>(mut self, public_url: S) -> Self {
        self.public_url = public_url.into();
        self
    }

    pub fn with_region<S: Into<String>>(mut self, region: S) -> Self {
        self.region = region.into();
        self
    }

    /// Set part size (never below the S3 minimum)
    pub fn with_part_size(mut self, bytes: usize) -> Self {
        self.part_size = bytes.max(MIN_PART_SIZE);
        self
    }

    /// Endpoint as a URL, adding the scheme implied by `use_ssl` when missing
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else if self.use_ssl {
            format!("https://{}", self.endpoint)
        } else {
            format!("http://{}", self.endpoint)
        }
    }
}

/// Object store backed by an S3-compatible service
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    config: S3Config,
}

impl S3Store {
    /// Build the client and make sure the bucket exists
    pub async fn connect(config: S3Config) -> MediaResult<Self> {
        let client = Self::create_client(&config).await;
        let store = Self { client, config };
        store.ensure_bucket().await?;

        info!(bucket = %store.config.bucket, endpoint = %store.config.endpoint_url(), "S3 storage initialized successfully");
        Ok(store)
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    async fn create_client(config: &S3Config) -> Client {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "media-blob",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint_url())
            .load()
            .await;

        Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(true) // MinIO and RustFS expect path-style addressing
                .build(),
        )
    }

    async fn ensure_bucket(&self) -> MediaResult<()> {
        let bucket = &self.config.bucket;
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(err) if err.as_service_error().map_or(false, |e| e.is_not_found()) => {
                self.client
                    .create_bucket()
                    .bucket(bucket)
                    .send()
                    .await
                    .map_err(MediaError::backend)?;
                info!(bucket = %bucket, "Created new bucket");
                Ok(())
            }
            Err(err) => Err(MediaError::backend(err)),
        }
    }

    async fn put_single(&self, key: &str, content_type: Option<&str>, body: Bytes) -> MediaResult<PutResult> {
        let size_bytes = body.len() as u64;
        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_length(size_bytes as i64)
            .body(AwsByteStream::from(body));

        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let output = request.send().await.map_err(MediaError::backend)?;
        Ok(PutResult {
            key: key.to_string(),
            size_bytes,
            etag: output.e_tag,
        })
    }

    async fn put_multipart(
        &self,
        key: &str,
        content_type: Option<&str>,
        buffered: BytesMut,
        stream: ByteStream,
    ) -> MediaResult<PutResult> {
        let mut request = self
            .client
            .create_multipart_upload()
            .bucket(&self.config.bucket)
            .key(key);
        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }

        let created = request.send().await.map_err(MediaError::backend)?;
        let upload_id = created
            .upload_id
            .ok_or_else(|| MediaError::internal("multipart upload created without an upload id"))?;
        debug!(file_path = key, upload_id = %upload_id, "Multipart upload started");

        let (parts, size_bytes) = match self.upload_parts(key, &upload_id, buffered, stream).await {
            Ok(uploaded) => uploaded,
            Err(err) => {
                self.abort_multipart(key, &upload_id).await;
                return Err(err);
            }
        };

        let completed = CompletedMultipartUpload::builder().set_parts(Some(parts)).build();
        let output = match self
            .client
            .complete_multipart_upload()
            .bucket(&self.config.bucket)
            .key(key)
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                self.abort_multipart(key, &upload_id).await;
                return Err(MediaError::backend(err));
            }
        };

        Ok(PutResult {
            key: key.to_string(),
            size_bytes,
            etag: output.e_tag,
        })
    }

    /// Send `buffered` followed by the rest of `stream` as parts of `part_size`
    async fn upload_parts(
        &self,
        key: &str,
        upload_id: &str,
        mut buffered: BytesMut,
        mut stream: ByteStream,
    ) -> MediaResult<(Vec<CompletedPart>, u64)> {
        let part_size = self.config.part_size;
        let mut parts = Vec::new();
        let mut size_bytes = 0u64;
        let mut ended = false;

        loop {
            while !ended && buffered.len() < part_size {
                match stream.next().await {
                    Some(chunk) => buffered.extend_from_slice(&chunk?),
                    None => ended = true,
                }
            }
            if buffered.is_empty() {
                break;
            }

            let part = buffered.split_to(buffered.len().min(part_size)).freeze();
            let part_number = parts.len() as i32 + 1;
            size_bytes += part.len() as u64;

            let output = self
                .client
                .upload_part()
                .bucket(&self.config.bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part_number)
                .content_length(part.len() as i64)
                .body(AwsByteStream::from(part))
                .send()
                .await
                .map_err(MediaError::backend)?;

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .set_e_tag(output.e_tag)
                    .build(),
            );
        }

        Ok((parts, size_bytes))
    }

    async fn abort_multipart(&self, key: &str, upload_id: &str) {
        if let Err(err) = self
            .client
            .abort_multipart_upload()
            .bucket(&self.config.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            warn!(file_path = key, upload_id, error = %err, "Failed to abort multipart upload");
        }
    }
}

#[async_trait]
impl MediaStore for S3Store {
    async fn put(
        &self,
        key: &str,
        size_hint: Option<u64>,
        content_type: Option<&str>,
        mut stream: ByteStream,
    ) -> MediaResult<PutResult> {
        let part_size = self.config.part_size;
        let capacity = size_hint.map_or(part_size, |hint| hint.min(part_size as u64) as usize);
        let mut buffered = BytesMut::with_capacity(capacity);

        // Bodies that end within the first part go out as a single PutObject
        while buffered.len() < part_size {
            match stream.next().await {
                Some(chunk) => buffered.extend_from_slice(&chunk?),
                None => return self.put_single(key, content_type, buffered.freeze()).await,
            }
        }

        self.put_multipart(key, content_type, buffered, stream).await
    }

    async fn get(&self, key: &str) -> MediaResult<GetResult> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if err.as_service_error().map_or(false, |e| e.is_no_such_key()) => {
                return Err(MediaError::not_found(key, "no such key"));
            }
            Err(err) => return Err(MediaError::backend(err)),
        };

        let size_bytes = output.content_length.unwrap_or(0).max(0) as u64;
        let content_type = output.content_type.clone();
        let mut body = output.body;
        let stream = async_stream::stream! {
            while let Some(chunk) = body.next().await {
                yield chunk.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
            }
        };

        Ok(GetResult {
            stream: Box::pin(stream),
            size_bytes,
            content_type,
        })
    }

    async fn delete(&self, key: &str) -> MediaResult<()> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(MediaError::backend)?;
        Ok(())
    }

    fn url(&self, key: &str) -> String {
        public_url(&self.config.public_url, &self.config.bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_scheme_follows_ssl_flag() {
        let config = S3Config::new("minio:9000", "media");
        assert_eq!(config.endpoint_url(), "https://minio:9000");

        let config = config.with_ssl(false);
        assert_eq!(config.endpoint_url(), "http://minio:9000");

        let config = S3Config::new("http://localhost:9000", "media").with_ssl(true);
        assert_eq!(config.endpoint_url(), "http://localhost:9000");
    }

    #[test]
    fn part_size_never_below_minimum() {
        let config = S3Config::new("minio:9000", "media").with_part_size(1024);
        assert_eq!(config.part_size, MIN_PART_SIZE);
    }
}
