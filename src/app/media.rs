use anyhow::Result;
use bytes::Bytes;
use image::ImageFormat;
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

use crate::infra::storage::ObjectStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRejection {
    Empty,
    TooLarge { max_bytes: usize },
    UnsupportedFormat,
}

impl fmt::Display for ImageRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("image is empty"),
            Self::TooLarge { max_bytes } => {
                write!(f, "image must be at most {} bytes", max_bytes)
            }
            Self::UnsupportedFormat => {
                f.write_str("image must be a JPEG, PNG, WebP or GIF file")
            }
        }
    }
}

/// Uploaded bytes whose format has been sniffed from the content itself.
/// The client-supplied content type is never trusted.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    bytes: Bytes,
    format: ImageFormat,
}

impl ValidatedImage {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn content_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            _ => "application/octet-stream",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::WebP => "webp",
            ImageFormat::Gif => "gif",
            _ => "bin",
        }
    }

    /// `posts/<author>/<sha256>.<ext>`, so re-uploading the same file reuses the object.
    pub fn object_key(&self, author_id: Uuid) -> String {
        let digest = Sha256::digest(&self.bytes);
        format!("posts/{}/{}.{}", author_id, hex::encode(digest), self.extension())
    }
}

pub fn validate_image(bytes: Bytes, max_bytes: usize) -> Result<ValidatedImage, ImageRejection> {
    if bytes.is_empty() {
        return Err(ImageRejection::Empty);
    }
    if bytes.len() > max_bytes {
        return Err(ImageRejection::TooLarge { max_bytes });
    }

    let format = image::guess_format(&bytes).map_err(|_| ImageRejection::UnsupportedFormat)?;
    match format {
        ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::WebP | ImageFormat::Gif => {
            Ok(ValidatedImage { bytes, format })
        }
        _ => Err(ImageRejection::UnsupportedFormat),
    }
}

#[derive(Clone)]
pub struct ImageService {
    storage: ObjectStorage,
}

impl ImageService {
    pub fn new(storage: ObjectStorage) -> Self {
        Self { storage }
    }

    /// Store a post image on the media host and return its public URL.
    pub async fn upload_post_image(&self, author_id: Uuid, image: ValidatedImage) -> Result<String> {
        let key = image.object_key(author_id);
        let content_type = image.content_type();
        let url = self
            .storage
            .put_public_object(&key, image.bytes, content_type)
            .await?;

        tracing::debug!(author_id = %author_id, key = %key, "uploaded post image");
        Ok(url)
    }
}
