//! Media upload rules: accepted formats, size limits and artifact naming.

use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use super::error::DomainError;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
/// Quality used for every re-encoded artifact.
pub const JPEG_QUALITY: u8 = 85;
pub const SMALL_THUMBNAIL_WIDTH: u32 = 150;
pub const MEDIUM_THUMBNAIL_WIDTH: u32 = 400;

/// MIME type of every processed artifact (main image and thumbnails).
pub const CANONICAL_MIME: &str = "image/jpeg";
pub const CANONICAL_EXTENSION: &str = ".jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Jpeg,
    Png,
    Gif,
    Webp,
    Svg,
}

impl MediaKind {
    pub const ALL: [MediaKind; 5] = [
        MediaKind::Jpeg,
        MediaKind::Png,
        MediaKind::Gif,
        MediaKind::Webp,
        MediaKind::Svg,
    ];

    /// Match a declared content type, ignoring case and parameters such as
    /// `; charset=utf-8`.
    pub fn from_mime(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.mime().eq_ignore_ascii_case(essence))
    }

    pub fn mime(self) -> &'static str {
        match self {
            MediaKind::Jpeg => "image/jpeg",
            MediaKind::Png => "image/png",
            MediaKind::Gif => "image/gif",
            MediaKind::Webp => "image/webp",
            MediaKind::Svg => "image/svg+xml",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Jpeg => ".jpg",
            MediaKind::Png => ".png",
            MediaKind::Gif => ".gif",
            MediaKind::Webp => ".webp",
            MediaKind::Svg => ".svg",
        }
    }

    /// GIF keeps its animation and SVG is vector data, so both are stored
    /// byte-for-byte.
    pub fn is_passthrough(self) -> bool {
        matches!(self, MediaKind::Gif | MediaKind::Svg)
    }

    pub fn label(self) -> &'static str {
        if self.is_passthrough() {
            "passthrough"
        } else {
            "processed"
        }
    }
}

/// Upload admission rules, injected into the media service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPolicy {
    allowed: Vec<MediaKind>,
    max_bytes: u64,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            allowed: MediaKind::ALL.to_vec(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl MediaPolicy {
    pub fn new(allowed: Vec<MediaKind>, max_bytes: u64) -> Self {
        Self { allowed, max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate the declared type first, then the declared size.
    pub fn check(&self, mime: &str, size: u64) -> Result<MediaKind, DomainError> {
        let kind = MediaKind::from_mime(mime)
            .filter(|kind| self.allowed.contains(kind))
            .ok_or_else(|| DomainError::invalid_file_type(mime))?;

        if size > self.max_bytes {
            return Err(DomainError::FileTooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        Ok(kind)
    }
}

/// `{year}/{month}/` partition for an upload made at `at`.
pub fn storage_prefix(at: OffsetDateTime) -> String {
    format!("{}/{:02}/", at.year(), u8::from(at.month()))
}

/// Storage names for every artifact of one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    prefix: String,
    base: String,
}

impl ArtifactNames {
    pub fn new(at: OffsetDateTime, id: Uuid) -> Self {
        Self {
            prefix: storage_prefix(at),
            base: id.to_string(),
        }
    }

    pub fn passthrough_filename(&self, kind: MediaKind) -> String {
        format!("{}{}", self.base, kind.extension())
    }

    pub fn passthrough_path(&self, kind: MediaKind) -> String {
        format!("{}{}", self.prefix, self.passthrough_filename(kind))
    }

    pub fn main_filename(&self) -> String {
        format!("{}{CANONICAL_EXTENSION}", self.base)
    }

    pub fn main_path(&self) -> String {
        format!("{}{}", self.prefix, self.main_filename())
    }

    pub fn small_path(&self) -> String {
        format!("{}{}_sm{CANONICAL_EXTENSION}", self.prefix, self.base)
    }

    pub fn medium_path(&self) -> String {
        format!("{}{}_md{CANONICAL_EXTENSION}", self.prefix, self.base)
    }
}

/// Maps storage paths to public URLs of the form `{base}/{bucket}/{path}` and
/// back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrls {
    base: String,
    bucket: String,
}

impl PublicUrls {
    pub fn new(base: impl Into<String>, bucket: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
            bucket: bucket.into().trim_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base,
            self.bucket,
            path.trim_start_matches('/')
        )
    }

    /// Recover the storage path from a URL produced by [`Self::url_for`].
    ///
    /// URLs minted under a different base are still accepted as long as the
    /// first path segment is the bucket.
    pub fn path_for(&self, url: &str) -> Option<String> {
        let own_prefix = format!("{}/{}/", self.base, self.bucket);
        if let Some(path) = url.strip_prefix(&own_prefix) {
            return (!path.is_empty()).then(|| path.to_string());
        }

        let parsed = Url::parse(url).ok()?;
        let mut segments = parsed.path_segments()?;
        segments.next()?;
        let path = segments.collect::<Vec<_>>().join("/");
        (!path.is_empty()).then_some(path)
    }
}
