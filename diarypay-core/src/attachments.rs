//! Image attachments stored as individual files
//!
//! Each blob lives at `<dir>/<key>`, where the key is an uppercase UUID plus
//! the format's extension. Blobs are written through a temp file in the same
//! directory and renamed into place, so a reader never sees a partial file.
//!
//! Records refer to blobs by key. Deleting a record leaves its blob behind;
//! [`AttachmentStore::sweep_orphans`] reclaims blobs that no live record
//! references.

use crate::error::AttachmentError;
use crate::types::{AttachmentFormat, AttachmentKey};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// JPEG quality used when transcoding
pub const JPEG_QUALITY: u8 = 90;

impl AttachmentFormat {
    fn image_format(&self) -> ImageFormat {
        match self {
            AttachmentFormat::Jpeg => ImageFormat::Jpeg,
            AttachmentFormat::Png => ImageFormat::Png,
        }
    }
}

/// Result of an orphan sweep
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Blobs still referenced by a record
    pub kept: usize,
    /// Orphaned blobs that were deleted
    pub removed: Vec<AttachmentKey>,
    /// Orphaned blobs that could not be deleted
    pub failed: Vec<(AttachmentKey, std::io::Error)>,
}

/// Directory of attachment blobs.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    dir: PathBuf,
}

impl AttachmentStore {
    /// Use `dir` for blobs. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store an image and return its new key.
    ///
    /// Input already encoded as `format` is kept byte for byte. Any other
    /// decodable image is transcoded. Input that does not decode as an image
    /// fails with [`AttachmentError::EncodeFailed`].
    pub fn save(&self, bytes: &[u8], format: AttachmentFormat) -> Result<AttachmentKey, AttachmentError> {
        let decoded = image::load_from_memory(bytes)?;
        let source_format = image::guess_format(bytes).ok();

        let encoded = if source_format == Some(format.image_format()) {
            bytes.to_vec()
        } else {
            tracing::debug!(from = ?source_format, to = ?format, "Transcoding attachment");
            encode(&decoded, format)?
        };

        let key = AttachmentKey::generate(format);
        self.write_atomic(&key, &encoded)?;

        tracing::debug!(key = %key, size = encoded.len(), "Saved attachment");
        Ok(key)
    }

    /// Read a blob. Unknown or malformed keys read as `None`.
    pub fn load(&self, key: &str) -> Option<Vec<u8>> {
        let key = AttachmentKey::parse(key)?;
        match fs::read(self.path_for(&key)) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(key = %key, error = %e, "Failed to read attachment");
                }
                None
            }
        }
    }

    /// Keys of every blob in the directory.
    ///
    /// Files whose names are not attachment keys (temp files, strays) are
    /// ignored. A missing directory has no keys.
    pub fn keys(&self) -> Result<BTreeSet<AttachmentKey>, AttachmentError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = BTreeSet::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(key) = entry.file_name().to_str().and_then(AttachmentKey::parse) {
                keys.insert(key);
            }
        }
        Ok(keys)
    }

    /// Delete every blob whose key is not in `live`.
    ///
    /// Failures on individual blobs are collected in the report rather than
    /// aborting the sweep.
    pub fn sweep_orphans(&self, live: &BTreeSet<AttachmentKey>) -> Result<SweepReport, AttachmentError> {
        let mut report = SweepReport::default();

        for key in self.keys()? {
            if live.contains(&key) {
                report.kept += 1;
                continue;
            }
            match fs::remove_file(self.path_for(&key)) {
                Ok(()) => report.removed.push(key),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to remove orphaned attachment");
                    report.failed.push((key, e));
                }
            }
        }

        tracing::info!(
            kept = report.kept,
            removed = report.removed.len(),
            failed = report.failed.len(),
            "Attachment sweep complete"
        );
        Ok(report)
    }

    fn path_for(&self, key: &AttachmentKey) -> PathBuf {
        self.dir.join(key.as_str())
    }

    fn write_atomic(&self, key: &AttachmentKey, bytes: &[u8]) -> Result<(), AttachmentError> {
        fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }
}

fn encode(image: &DynamicImage, format: AttachmentFormat) -> Result<Vec<u8>, AttachmentError> {
    let mut buf = Vec::new();
    match format {
        AttachmentFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).encode_image(&rgb)?;
        }
        AttachmentFormat::Png => {
            image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        }
    }
    Ok(buf)
}
