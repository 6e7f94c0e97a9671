// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Artifact delivery: naming the finished PDF and handing its bytes to a
// sink that exposes them to the user.
//
// Two sinks ship with the crate: `MemorySink` keeps artifacts in memory and
// forgets them once their link expires; `DirectorySink` writes them to disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use pdfmerge_core::error::{PdfMergeError, Result};
use pdfmerge_core::format::format_file_size;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Name of the artifact produced at `now`: `PDFMerge_<YYYYMMDDTHHMMSSZ>.pdf`.
pub fn artifact_filename(now: DateTime<Utc>) -> String {
    format!("PDFMerge_{}.pdf", now.format("%Y%m%dT%H%M%SZ"))
}

/// Where a delivered artifact can be picked up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactLink {
    pub filename: String,
    /// Sink-specific locator: a file path or a `memory://` key.
    pub location: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    /// `None` when the link never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl ArtifactLink {
    fn new(
        filename: &str,
        location: String,
        size_bytes: u64,
        lifetime: Option<Duration>,
    ) -> Self {
        let created_at = Utc::now();
        let expires_at = lifetime
            .and_then(|lifetime| chrono::Duration::from_std(lifetime).ok())
            .map(|lifetime| created_at + lifetime);
        Self {
            filename: filename.to_string(),
            location,
            size_bytes,
            created_at,
            expires_at,
        }
    }

    pub fn size_label(&self) -> String {
        format_file_size(self.size_bytes)
    }

    /// `PDFMerge_20240115T143000Z.pdf (2 MB)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.filename, self.size_label())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

/// Receives the finished PDF of a run.
pub trait ArtifactSink: Send + Sync {
    /// Take ownership of `bytes` under `filename` and return a link to them.
    fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<ArtifactLink>;
}

// -- In-memory sink -----------------------------------------------------------

struct StoredArtifact {
    bytes: Arc<[u8]>,
    expires: Instant,
}

/// Keeps artifacts in memory until their link lifetime has passed.
pub struct MemorySink {
    lifetime: Duration,
    stored: Mutex<HashMap<String, StoredArtifact>>,
}

impl MemorySink {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            stored: Mutex::new(HashMap::new()),
        }
    }

    /// Bytes of a live artifact. Expired artifacts are dropped on the way.
    pub fn fetch(&self, filename: &str) -> Option<Arc<[u8]>> {
        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        purge_expired(&mut stored);
        stored.get(filename).map(|artifact| Arc::clone(&artifact.bytes))
    }

    /// Number of live artifacts.
    pub fn len(&self) -> usize {
        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        purge_expired(&mut stored);
        stored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn purge_expired(stored: &mut HashMap<String, StoredArtifact>) {
    let now = Instant::now();
    stored.retain(|filename, artifact| {
        let live = now < artifact.expires;
        if !live {
            debug!(file = %filename, "artifact link expired");
        }
        live
    });
}

impl ArtifactSink for MemorySink {
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<ArtifactLink> {
        let link = ArtifactLink::new(
            filename,
            format!("memory://{filename}"),
            bytes.len() as u64,
            Some(self.lifetime),
        );
        let expires = Instant::now() + self.lifetime;

        let mut stored = self.stored.lock().unwrap_or_else(PoisonError::into_inner);
        purge_expired(&mut stored);
        stored.insert(
            filename.to_string(),
            StoredArtifact {
                bytes: bytes.into(),
                expires,
            },
        );

        info!(file = %filename, lifetime_secs = self.lifetime.as_secs(), "artifact held in memory");
        Ok(link)
    }
}

// -- Directory sink -----------------------------------------------------------

/// Writes artifacts into a directory, creating it when missing.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    #[instrument(skip(self, bytes), fields(dir = %self.dir.display(), bytes_len = bytes.len()))]
    fn deliver(&self, filename: &str, bytes: Vec<u8>) -> Result<ArtifactLink> {
        std::fs::create_dir_all(&self.dir).map_err(|err| {
            PdfMergeError::Artifact(format!("cannot create {}: {}", self.dir.display(), err))
        })?;
        let path = self.dir.join(filename);
        std::fs::write(&path, &bytes).map_err(|err| {
            PdfMergeError::Artifact(format!("cannot write {}: {}", path.display(), err))
        })?;

        info!(path = %path.display(), "artifact written");
        Ok(ArtifactLink::new(
            filename,
            path.display().to_string(),
            bytes.len() as u64,
            None,
        ))
    }
}
