//! Lazy thumbnail loading.
//!
//! Each thumbnail starts as an inline SVG placeholder. When its element first
//! comes within [`LOOKAHEAD_MARGIN`] of the viewport it is unobserved (one
//! shot) and the real URL is probed; only a successful probe swaps the image
//! in. Failed probes are retried with linearly growing delays, after which a
//! generated icon for the file kind is shown. Without an intersection
//! observer every thumbnail loads eagerly.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::join_all;
use service_core::models::FileEntry;
use std::collections::HashMap;
use std::time::Duration;

pub const MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
/// Pixels above and below the viewport that already count as visible.
pub const LOOKAHEAD_MARGIN: f64 = 200.0;

const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="160" height="120" viewBox="0 0 160 120"><rect width="160" height="120" fill="#eceff1"/><rect x="56" y="36" width="48" height="40" rx="4" fill="#cfd8dc"/></svg>"##;

/// Probes an image URL before it is shown.
#[async_trait]
pub trait ImageProbe: Send + Sync {
    async fn probe(&self, url: &str) -> Result<(), String>;
}

/// Coarse file kind used for fallback icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Folder,
    Image,
    Video,
    Audio,
    Pdf,
    Archive,
    Document,
    Other,
}

impl FileKind {
    pub fn detect(entry: &FileEntry) -> Self {
        if entry.is_folder {
            return FileKind::Folder;
        }
        let extension = entry
            .extension()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match (entry.mime_type.as_str(), extension.as_str()) {
            (m, _) if m.starts_with("image/") => FileKind::Image,
            (m, _) if m.starts_with("video/") => FileKind::Video,
            (m, _) if m.starts_with("audio/") => FileKind::Audio,
            ("application/pdf", _) | (_, "pdf") => FileKind::Pdf,
            (_, "zip" | "rar" | "7z" | "tar" | "gz") => FileKind::Archive,
            (_, "doc" | "docx" | "odt" | "rtf" | "txt" | "md") => FileKind::Document,
            (_, "xls" | "xlsx" | "ppt" | "pptx") => FileKind::Document,
            (_, "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg") => FileKind::Image,
            _ => FileKind::Other,
        }
    }

    fn icon(self) -> (&'static str, &'static str) {
        match self {
            FileKind::Folder => ("#f9a825", "DIR"),
            FileKind::Image => ("#43a047", "IMG"),
            FileKind::Video => ("#e53935", "VID"),
            FileKind::Audio => ("#8e24aa", "AUD"),
            FileKind::Pdf => ("#c62828", "PDF"),
            FileKind::Archive => ("#6d4c41", "ZIP"),
            FileKind::Document => ("#1e88e5", "DOC"),
            FileKind::Other => ("#757575", "FILE"),
        }
    }
}

fn svg_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

pub fn placeholder_data_uri() -> String {
    svg_data_uri(PLACEHOLDER_SVG)
}

/// Generated icon shown when a thumbnail cannot be loaded.
pub fn fallback_icon(kind: FileKind) -> String {
    let (color, label) = kind.icon();
    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="160" height="120" viewBox="0 0 160 120"><rect width="160" height="120" rx="8" fill="{color}"/><text x="80" y="68" font-family="sans-serif" font-size="24" fill="#ffffff" text-anchor="middle">{label}</text></svg>"##
    );
    svg_data_uri(&svg)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailState {
    Placeholder,
    Loaded(String),
    Fallback(String),
}

impl ThumbnailState {
    /// Value for the image's `src` attribute.
    pub fn src(&self) -> String {
        match self {
            ThumbnailState::Placeholder => placeholder_data_uri(),
            ThumbnailState::Loaded(url) | ThumbnailState::Fallback(url) => url.clone(),
        }
    }
}

/// An element waiting for its thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailTarget {
    pub id: String,
    pub url: String,
    pub kind: FileKind,
    /// Element position in scroll coordinates.
    pub top: f64,
    pub height: f64,
}

pub struct ThumbnailLoader<P: ImageProbe> {
    probe: P,
    base_delay: Duration,
    observer_available: bool,
    observed: HashMap<String, ThumbnailTarget>,
    states: HashMap<String, ThumbnailState>,
}

impl<P: ImageProbe> ThumbnailLoader<P> {
    pub fn new(probe: P, observer_available: bool) -> Self {
        Self {
            probe,
            base_delay: DEFAULT_BASE_DELAY,
            observer_available,
            observed: HashMap::new(),
            states: HashMap::new(),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn is_eager(&self) -> bool {
        !self.observer_available
    }

    /// Registers an element; it shows the placeholder until loaded.
    pub fn observe(&mut self, target: ThumbnailTarget) {
        self.states
            .insert(target.id.clone(), ThumbnailState::Placeholder);
        self.observed.insert(target.id.clone(), target);
    }

    pub fn state(&self, id: &str) -> Option<&ThumbnailState> {
        self.states.get(id)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// Drops every observation, e.g. when the listing is replaced.
    pub fn clear(&mut self) {
        self.observed.clear();
        self.states.clear();
    }

    /// Takes the targets that intersect the viewport (plus margin) and stops
    /// observing them. In eager mode every observed target is taken.
    pub fn take_intersecting(
        &mut self,
        viewport_top: f64,
        viewport_height: f64,
    ) -> Vec<ThumbnailTarget> {
        let low = viewport_top - LOOKAHEAD_MARGIN;
        let high = viewport_top + viewport_height + LOOKAHEAD_MARGIN;
        let eager = self.is_eager();

        let ids: Vec<String> = self
            .observed
            .values()
            .filter(|t| eager || (t.top + t.height >= low && t.top <= high))
            .map(|t| t.id.clone())
            .collect();

        ids.iter()
            .filter_map(|id| self.observed.remove(id))
            .collect()
    }

    /// Probes once plus up to [`MAX_RETRIES`] retries, waiting
    /// `base_delay * attempt` before retry `attempt`.
    pub async fn load(&self, target: &ThumbnailTarget) -> ThumbnailState {
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(self.base_delay * attempt).await;
            }
            match self.probe.probe(&target.url).await {
                Ok(()) => return ThumbnailState::Loaded(target.url.clone()),
                Err(e) => {
                    tracing::debug!(id = %target.id, attempt, error = %e, "Thumbnail probe failed");
                }
            }
        }
        tracing::warn!(id = %target.id, "Thumbnail unavailable, using fallback icon");
        ThumbnailState::Fallback(fallback_icon(target.kind))
    }

    /// Loads everything now intersecting the viewport and records the results.
    /// Returns the ids that changed.
    pub async fn load_visible(&mut self, viewport_top: f64, viewport_height: f64) -> Vec<String> {
        let targets = self.take_intersecting(viewport_top, viewport_height);
        let results = join_all(targets.iter().map(|t| self.load(t))).await;

        targets
            .into_iter()
            .zip(results)
            .map(|(target, state)| {
                self.states.insert(target.id.clone(), state);
                target.id
            })
            .collect()
    }
}
