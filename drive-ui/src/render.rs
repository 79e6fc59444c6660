//! Markup for the browser view.
//!
//! Templates live under `templates/`; askama escapes every interpolated value,
//! so file and folder names are safe to render as-is.

use crate::session::BreadcrumbEntry;
use crate::thumbnails::{fallback_icon, FileKind};
use askama::Template;
use chrono::DateTime;
use service_core::models::{FileEntry, PaginationState};

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// `1536` → `1.5 KB`. Whole bytes are printed without decimals.
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, SIZE_UNITS[0])
    } else {
        format!("{:.1} {}", value, SIZE_UNITS[unit])
    }
}

/// RFC 3339 timestamp to `Mar 4, 2024`; unparseable values pass through.
pub fn format_modified(modified: Option<&str>) -> String {
    match modified {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => "-".to_string(),
    }
}

fn display_size(entry: &FileEntry) -> String {
    match (entry.is_folder, entry.size) {
        (true, _) | (false, None) => "-".to_string(),
        (false, Some(size)) => format_size(size),
    }
}

#[derive(Template)]
#[template(path = "row.html")]
pub struct RowTemplate<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub is_folder: bool,
    pub selected: bool,
    pub size: String,
    pub modified: String,
    pub thumbnail: String,
    pub download_url: String,
    pub location: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "card.html")]
pub struct CardTemplate<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub is_folder: bool,
    pub selected: bool,
    pub size: String,
    pub thumbnail: String,
}

#[derive(Template)]
#[template(path = "breadcrumbs.html")]
pub struct BreadcrumbsTemplate<'a> {
    pub crumbs: &'a [BreadcrumbEntry],
}

#[derive(Template)]
#[template(path = "search_banner.html")]
pub struct SearchBannerTemplate<'a> {
    pub query: &'a str,
    pub count: usize,
}

#[derive(Template)]
#[template(path = "pagination.html")]
pub struct PaginationTemplate {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_files: usize,
    pub start_index: usize,
    pub end_index: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_page: usize,
    pub next_page: usize,
}

impl From<&PaginationState> for PaginationTemplate {
    fn from(state: &PaginationState) -> Self {
        Self {
            current_page: state.current_page,
            total_pages: state.total_pages,
            total_files: state.total_files,
            start_index: state.start_index,
            end_index: state.end_index,
            has_prev: state.has_prev,
            has_next: state.has_next,
            prev_page: state.current_page.saturating_sub(1).max(1),
            next_page: (state.current_page + 1).min(state.total_pages.max(1)),
        }
    }
}

/// Per-item inputs the entry itself does not carry.
pub struct ItemContext<'a> {
    pub selected: bool,
    /// Current `src` for the thumbnail; the kind icon when `None`.
    pub thumbnail: Option<String>,
    pub download_url: &'a str,
}

fn thumbnail_src(entry: &FileEntry, thumbnail: Option<String>) -> String {
    thumbnail.unwrap_or_else(|| fallback_icon(FileKind::detect(entry)))
}

pub fn render_row(entry: &FileEntry, ctx: ItemContext<'_>) -> askama::Result<String> {
    RowTemplate {
        id: &entry.id,
        name: &entry.name,
        is_folder: entry.is_folder,
        selected: ctx.selected,
        size: display_size(entry),
        modified: format_modified(entry.modified_time.as_deref()),
        thumbnail: thumbnail_src(entry, ctx.thumbnail),
        download_url: ctx.download_url.to_string(),
        location: entry.path.as_deref(),
    }
    .render()
}

pub fn render_card(entry: &FileEntry, ctx: ItemContext<'_>) -> askama::Result<String> {
    CardTemplate {
        id: &entry.id,
        name: &entry.name,
        is_folder: entry.is_folder,
        selected: ctx.selected,
        size: display_size(entry),
        thumbnail: thumbnail_src(entry, ctx.thumbnail),
    }
    .render()
}

pub fn render_breadcrumbs(crumbs: &[BreadcrumbEntry]) -> askama::Result<String> {
    BreadcrumbsTemplate { crumbs }.render()
}

pub fn render_search_banner(query: &str, count: usize) -> askama::Result<String> {
    SearchBannerTemplate { query, count }.render()
}

/// Nothing is rendered for a single page.
pub fn render_pagination(state: &PaginationState) -> askama::Result<String> {
    if state.total_pages <= 1 {
        return Ok(String::new());
    }
    PaginationTemplate::from(state).render()
}
