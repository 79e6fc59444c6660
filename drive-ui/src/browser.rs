//! Browser controller.
//!
//! [`FileBrowser`] ties the session, the API client and the renderers
//! together. Loads are split into three steps so callers can interleave
//! them: `begin` bumps the session generation and returns a [`PendingLoad`],
//! `fetch` talks to the API without touching state, and `apply` installs the
//! result only if its ticket is still current. The one-shot helpers
//! (`open_folder`, `search`, ...) run all three in sequence.

use crate::api::{ClientError, DriveApi, ListQuery};
use crate::render::{self, ItemContext};
use crate::session::{ClipboardMode, Mode, NavigationTicket, SessionState, ViewMode};
use crate::virtual_scroll::{Geometry, ScrollFrame, VirtualScroller};
use futures::future::join_all;
use service_core::models::{
    sort_entries, BatchResult, FileEntry, PaginationState, SortField, SortOrder, StorageQuota,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Failed to render view: {0}")]
    Render(#[from] askama::Error),

    #[error("Nothing to paste")]
    EmptyClipboard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrowserConfig {
    /// Items per page; `None` loads the whole folder in one request.
    pub page_limit: Option<usize>,
    pub list_geometry: Geometry,
    pub grid_geometry: Geometry,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            page_limit: Some(50),
            list_geometry: Geometry::List { row_height: 48.0 },
            grid_geometry: Geometry::Grid {
                row_height: 200.0,
                min_item_width: 160.0,
                gap: 16.0,
            },
            viewport_width: 1024.0,
            viewport_height: 768.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Folder {
        parent_id: Option<String>,
        page: usize,
        sort_by: SortField,
        sort_order: SortOrder,
    },
    Search {
        query: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    pub ticket: NavigationTicket,
    pub request: LoadRequest,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub entries: Vec<FileEntry>,
    pub pagination: Option<PaginationState>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListingView {
    /// Below the virtualization threshold every item is rendered.
    Full(String),
    /// Only the slice in `frame.range`.
    Virtual { frame: ScrollFrame, markup: String },
}

impl ListingView {
    pub fn markup(&self) -> &str {
        match self {
            ListingView::Full(markup) | ListingView::Virtual { markup, .. } => markup,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    /// Breadcrumb bar, or the search banner while searching.
    pub header: String,
    pub listing: ListingView,
    pub pagination: String,
}

pub struct FileBrowser<A: DriveApi + ?Sized> {
    api: Arc<A>,
    config: BrowserConfig,
    session: SessionState,
    listing: Listing,
    quota: Option<StorageQuota>,
    scroller: VirtualScroller,
}

impl<A: DriveApi + ?Sized> FileBrowser<A> {
    pub fn new(api: Arc<A>, root_name: impl Into<String>, config: BrowserConfig) -> Self {
        let scroller = VirtualScroller::new(
            config.list_geometry,
            config.viewport_width,
            config.viewport_height,
        );
        Self {
            api,
            config,
            session: SessionState::new(root_name),
            listing: Listing::default(),
            quota: None,
            scroller,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.listing.entries
    }

    pub fn pagination(&self) -> Option<&PaginationState> {
        self.listing.pagination.as_ref()
    }

    pub fn quota(&self) -> Option<&StorageQuota> {
        self.quota.as_ref()
    }

    pub fn scroller(&self) -> &VirtualScroller {
        &self.scroller
    }

    fn current_request(&self) -> LoadRequest {
        match self.session.mode() {
            Mode::Search { query, .. } => LoadRequest::Search {
                query: query.clone(),
            },
            Mode::Browse => {
                let (sort_by, sort_order) = self.session.sort();
                LoadRequest::Folder {
                    parent_id: self.session.parent_param().map(str::to_string),
                    page: self.session.page(),
                    sort_by,
                    sort_order,
                }
            }
        }
    }

    fn pending(&self, ticket: NavigationTicket) -> PendingLoad {
        PendingLoad {
            ticket,
            request: self.current_request(),
        }
    }

    pub fn begin_open_folder(&mut self, id: &str, name: Option<&str>) -> PendingLoad {
        let ticket = self.session.open_folder(id, name);
        self.pending(ticket)
    }

    pub fn begin_search(&mut self, query: &str) -> PendingLoad {
        let ticket = self.session.enter_search(query);
        self.pending(ticket)
    }

    pub fn begin_refresh(&mut self) -> PendingLoad {
        let ticket = self.session.begin_navigation();
        self.pending(ticket)
    }

    /// Runs the request. Never mutates the browser.
    pub async fn fetch(&self, load: &PendingLoad) -> Result<Listing, ClientError> {
        match &load.request {
            LoadRequest::Search { query } => {
                let entries = self.api.search(query).await?;
                Ok(Listing {
                    entries,
                    pagination: None,
                })
            }
            LoadRequest::Folder {
                parent_id,
                page,
                sort_by,
                sort_order,
            } => match self.config.page_limit {
                Some(limit) => {
                    let query = ListQuery {
                        page: *page,
                        limit,
                        sort_by: *sort_by,
                        sort_order: *sort_order,
                    };
                    let page = self.api.list_page(parent_id.as_deref(), query).await?;
                    Ok(Listing {
                        entries: page.files,
                        pagination: Some(page.pagination),
                    })
                }
                None => {
                    let entries = self
                        .api
                        .list_all(parent_id.as_deref(), *sort_by, *sort_order)
                        .await?;
                    Ok(Listing {
                        entries,
                        pagination: None,
                    })
                }
            },
        }
    }

    /// Installs `listing` if `ticket` is still current. Returns false when
    /// the response was discarded as stale.
    pub fn apply(&mut self, ticket: NavigationTicket, mut listing: Listing) -> bool {
        if !self.session.is_current(ticket) {
            tracing::debug!("Discarding stale listing response");
            return false;
        }
        // The server already sorts; folders-first is re-applied so a
        // misbehaving backend can never interleave them.
        if !self.session.is_searching() {
            let (field, order) = self.session.sort();
            sort_entries(&mut listing.entries, field, order);
        }
        for entry in listing.entries.iter().filter(|e| e.is_folder) {
            self.session.remember_folder(entry.id.clone(), entry.name.clone());
        }
        self.scroller.update_items(listing.entries.len());
        self.listing = listing;
        true
    }

    async fn run(&mut self, load: PendingLoad) -> Result<bool, BrowserError> {
        let listing = self.fetch(&load).await?;
        Ok(self.apply(load.ticket, listing))
    }

    /// Cached display name for `id`, else the server's answer, which is then
    /// cached. A failed lookup leaves the name unresolved.
    async fn resolve_folder_name(&mut self, id: &str) -> Option<String> {
        if let Some(name) = self.session.folder_name(id) {
            return Some(name.to_string());
        }
        match self.api.folder_info(id).await {
            Ok(info) => {
                self.session.remember_folder(id, info.name.clone());
                Some(info.name)
            }
            Err(e) => {
                tracing::warn!(folder_id = %id, error = %e, "Folder name lookup failed");
                None
            }
        }
    }

    /// The quota display is secondary; a failed refresh keeps the old value.
    async fn refresh_quota_quietly(&mut self) {
        if let Err(e) = self.refresh_quota().await {
            tracing::warn!(error = %e, "Storage quota refresh failed");
        }
    }

    pub async fn open_folder(
        &mut self,
        id: &str,
        name: Option<&str>,
    ) -> Result<bool, BrowserError> {
        let name = match name {
            Some(name) => Some(name.to_string()),
            None => self.resolve_folder_name(id).await,
        };
        let load = self.begin_open_folder(id, name.as_deref());
        let applied = self.run(load).await?;
        self.refresh_quota_quietly().await;
        Ok(applied)
    }

    pub async fn navigate_breadcrumb(&mut self, index: usize) -> Result<bool, BrowserError> {
        let Some(ticket) = self.session.navigate_breadcrumb(index) else {
            return Ok(false);
        };
        let load = self.pending(ticket);
        let applied = self.run(load).await?;
        self.refresh_quota_quietly().await;
        Ok(applied)
    }

    /// While searching the results are re-sorted in place; otherwise the
    /// folder is reloaded in the new order.
    pub async fn change_sort(&mut self, field: SortField) -> Result<bool, BrowserError> {
        self.session.set_sort(field);
        if self.session.is_searching() {
            let (field, order) = self.session.sort();
            sort_entries(&mut self.listing.entries, field, order);
            return Ok(true);
        }
        let load = self.begin_refresh();
        self.run(load).await
    }

    pub fn toggle_view(&mut self) -> ViewMode {
        let view = self.session.toggle_view();
        let geometry = match view {
            ViewMode::List => self.config.list_geometry,
            ViewMode::Grid => self.config.grid_geometry,
        };
        self.scroller.set_geometry(geometry);
        view
    }

    /// An empty query leaves search mode instead.
    pub async fn search(&mut self, query: &str) -> Result<bool, BrowserError> {
        if query.trim().is_empty() {
            return self.exit_search().await;
        }
        let load = self.begin_search(query);
        self.run(load).await
    }

    pub async fn exit_search(&mut self) -> Result<bool, BrowserError> {
        let ticket = self.session.exit_search();
        let load = self.pending(ticket);
        self.run(load).await
    }

    pub async fn refresh(&mut self) -> Result<bool, BrowserError> {
        let load = self.begin_refresh();
        self.run(load).await
    }

    pub async fn go_to_page(&mut self, page: usize) -> Result<bool, BrowserError> {
        let ticket = self.session.set_page(page);
        let load = self.pending(ticket);
        self.run(load).await
    }

    /// Moves every selected item to the trash. All requests are issued at
    /// once and each settles independently.
    pub async fn delete_selected(&mut self) -> Result<Vec<BatchResult>, BrowserError> {
        let api = self.api.as_ref();
        let results = join_all(self.session.selection().iter().map(|id| async move {
            match api.delete(id).await {
                Ok(_) => BatchResult::ok(id.clone(), None),
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "Delete failed");
                    BatchResult::failed(id.clone(), e)
                }
            }
        }))
        .await;
        self.session.clear_selection();
        self.refresh().await?;
        self.refresh_quota().await?;
        Ok(results)
    }

    pub fn stage(&mut self, mode: ClipboardMode) -> bool {
        self.session.stage(mode)
    }

    /// Pastes the clipboard into the current folder: a cut moves, a copy copies.
    pub async fn paste(&mut self) -> Result<Vec<BatchResult>, BrowserError> {
        let clipboard = self
            .session
            .take_clipboard()
            .ok_or(BrowserError::EmptyClipboard)?;
        let target = self.session.current_folder().to_string();

        let results = match clipboard.mode {
            ClipboardMode::Cut => self.api.move_items(&clipboard.ids, &target).await?,
            ClipboardMode::Copy => self.api.copy_items(&clipboard.ids, &target).await?,
        };
        self.refresh().await?;
        Ok(results)
    }

    /// Drag-and-drop: moves `ids` into `target_id`. Dropping a folder onto
    /// itself is ignored.
    pub async fn drop_onto(
        &mut self,
        ids: &[String],
        target_id: &str,
    ) -> Result<Vec<BatchResult>, BrowserError> {
        let ids: Vec<String> = ids.iter().filter(|id| *id != target_id).cloned().collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let results = self.api.move_items(&ids, target_id).await?;
        self.refresh().await?;
        Ok(results)
    }

    pub async fn refresh_quota(&mut self) -> Result<&StorageQuota, BrowserError> {
        let quota = self.api.storage().await?;
        Ok(self.quota.insert(quota))
    }

    pub fn resize(&mut self, width: f64, height: f64) -> ScrollFrame {
        self.scroller.resize(width, height)
    }

    pub fn on_scroll(&mut self, scroll_top: f64, now: Instant) -> Option<ScrollFrame> {
        self.scroller.on_scroll(scroll_top, now)
    }

    fn render_item(&self, entry: &FileEntry, thumbnail: Option<String>) -> askama::Result<String> {
        let download_url = self.api.download_url(&entry.id);
        let ctx = ItemContext {
            selected: self.session.selection().contains(&entry.id),
            thumbnail,
            download_url: &download_url,
        };
        match self.session.view() {
            ViewMode::List => render::render_row(entry, ctx),
            ViewMode::Grid => render::render_card(entry, ctx),
        }
    }

    /// Renders the current state. `thumbnail` supplies the image source for
    /// an entry when one is known.
    pub fn render_with(
        &self,
        thumbnail: impl Fn(&FileEntry) -> Option<String>,
    ) -> Result<RenderedView, BrowserError> {
        let header = match self.session.mode() {
            Mode::Search { query, .. } => {
                render::render_search_banner(query, self.listing.entries.len())?
            }
            Mode::Browse => render::render_breadcrumbs(self.session.breadcrumbs())?,
        };

        let frame = self.scroller.frame();
        let entries = &self.listing.entries;
        let end = frame.range.end.min(entries.len());
        let start = frame.range.start.min(end);
        let mut markup = String::new();
        for entry in &entries[start..end] {
            markup.push_str(&self.render_item(entry, thumbnail(entry))?);
        }
        let listing = if self.scroller.is_enabled() {
            ListingView::Virtual { frame, markup }
        } else {
            ListingView::Full(markup)
        };

        let pagination = match &self.listing.pagination {
            Some(state) => render::render_pagination(state)?,
            None => String::new(),
        };

        Ok(RenderedView {
            header,
            listing,
            pagination,
        })
    }

    pub fn render(&self) -> Result<RenderedView, BrowserError> {
        self.render_with(|_| None)
    }
}
