//! Client session state.
//!
//! One [`SessionState`] owns everything the browser derives while the user
//! moves around: the current folder, the breadcrumb stack, cached folder
//! names, search mode, selection, clipboard staging and view preferences.
//!
//! Every navigation (folder open, breadcrumb jump, search enter or exit)
//! bumps a generation counter and hands out a [`NavigationTicket`]. Responses
//! are applied only while their ticket is still current, so a slow listing
//! can never overwrite the screen the user has since moved to.

use serde::{Deserialize, Serialize};
use service_core::models::{SortField, SortOrder};
use std::collections::{BTreeSet, HashMap};

/// Alias the API resolves to the app root folder.
pub const ROOT_ID: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreadcrumbEntry {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    /// `return_to` is the folder shown before the search started.
    Search { query: String, return_to: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    #[default]
    List,
    Grid,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::List => ViewMode::Grid,
            ViewMode::Grid => ViewMode::List,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardMode {
    Cut,
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clipboard {
    pub mode: ClipboardMode,
    pub ids: Vec<String>,
}

/// Identifies one navigation. Stale tickets mean the user moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NavigationTicket(u64);

#[derive(Debug, Clone)]
pub struct SessionState {
    current_folder: String,
    breadcrumbs: Vec<BreadcrumbEntry>,
    folder_names: HashMap<String, String>,
    mode: Mode,
    selection: BTreeSet<String>,
    clipboard: Option<Clipboard>,
    sort_by: SortField,
    sort_order: SortOrder,
    view: ViewMode,
    page: usize,
    generation: u64,
}

impl SessionState {
    pub fn new(root_name: impl Into<String>) -> Self {
        let root_name = root_name.into();
        Self {
            current_folder: ROOT_ID.to_string(),
            breadcrumbs: vec![BreadcrumbEntry {
                id: ROOT_ID.to_string(),
                name: root_name.clone(),
            }],
            folder_names: HashMap::from([(ROOT_ID.to_string(), root_name)]),
            mode: Mode::Browse,
            selection: BTreeSet::new(),
            clipboard: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            view: ViewMode::default(),
            page: 1,
            generation: 0,
        }
    }

    pub fn current_folder(&self) -> &str {
        &self.current_folder
    }

    /// `None` at the root, which the API treats as its default parent.
    pub fn parent_param(&self) -> Option<&str> {
        (self.current_folder != ROOT_ID).then_some(self.current_folder.as_str())
    }

    pub fn breadcrumbs(&self) -> &[BreadcrumbEntry] {
        &self.breadcrumbs
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.mode, Mode::Search { .. })
    }

    pub fn sort(&self) -> (SortField, SortOrder) {
        (self.sort_by, self.sort_order)
    }

    /// Same field flips the direction; a new field starts ascending.
    pub fn set_sort(&mut self, field: SortField) {
        if self.sort_by == field {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_by = field;
            self.sort_order = SortOrder::Asc;
        }
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn toggle_view(&mut self) -> ViewMode {
        self.view = self.view.toggled();
        self.view
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_page(&mut self, page: usize) -> NavigationTicket {
        self.page = page.max(1);
        self.begin_navigation()
    }

    pub fn remember_folder(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.folder_names.insert(id.into(), name.into());
    }

    pub fn folder_name(&self, id: &str) -> Option<&str> {
        self.folder_names.get(id).map(String::as_str)
    }

    /// Starts a new navigation, invalidating every earlier ticket.
    pub fn begin_navigation(&mut self) -> NavigationTicket {
        self.generation += 1;
        NavigationTicket(self.generation)
    }

    pub fn is_current(&self, ticket: NavigationTicket) -> bool {
        ticket.0 == self.generation
    }

    fn reset_view_state(&mut self) {
        self.selection.clear();
        self.page = 1;
    }

    /// Enters `id`. Re-entering a folder already on the breadcrumb stack jumps
    /// back to it instead of pushing a duplicate.
    pub fn open_folder(&mut self, id: &str, name: Option<&str>) -> NavigationTicket {
        let name = name
            .map(str::to_string)
            .or_else(|| self.folder_names.get(id).cloned())
            .unwrap_or_else(|| id.to_string());
        self.remember_folder(id, name.clone());

        if let Some(pos) = self.breadcrumbs.iter().position(|c| c.id == id) {
            self.breadcrumbs.truncate(pos + 1);
        } else {
            self.breadcrumbs.push(BreadcrumbEntry {
                id: id.to_string(),
                name,
            });
        }

        self.current_folder = id.to_string();
        self.mode = Mode::Browse;
        self.reset_view_state();
        self.begin_navigation()
    }

    /// Truncates the stack to `index + 1` entries and re-opens that folder.
    pub fn navigate_breadcrumb(&mut self, index: usize) -> Option<NavigationTicket> {
        let target = self.breadcrumbs.get(index)?.id.clone();
        self.breadcrumbs.truncate(index + 1);
        self.current_folder = target;
        self.mode = Mode::Browse;
        self.reset_view_state();
        Some(self.begin_navigation())
    }

    /// Search bypasses the folder model; the breadcrumb stack is left intact
    /// for the way back.
    pub fn enter_search(&mut self, query: &str) -> NavigationTicket {
        let return_to = match &self.mode {
            Mode::Search { return_to, .. } => return_to.clone(),
            Mode::Browse => self.current_folder.clone(),
        };
        self.mode = Mode::Search {
            query: query.trim().to_string(),
            return_to,
        };
        self.reset_view_state();
        self.begin_navigation()
    }

    /// Leaves search and returns to the folder it started from.
    pub fn exit_search(&mut self) -> NavigationTicket {
        if let Mode::Search { return_to, .. } = std::mem::replace(&mut self.mode, Mode::Browse) {
            self.current_folder = return_to;
        }
        self.reset_view_state();
        self.begin_navigation()
    }

    pub fn selection(&self) -> &BTreeSet<String> {
        &self.selection
    }

    pub fn toggle_selection(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
    }

    pub fn select_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        self.selection.extend(ids.into_iter().map(str::to_string));
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Stages the selection for a later paste. Returns false when nothing is
    /// selected.
    pub fn stage(&mut self, mode: ClipboardMode) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.clipboard = Some(Clipboard {
            mode,
            ids: self.selection.iter().cloned().collect(),
        });
        true
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    /// Cut is consumed by a paste; a copy can be pasted repeatedly.
    pub fn take_clipboard(&mut self) -> Option<Clipboard> {
        match self.clipboard.as_ref()?.mode {
            ClipboardMode::Cut => self.clipboard.take(),
            ClipboardMode::Copy => self.clipboard.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breadcrumbs_start_at_root_and_truncate_on_jump() {
        let mut session = SessionState::new("My Drive");
        session.open_folder("a", Some("A"));
        session.open_folder("b", Some("B"));
        session.open_folder("c", Some("C"));

        assert_eq!(session.breadcrumbs().len(), 4);
        session.navigate_breadcrumb(1).unwrap();

        let names: Vec<_> = session.breadcrumbs().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["My Drive", "A"]);
        assert_eq!(session.current_folder(), "a");
        assert!(session.navigate_breadcrumb(5).is_none());
    }

    #[test]
    fn reopening_a_crumb_does_not_duplicate_it() {
        let mut session = SessionState::new("My Drive");
        session.open_folder("a", Some("A"));
        session.open_folder("b", Some("B"));
        session.open_folder("a", None);

        assert_eq!(session.breadcrumbs().len(), 2);
        assert_eq!(session.folder_name("a"), Some("A"));
    }

    #[test]
    fn each_navigation_invalidates_older_tickets() {
        let mut session = SessionState::new("My Drive");
        let first = session.open_folder("a", Some("A"));
        let second = session.enter_search("report");

        assert!(!session.is_current(first));
        assert!(session.is_current(second));
    }

    #[test]
    fn search_returns_to_the_folder_it_left() {
        let mut session = SessionState::new("My Drive");
        session.open_folder("a", Some("A"));
        session.enter_search("x");
        session.enter_search("y");

        assert!(session.is_searching());
        assert_eq!(session.breadcrumbs().len(), 2);

        session.exit_search();
        assert_eq!(session.current_folder(), "a");
        assert_eq!(session.mode(), &Mode::Browse);
    }

    #[test]
    fn navigation_clears_selection_and_page() {
        let mut session = SessionState::new("My Drive");
        session.toggle_selection("f1");
        session.set_page(3);

        session.open_folder("a", Some("A"));

        assert!(session.selection().is_empty());
        assert_eq!(session.page(), 1);
    }

    #[test]
    fn cut_is_consumed_but_copy_persists() {
        let mut session = SessionState::new("My Drive");
        assert!(!session.stage(ClipboardMode::Cut));

        session.toggle_selection("f1");
        session.stage(ClipboardMode::Copy);
        assert!(session.take_clipboard().is_some());
        assert!(session.take_clipboard().is_some());

        session.stage(ClipboardMode::Cut);
        assert_eq!(session.take_clipboard().unwrap().ids, vec!["f1"]);
        assert!(session.take_clipboard().is_none());
    }

    #[test]
    fn sorting_the_same_field_flips_direction() {
        let mut session = SessionState::new("My Drive");
        session.set_sort(SortField::Name);
        assert_eq!(session.sort(), (SortField::Name, SortOrder::Desc));

        session.set_sort(SortField::Size);
        assert_eq!(session.sort(), (SortField::Size, SortOrder::Asc));
    }
}
