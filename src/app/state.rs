use std::time::{Duration, Instant};

use crate::config::Palette;
use crate::list::{Chrome, DeleteTicket, InputField, ShoppingList};
use crate::storage::KeyValueStore;

const STATUS_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    List,
    Filter,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    ConfirmDelete(DeleteTicket),
}

/// Screen-only state layered over the list: focus, cursor, filter buffer,
/// status line and overlays.
#[derive(Debug, Clone)]
pub struct AppState {
    pub focus: FocusPane,
    pub selected: usize,
    pub filter_input: InputField,
    pub status_message: Option<String>,
    status_set_at: Option<Instant>,
    pub overlay: Option<OverlayState>,
    pub palette: Palette,
}

impl AppState {
    pub fn new(palette: Palette) -> Self {
        Self {
            focus: FocusPane::Input,
            selected: 0,
            filter_input: InputField::default(),
            status_message: None,
            status_set_at: None,
            overlay: None,
            palette,
        }
    }

    /// Tab order; the filter pane is skipped while it is hidden.
    pub fn cycle_focus(&mut self, chrome: Chrome) {
        self.focus = match self.focus {
            FocusPane::Input => FocusPane::List,
            FocusPane::List if chrome.contains(Chrome::FILTER) => FocusPane::Filter,
            FocusPane::List | FocusPane::Filter => FocusPane::Input,
        };
    }

    pub fn move_selection(&mut self, delta: isize, visible: usize) {
        if visible == 0 {
            self.selected = 0;
            return;
        }
        let next = (self.selected as isize + delta).clamp(0, visible as isize - 1);
        self.selected = next as usize;
    }

    /// Keeps the cursor and focus valid after the list changed under them.
    pub fn sync_with<S: KeyValueStore>(&mut self, list: &ShoppingList<S>) {
        let visible = list.visible_indices().len();
        if visible == 0 {
            self.selected = 0;
        } else if self.selected >= visible {
            self.selected = visible - 1;
        }
        if self.focus == FocusPane::Filter && !list.chrome().contains(Chrome::FILTER) {
            self.focus = FocusPane::Input;
        }
        if list.filter().is_empty() && !self.filter_input.is_empty() {
            self.filter_input.clear();
        }
    }

    /// Index into the list's entries of the highlighted row.
    pub fn selected_entry<S: KeyValueStore>(&self, list: &ShoppingList<S>) -> Option<usize> {
        list.visible_indices().get(self.selected).copied()
    }

    pub fn set_status_message<M: Into<String>>(&mut self, message: Option<M>) {
        self.status_message = message.map(Into::into);
        self.status_set_at = self.status_message.as_ref().map(|_| Instant::now());
    }

    pub fn expire_status(&mut self, now: Instant) {
        if let Some(set_at) = self.status_set_at {
            if now.duration_since(set_at) >= STATUS_TTL && self.overlay.is_none() {
                self.status_message = None;
                self.status_set_at = None;
            }
        }
    }

    pub fn open_confirm_delete(&mut self, ticket: DeleteTicket) {
        self.overlay = Some(OverlayState::ConfirmDelete(ticket));
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn pending_ticket(&self) -> Option<&DeleteTicket> {
        match &self.overlay {
            Some(OverlayState::ConfirmDelete(ticket)) => Some(ticket),
            None => None,
        }
    }
}
