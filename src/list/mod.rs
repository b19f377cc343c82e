//! Shopping-list state: displayed entries, the input field, the single edit
//! target and which list controls are shown.
//!
//! Every mutation is written to the [`ItemRepository`] first and only then
//! applied to the display, so a failed write changes nothing. Items have no identity besides their text, so store removals
//! always drop the first stored item with matching text.

use bitflags::bitflags;
use strum::Display;

use crate::config::ListOptions;
use crate::filter::FilterQuery;
use crate::storage::{ItemRepository, KeyValueStore, StoreError};

mod input;

pub use input::InputField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum SubmitMode {
    #[default]
    #[strum(to_string = "Add Item")]
    Add,
    #[strum(to_string = "Update Item")]
    Update,
}

bitflags! {
    /// List controls that only make sense when there is something to act on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Chrome: u8 {
        const CLEAR_ALL = 0b01;
        const FILTER = 0b10;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    text: String,
    visible: bool,
}

impl Entry {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing changed.
    Rejected,
    Added { text: String, duplicate: bool },
    Updated { from: String, to: String },
}

/// A delete waiting for the user's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTicket {
    id: u64,
    index: usize,
    text: String,
}

impl DeleteTicket {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed { text: String },
    Kept { text: String },
    /// The ticket was superseded or its entry is gone.
    Stale,
}

pub struct ShoppingList<S> {
    repo: ItemRepository<S>,
    options: ListOptions,
    entries: Vec<Entry>,
    input: InputField,
    submit_mode: SubmitMode,
    edit_target: Option<usize>,
    chrome: Chrome,
    filter: FilterQuery,
    pending_delete: Option<DeleteTicket>,
    next_ticket: u64,
}

impl<S: KeyValueStore> ShoppingList<S> {
    /// Replays the stored list in order. An unreadable entry starts the list
    /// empty and is overwritten by the next change.
    pub fn bootstrap(repo: ItemRepository<S>, options: ListOptions) -> Result<Self, StoreError> {
        let stored = match repo.load() {
            Ok(items) => items,
            Err(err @ StoreError::CorruptEntry { .. }) => {
                tracing::warn!(error = %err, key = repo.key(), "stored list unreadable, starting empty");
                Vec::new()
            }
            Err(err) => return Err(err),
        };
        let mut list = Self {
            repo,
            options,
            entries: Vec::with_capacity(stored.len()),
            input: InputField::default(),
            submit_mode: SubmitMode::Add,
            edit_target: None,
            chrome: Chrome::empty(),
            filter: FilterQuery::default(),
            pending_delete: None,
            next_ticket: 0,
        };
        for text in stored {
            list.append_entry(text);
        }
        list.refresh_visibility();
        tracing::debug!(items = list.entries.len(), "list replayed from store");
        Ok(list)
    }

    /// Submits whatever is in the input field.
    pub fn submit_input(&mut self) -> Result<SubmitOutcome, StoreError> {
        let raw = self.input.value().to_string();
        self.submit(&raw)
    }

    pub fn submit(&mut self, raw: &str) -> Result<SubmitOutcome, StoreError> {
        let text = raw.trim();
        if text.is_empty() {
            tracing::info!("please add an item");
            return Ok(SubmitOutcome::Rejected);
        }
        let text = text.to_string();

        let replaced = match self.edit_target {
            Some(index) if index < self.entries.len() => {
                let from = self.entries[index].text.clone();
                self.persist_replace(index, &from, &text)?;
                self.entries.remove(index);
                Some(from)
            }
            _ => {
                self.persist_append(&text)?;
                None
            }
        };

        let duplicate =
            self.options.warn_on_duplicates && self.entries.iter().any(|entry| entry.text == text);
        self.append_entry(text.clone());
        self.input.clear();
        self.refresh_visibility();

        Ok(match replaced {
            Some(from) => {
                tracing::debug!(%from, to = %text, "item updated");
                SubmitOutcome::Updated { from, to: text }
            }
            None => {
                tracing::debug!(%text, duplicate, "item added");
                SubmitOutcome::Added { text, duplicate }
            }
        })
    }

    /// Targets one entry for editing and loads its text into the input.
    pub fn select_for_edit(&mut self, index: usize) -> Option<&str> {
        let entry = self.entries.get(index)?;
        self.edit_target = Some(index);
        self.input.set(&entry.text);
        self.submit_mode = SubmitMode::Update;
        Some(entry.text.as_str())
    }

    /// Starts a delete. Nothing is removed until the ticket is resolved; a
    /// newer request supersedes an unresolved one.
    pub fn request_delete(&mut self, index: usize) -> Option<DeleteTicket> {
        let entry = self.entries.get(index)?;
        self.next_ticket += 1;
        let ticket = DeleteTicket {
            id: self.next_ticket,
            index,
            text: entry.text.clone(),
        };
        if let Some(previous) = self.pending_delete.replace(ticket.clone()) {
            tracing::debug!(ticket = previous.id, "pending delete superseded");
        }
        Some(ticket)
    }

    pub fn resolve_delete(
        &mut self,
        ticket: &DeleteTicket,
        confirmed: bool,
    ) -> Result<DeleteOutcome, StoreError> {
        if self.pending_delete.as_ref().map(|pending| pending.id) != Some(ticket.id) {
            return Ok(DeleteOutcome::Stale);
        }
        self.pending_delete = None;

        if !confirmed {
            self.refresh_visibility();
            return Ok(DeleteOutcome::Kept {
                text: ticket.text.clone(),
            });
        }

        let Some(index) = self.locate(ticket) else {
            self.refresh_visibility();
            return Ok(DeleteOutcome::Stale);
        };
        self.persist_remove(index, &ticket.text)?;
        let removed = self.entries.remove(index);
        self.refresh_visibility();
        tracing::debug!(text = %removed.text, "item removed");
        Ok(DeleteOutcome::Removed { text: removed.text })
    }

    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        self.repo.clear()?;
        let cleared = self.entries.len();
        self.entries.clear();
        self.pending_delete = None;
        self.refresh_visibility();
        tracing::debug!(cleared, "list cleared");
        Ok(())
    }

    /// Shows entries containing `query`, ignoring case; hides the rest.
    pub fn filter_changed(&mut self, query: &str) -> usize {
        self.filter = FilterQuery::new(query);
        let filter = &self.filter;
        let mut shown = 0;
        for entry in &mut self.entries {
            entry.visible = filter.matches(&entry.text);
            if entry.visible {
                shown += 1;
            }
        }
        shown
    }

    /// Re-derives control visibility and leaves edit mode. Runs after every
    /// mutation. An empty list also drops the filter along with its box.
    pub fn refresh_visibility(&mut self) {
        self.chrome = if self.entries.is_empty() {
            self.filter = FilterQuery::default();
            Chrome::empty()
        } else {
            Chrome::all()
        };
        self.submit_mode = SubmitMode::Add;
        self.edit_target = None;
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.text.clone()).collect()
    }

    pub fn visible_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.visible)
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_editing(&self) -> bool {
        self.edit_target.is_some()
    }

    pub fn edit_target(&self) -> Option<usize> {
        self.edit_target
    }

    pub fn submit_mode(&self) -> SubmitMode {
        self.submit_mode
    }

    pub fn chrome(&self) -> Chrome {
        self.chrome
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputField {
        &mut self.input
    }

    pub fn filter(&self) -> &FilterQuery {
        &self.filter
    }

    pub fn pending_delete(&self) -> Option<&DeleteTicket> {
        self.pending_delete.as_ref()
    }

    pub fn repository(&self) -> &ItemRepository<S> {
        &self.repo
    }

    fn append_entry(&mut self, text: String) {
        self.entries.push(Entry {
            text,
            visible: true,
        });
    }

    fn locate(&self, ticket: &DeleteTicket) -> Option<usize> {
        match self.entries.get(ticket.index) {
            Some(entry) if entry.text == ticket.text => Some(ticket.index),
            _ => self
                .entries
                .iter()
                .position(|entry| entry.text == ticket.text),
        }
    }

    // The store is written before the display changes, so a failed write
    // leaves both as they were. A corrupt entry is replaced by the list the
    // display is about to show.

    fn persist_append(&mut self, text: &str) -> Result<(), StoreError> {
        match self.repo.append(text) {
            Err(StoreError::CorruptEntry { .. }) => {
                let mut next = self.texts();
                next.push(text.to_string());
                self.overwrite_store(&next)
            }
            other => other,
        }
    }

    fn persist_replace(&mut self, index: usize, from: &str, to: &str) -> Result<(), StoreError> {
        match self.repo.replace(from, to) {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(%from, "edited item was not in the store");
                Ok(())
            }
            Err(StoreError::CorruptEntry { .. }) => {
                let mut next = self.texts_without(index);
                next.push(to.to_string());
                self.overwrite_store(&next)
            }
            Err(err) => Err(err),
        }
    }

    fn persist_remove(&mut self, index: usize, text: &str) -> Result<(), StoreError> {
        match self.repo.remove(text) {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(%text, "removed item was not in the store");
                Ok(())
            }
            Err(StoreError::CorruptEntry { .. }) => {
                let next = self.texts_without(index);
                self.overwrite_store(&next)
            }
            Err(err) => Err(err),
        }
    }

    fn texts_without(&self, index: usize) -> Vec<String> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, entry)| entry.text.clone())
            .collect()
    }

    fn overwrite_store(&mut self, texts: &[String]) -> Result<(), StoreError> {
        tracing::warn!(key = self.repo.key(), "rewriting unreadable stored list");
        self.repo.save(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use assert_matches::assert_matches;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Memory store whose writes can be switched to fail.
    #[derive(Default)]
    struct FailingStore {
        inner: MemoryStore,
        fail_writes: Rc<Cell<bool>>,
    }

    impl FailingStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.fail_writes.get() {
                return Err(StoreError::Sqlite(rusqlite::Error::InvalidQuery));
            }
            Ok(())
        }
    }

    impl KeyValueStore for FailingStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get_item(key)
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            self.check()?;
            self.inner.set_item(key, value)
        }

        fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
            self.check()?;
            self.inner.remove_item(key)
        }
    }

    fn failing_list(items: &[&str]) -> (ShoppingList<FailingStore>, Rc<Cell<bool>>) {
        let store = FailingStore::default();
        let switch = Rc::clone(&store.fail_writes);
        let mut list =
            ShoppingList::bootstrap(ItemRepository::new(store, "items"), ListOptions::default())
                .expect("bootstrap");
        for item in items {
            list.submit(item).expect("submit");
        }
        (list, switch)
    }

    fn empty_list() -> ShoppingList<MemoryStore> {
        list_from(MemoryStore::default())
    }

    fn list_from(store: MemoryStore) -> ShoppingList<MemoryStore> {
        ShoppingList::bootstrap(ItemRepository::new(store, "items"), ListOptions::default())
            .expect("bootstrap")
    }

    fn stored(list: &ShoppingList<MemoryStore>) -> Vec<String> {
        list.repository().load().expect("load")
    }

    fn delete(list: &mut ShoppingList<MemoryStore>, index: usize) -> DeleteOutcome {
        let ticket = list.request_delete(index).expect("ticket");
        list.resolve_delete(&ticket, true).expect("resolve")
    }

    #[test]
    fn submit_appends_trimmed_text_everywhere() {
        let mut list = empty_list();
        list.input_mut().set("  milk ");
        let outcome = list.submit_input().expect("submit");
        assert_matches!(outcome, SubmitOutcome::Added { ref text, duplicate: false } if text == "milk");
        assert_eq!(list.texts(), vec!["milk"]);
        assert_eq!(stored(&list), vec!["milk"]);
        assert!(list.input().is_empty());
        assert_eq!(list.chrome(), Chrome::all());
    }

    #[test]
    fn blank_submissions_change_nothing() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        for raw in ["", "   ", "\t\n"] {
            assert_eq!(list.submit(raw).expect("submit"), SubmitOutcome::Rejected);
        }
        assert_eq!(list.texts(), vec!["milk"]);
        assert_eq!(stored(&list), vec!["milk"]);
    }

    #[test]
    fn edit_then_submit_replaces_target() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        list.submit("eggs").expect("submit");

        assert_eq!(list.select_for_edit(0), Some("milk"));
        assert_eq!(list.input().value(), "milk");
        assert_eq!(list.submit_mode(), SubmitMode::Update);
        assert_eq!(list.submit_mode().to_string(), "Update Item");

        let outcome = list.submit("bread").expect("submit");
        assert_eq!(
            outcome,
            SubmitOutcome::Updated {
                from: "milk".into(),
                to: "bread".into()
            }
        );
        assert_eq!(list.texts(), vec!["eggs", "bread"]);
        assert_eq!(stored(&list), vec!["eggs", "bread"]);
        assert!(!list.is_editing());
        assert_eq!(list.submit_mode(), SubmitMode::Add);
    }

    #[test]
    fn selecting_new_target_supersedes_previous() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        list.submit("eggs").expect("submit");
        list.select_for_edit(0);
        list.select_for_edit(1);
        assert_eq!(list.edit_target(), Some(1));
        assert_eq!(list.input().value(), "eggs");
        list.submit("ham").expect("submit");
        assert_eq!(list.texts(), vec!["milk", "ham"]);
    }

    #[test]
    fn select_out_of_range_is_ignored() {
        let mut list = empty_list();
        assert_eq!(list.select_for_edit(3), None);
        assert!(!list.is_editing());
    }

    #[test]
    fn blank_submit_keeps_edit_mode() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        list.select_for_edit(0);
        assert_eq!(list.submit("  ").expect("submit"), SubmitOutcome::Rejected);
        assert!(list.is_editing());
        assert_eq!(list.texts(), vec!["milk"]);
    }

    #[test]
    fn confirmed_delete_removes_from_display_and_store() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        list.submit("eggs").expect("submit");
        assert_eq!(
            delete(&mut list, 0),
            DeleteOutcome::Removed {
                text: "milk".into()
            }
        );
        assert_eq!(list.texts(), vec!["eggs"]);
        assert_eq!(stored(&list), vec!["eggs"]);
    }

    #[test]
    fn declined_delete_keeps_display_and_store_in_step() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        let ticket = list.request_delete(0).expect("ticket");
        assert_eq!(ticket.text(), "milk");
        let outcome = list.resolve_delete(&ticket, false).expect("resolve");
        assert_matches!(outcome, DeleteOutcome::Kept { .. });
        assert_eq!(list.texts(), vec!["milk"]);
        assert_eq!(stored(&list), vec!["milk"]);
        assert!(list.pending_delete().is_none());
    }

    #[test]
    fn delete_exits_edit_mode() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        list.submit("eggs").expect("submit");
        list.select_for_edit(0);
        delete(&mut list, 1);
        assert!(!list.is_editing());
        assert_eq!(list.submit_mode(), SubmitMode::Add);
    }

    #[test]
    fn superseded_ticket_is_stale() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        list.submit("eggs").expect("submit");
        let first = list.request_delete(0).expect("ticket");
        let second = list.request_delete(1).expect("ticket");
        assert_eq!(
            list.resolve_delete(&first, true).expect("resolve"),
            DeleteOutcome::Stale
        );
        assert_matches!(
            list.resolve_delete(&second, true).expect("resolve"),
            DeleteOutcome::Removed { .. }
        );
        assert_eq!(list.texts(), vec!["milk"]);
    }

    #[test]
    fn pending_delete_follows_entry_after_reorder() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        list.submit("eggs").expect("submit");
        let ticket = list.request_delete(1).expect("ticket");
        list.select_for_edit(0);
        list.submit("bread").expect("submit");
        assert_eq!(list.texts(), vec!["eggs", "bread"]);
        assert_eq!(
            list.resolve_delete(&ticket, true).expect("resolve"),
            DeleteOutcome::Removed {
                text: "eggs".into()
            }
        );
        assert_eq!(list.texts(), vec!["bread"]);
    }

    #[test]
    fn clear_all_empties_everything() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        let ticket = list.request_delete(0).expect("ticket");
        list.clear_all().expect("clear");
        assert!(list.is_empty());
        assert!(!list.repository().store().contains_key("items"));
        assert_eq!(list.chrome(), Chrome::empty());
        assert_eq!(
            list.resolve_delete(&ticket, true).expect("resolve"),
            DeleteOutcome::Stale
        );
    }

    #[test]
    fn filter_hides_non_matching_without_touching_store() {
        let mut list = empty_list();
        for item in ["Milk", "eggs", "oat milk"] {
            list.submit(item).expect("submit");
        }
        let before = list.repository().raw().expect("raw");
        assert_eq!(list.filter_changed("MILK"), 2);
        let visible: Vec<_> = list
            .entries()
            .iter()
            .map(|entry| entry.is_visible())
            .collect();
        assert_eq!(visible, vec![true, false, true]);
        assert_eq!(list.visible_indices(), vec![0, 2]);
        assert_eq!(list.repository().raw().expect("raw"), before);
        assert_eq!(list.filter_changed(""), 3);
    }

    #[test]
    fn duplicate_adds_are_flagged_but_kept() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        let outcome = list.submit("milk").expect("submit");
        assert_matches!(outcome, SubmitOutcome::Added { duplicate: true, .. });
        assert_eq!(stored(&list), vec!["milk", "milk"]);
    }

    #[test]
    fn deleting_second_duplicate_drops_first_stored_copy() {
        let mut list = empty_list();
        for item in ["milk", "eggs", "milk"] {
            list.submit(item).expect("submit");
        }
        delete(&mut list, 2);
        assert_eq!(list.texts(), vec!["milk", "eggs"]);
        assert_eq!(stored(&list), vec!["eggs", "milk"]);
    }

    #[test]
    fn bootstrap_replays_stored_order() {
        let list = list_from(MemoryStore::with_entry("items", r#"["a","b"]"#));
        assert_eq!(list.texts(), vec!["a", "b"]);
        assert_eq!(list.chrome(), Chrome::all());
        assert!(!list.is_editing());
    }

    #[test]
    fn corrupt_store_starts_empty_and_is_rewritten_on_next_add() {
        let mut list = list_from(MemoryStore::with_entry("items", "not json"));
        assert!(list.is_empty());
        assert_eq!(list.chrome(), Chrome::empty());
        list.submit("milk").expect("submit");
        assert_eq!(stored(&list), vec!["milk"]);
    }

    #[test]
    fn confirmed_delete_of_last_item_hides_controls() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        assert_eq!(list.chrome(), Chrome::all());
        delete(&mut list, 0);
        assert!(list.is_empty());
        assert_eq!(list.chrome(), Chrome::empty());
        assert_eq!(stored(&list), Vec::<String>::new());
    }

    #[test]
    fn failed_update_write_keeps_display_and_edit_state() {
        let (mut list, fail_writes) = failing_list(&["milk"]);
        list.select_for_edit(0);
        fail_writes.set(true);

        assert_matches!(list.submit("bread"), Err(StoreError::Sqlite(_)));
        assert_eq!(list.texts(), vec!["milk"]);
        assert!(list.is_editing());
        assert_eq!(list.edit_target(), Some(0));
        assert_eq!(list.input().value(), "milk");
        assert_eq!(list.repository().load().expect("load"), vec!["milk"]);
    }

    #[test]
    fn failed_add_write_leaves_input_for_retry() {
        let (mut list, fail_writes) = failing_list(&[]);
        list.input_mut().set("eggs");
        fail_writes.set(true);
        assert!(list.submit_input().is_err());
        assert!(list.is_empty());
        assert_eq!(list.input().value(), "eggs");

        fail_writes.set(false);
        list.submit_input().expect("retry");
        assert_eq!(list.texts(), vec!["eggs"]);
        assert_eq!(list.repository().load().expect("load"), vec!["eggs"]);
    }

    #[test]
    fn failed_delete_and_clear_writes_keep_entries() {
        let (mut list, fail_writes) = failing_list(&["milk", "eggs"]);
        fail_writes.set(true);

        let ticket = list.request_delete(0).expect("ticket");
        assert!(list.resolve_delete(&ticket, true).is_err());
        assert!(list.clear_all().is_err());

        assert_eq!(list.texts(), vec!["milk", "eggs"]);
        assert_eq!(list.chrome(), Chrome::all());
        assert_eq!(
            list.repository().load().expect("load"),
            vec!["milk", "eggs"]
        );
    }

    #[test]
    fn emptying_the_list_drops_the_filter() {
        let mut list = empty_list();
        list.submit("milk").expect("submit");
        list.submit("eggs").expect("submit");
        assert_eq!(list.filter_changed("mi"), 1);
        list.clear_all().expect("clear");
        assert!(list.filter().is_empty());

        list.submit("bread").expect("submit");
        assert_eq!(list.visible_indices(), vec![0]);
    }
}
