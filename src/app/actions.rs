use anyhow::{Context, Result};

use crate::list::{DeleteOutcome, DeleteTicket, ShoppingList, SubmitOutcome};
use crate::storage::KeyValueStore;

/// One user intent, free of any terminal event types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit the given raw text; `None` submits the input field.
    Submit(Option<String>),
    SelectForEdit(usize),
    Delete(usize),
    ResolveDelete {
        ticket: DeleteTicket,
        confirmed: bool,
    },
    ClearAll,
    FilterChanged(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Submitted(SubmitOutcome),
    Editing { text: String },
    DeleteRequested(DeleteTicket),
    Deleted(DeleteOutcome),
    Cleared,
    Filtered { shown: usize },
    /// The command referred to an entry that does not exist.
    Ignored,
}

pub struct ActionDispatcher<'a, S> {
    list: &'a mut ShoppingList<S>,
}

impl<'a, S: KeyValueStore> ActionDispatcher<'a, S> {
    pub fn new(list: &'a mut ShoppingList<S>) -> Self {
        Self { list }
    }

    pub fn dispatch(&mut self, command: Command) -> Result<CommandOutcome> {
        tracing::trace!(?command, "dispatching");
        match command {
            Command::Submit(raw) => {
                let outcome = match raw {
                    Some(raw) => self.list.submit(&raw),
                    None => self.list.submit_input(),
                }
                .context("saving submitted item")?;
                Ok(CommandOutcome::Submitted(outcome))
            }
            Command::SelectForEdit(index) => Ok(self
                .list
                .select_for_edit(index)
                .map(|text| CommandOutcome::Editing {
                    text: text.to_string(),
                })
                .unwrap_or(CommandOutcome::Ignored)),
            Command::Delete(index) => Ok(self
                .list
                .request_delete(index)
                .map(CommandOutcome::DeleteRequested)
                .unwrap_or(CommandOutcome::Ignored)),
            Command::ResolveDelete { ticket, confirmed } => {
                let outcome = self
                    .list
                    .resolve_delete(&ticket, confirmed)
                    .with_context(|| format!("removing '{}'", ticket.text()))?;
                Ok(CommandOutcome::Deleted(outcome))
            }
            Command::ClearAll => {
                self.list.clear_all().context("clearing stored list")?;
                Ok(CommandOutcome::Cleared)
            }
            Command::FilterChanged(query) => Ok(CommandOutcome::Filtered {
                shown: self.list.filter_changed(&query),
            }),
        }
    }

    /// Deletes the first entry with `text` without asking.
    pub fn remove_text(&mut self, text: &str) -> Result<Option<DeleteOutcome>> {
        let Some(index) = self
            .list
            .entries()
            .iter()
            .position(|entry| entry.text() == text)
        else {
            return Ok(None);
        };
        let CommandOutcome::DeleteRequested(ticket) = self.dispatch(Command::Delete(index))? else {
            return Ok(None);
        };
        match self.dispatch(Command::ResolveDelete {
            ticket,
            confirmed: true,
        })? {
            CommandOutcome::Deleted(outcome) => Ok(Some(outcome)),
            _ => Ok(None),
        }
    }
}

/// Status-line wording for a finished command.
pub fn describe(outcome: &CommandOutcome) -> Option<String> {
    let message = match outcome {
        CommandOutcome::Submitted(SubmitOutcome::Rejected) => "Please add an item".to_string(),
        CommandOutcome::Submitted(SubmitOutcome::Added {
            text,
            duplicate: true,
        }) => format!("Added '{text}' (already on the list)"),
        CommandOutcome::Submitted(SubmitOutcome::Added { text, .. }) => format!("Added '{text}'"),
        CommandOutcome::Submitted(SubmitOutcome::Updated { from, to }) => {
            format!("Updated '{from}' to '{to}'")
        }
        CommandOutcome::Editing { text } => {
            format!("Editing '{text}': Enter to update • Esc to cancel")
        }
        CommandOutcome::DeleteRequested(ticket) => {
            format!("Remove '{}'? y to confirm • n/Esc to keep", ticket.text())
        }
        CommandOutcome::Deleted(DeleteOutcome::Removed { text }) => format!("Removed '{text}'"),
        CommandOutcome::Deleted(DeleteOutcome::Kept { text }) => format!("Kept '{text}'"),
        CommandOutcome::Deleted(DeleteOutcome::Stale) => "Item no longer on the list".to_string(),
        CommandOutcome::Cleared => "List cleared".to_string(),
        CommandOutcome::Filtered { .. } | CommandOutcome::Ignored => return None,
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListOptions;
    use crate::storage::{ItemRepository, MemoryStore};
    use assert_matches::assert_matches;

    fn list() -> ShoppingList<MemoryStore> {
        ShoppingList::bootstrap(
            ItemRepository::new(MemoryStore::default(), "items"),
            ListOptions::default(),
        )
        .expect("bootstrap")
    }

    #[test]
    fn commands_drive_full_lifecycle() -> anyhow::Result<()> {
        let mut list = list();
        let mut dispatcher = ActionDispatcher::new(&mut list);
        dispatcher.dispatch(Command::Submit(Some("milk".into())))?;
        dispatcher.dispatch(Command::Submit(Some("eggs".into())))?;
        let outcome = dispatcher.dispatch(Command::SelectForEdit(0))?;
        assert_eq!(
            outcome,
            CommandOutcome::Editing {
                text: "milk".into()
            }
        );
        dispatcher.dispatch(Command::Submit(Some("bread".into())))?;
        assert_matches!(
            dispatcher.dispatch(Command::FilterChanged("BR".into()))?,
            CommandOutcome::Filtered { shown: 1 }
        );
        dispatcher.dispatch(Command::ClearAll)?;
        assert!(list.is_empty());
        Ok(())
    }

    #[test]
    fn delete_of_missing_index_is_ignored() -> anyhow::Result<()> {
        let mut list = list();
        let mut dispatcher = ActionDispatcher::new(&mut list);
        assert_eq!(
            dispatcher.dispatch(Command::Delete(0))?,
            CommandOutcome::Ignored
        );
        Ok(())
    }

    #[test]
    fn remove_text_targets_first_match() -> anyhow::Result<()> {
        let mut list = list();
        let mut dispatcher = ActionDispatcher::new(&mut list);
        dispatcher.dispatch(Command::Submit(Some("eggs".into())))?;
        dispatcher.dispatch(Command::Submit(Some("milk".into())))?;
        assert_matches!(
            dispatcher.remove_text("milk")?,
            Some(DeleteOutcome::Removed { .. })
        );
        assert_eq!(dispatcher.remove_text("ham")?, None);
        assert_eq!(list.texts(), vec!["eggs"]);
        Ok(())
    }

    #[test]
    fn rejected_submit_has_prompt_message() {
        let message = describe(&CommandOutcome::Submitted(SubmitOutcome::Rejected));
        assert_eq!(message.as_deref(), Some("Please add an item"));
        assert_eq!(describe(&CommandOutcome::Ignored), None);
    }
}
