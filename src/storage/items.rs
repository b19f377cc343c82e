use super::{KeyValueStore, StoreError};

/// The item collection as one JSON array of strings under a single key.
///
/// An absent entry is an empty list. Writes always replace the whole entry.
#[derive(Debug, Clone)]
pub struct ItemRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> ItemRepository<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Raw stored text, exactly as written.
    pub fn raw(&self) -> Result<Option<String>, StoreError> {
        self.store.get_item(&self.key)
    }

    pub fn load(&self) -> Result<Vec<String>, StoreError> {
        let Some(raw) = self.raw()? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::CorruptEntry {
            key: self.key.clone(),
            source,
        })
    }

    pub fn save(&mut self, items: &[String]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(items).map_err(|source| StoreError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.store.set_item(&self.key, &encoded)
    }

    pub fn append(&mut self, text: &str) -> Result<(), StoreError> {
        let mut items = self.load()?;
        items.push(text.to_string());
        self.save(&items)
    }

    /// Drops the first item equal to `text`. Returns false when none matched,
    /// in which case nothing is written.
    pub fn remove(&mut self, text: &str) -> Result<bool, StoreError> {
        let mut items = self.load()?;
        let Some(position) = items.iter().position(|item| item == text) else {
            return Ok(false);
        };
        items.remove(position);
        self.save(&items)?;
        Ok(true)
    }

    /// Swaps the first item equal to `from` for `to` appended at the end, in
    /// one write. Returns false when `from` was not stored; `to` is still
    /// appended.
    pub fn replace(&mut self, from: &str, to: &str) -> Result<bool, StoreError> {
        let mut items = self.load()?;
        let found = match items.iter().position(|item| item == from) {
            Some(position) => {
                items.remove(position);
                true
            }
            None => false,
        };
        items.push(to.to_string());
        self.save(&items)?;
        Ok(found)
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove_item(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use assert_matches::assert_matches;

    fn repo() -> ItemRepository<MemoryStore> {
        ItemRepository::new(MemoryStore::default(), "items")
    }

    #[test]
    fn absent_entry_loads_empty() -> anyhow::Result<()> {
        assert!(repo().load()?.is_empty());
        Ok(())
    }

    #[test]
    fn appends_are_stored_in_order_as_json_array() -> anyhow::Result<()> {
        let mut repo = repo();
        repo.append("milk")?;
        repo.append("eggs")?;
        assert_eq!(repo.load()?, vec!["milk", "eggs"]);
        insta::assert_snapshot!(repo.raw()?.unwrap_or_default(), @r#"["milk","eggs"]"#);
        Ok(())
    }

    #[test]
    fn remove_drops_only_first_matching_text() -> anyhow::Result<()> {
        let mut repo = repo();
        repo.save(&["milk".into(), "eggs".into(), "milk".into()])?;
        assert!(repo.remove("milk")?);
        assert_eq!(repo.load()?, vec!["eggs", "milk"]);
        Ok(())
    }

    #[test]
    fn removing_unknown_text_does_not_create_entry() -> anyhow::Result<()> {
        let mut repo = repo();
        assert!(!repo.remove("bread")?);
        assert!(!repo.store().contains_key("items"));
        Ok(())
    }

    #[test]
    fn clear_deletes_entry_outright() -> anyhow::Result<()> {
        let mut repo = repo();
        repo.append("milk")?;
        repo.clear()?;
        assert_eq!(repo.raw()?, None);
        assert!(repo.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn corrupt_entry_names_the_key() {
        let repo = ItemRepository::new(MemoryStore::with_entry("items", "{not json"), "items");
        assert_matches!(repo.load(), Err(StoreError::CorruptEntry { key, .. }) if key == "items");
    }

    #[test]
    fn non_string_array_is_corrupt() {
        let repo = ItemRepository::new(MemoryStore::with_entry("items", "[1,2]"), "items");
        assert_matches!(repo.load(), Err(StoreError::CorruptEntry { .. }));
    }
}
