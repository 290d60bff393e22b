//! Ordered text lists
//!
//! Used for argv, module search paths, warning options and `-X` options.
//! Items are only ever appended, or replaced wholesale when one tier's list
//! is merged over another. Insertion order is significant and duplicates
//! are kept. An absent list is
//! modelled as `Option<StringList>`, so an empty list stays distinct from an
//! unset one.

use serde::{Deserialize, Serialize};

use crate::{Error, Signal};

/// An ordered sequence of owned strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringList {
    items: Vec<String>,
}

impl StringList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list by copying every item of `items`
    pub fn from_strs<S: AsRef<str>>(items: &[S]) -> Signal<Self> {
        let mut list = Self::new();
        for item in items {
            list.append(item.as_ref())?;
        }
        Ok(list)
    }

    /// Add `item` at the end.
    ///
    /// Fails with an allocation error when the list or the copied text
    /// cannot grow.
    pub fn append(&mut self, item: &str) -> Signal<()> {
        let owned = copy_text(item, "string list append")?;
        self.push_owned(owned)
    }

    pub(crate) fn push_owned(&mut self, item: String) -> Signal<()> {
        self.items
            .try_reserve(1)
            .map_err(|_| Error::allocation("string list append"))?;
        self.items.push(item);
        Ok(())
    }

    /// Append every item of `other`, preserving its order
    pub fn extend(&mut self, other: &StringList) -> Signal<()> {
        self.items
            .try_reserve(other.len())
            .map_err(|_| Error::allocation("string list extend"))?;
        for item in other.iter() {
            self.append(item)?;
        }
        Ok(())
    }

    /// Replace every item with a copy of `other`.
    ///
    /// Used when merging one tier's list over another. The copy is made
    /// before the current items are released, so on failure the list is
    /// left as it was.
    pub fn replace_all(&mut self, other: &StringList) -> Signal<()> {
        let mut items = Vec::new();
        items
            .try_reserve_exact(other.len())
            .map_err(|_| Error::allocation("string list replace"))?;
        for item in other.iter() {
            items.push(copy_text(item, "string list replace")?);
        }
        self.items = items;
        Ok(())
    }

    /// Release every item
    pub fn clear(&mut self) {
        self.items = Vec::new();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn contains(&self, item: &str) -> bool {
        self.iter().any(|existing| existing == item)
    }
}

impl<'a> IntoIterator for &'a StringList {
    type Item = &'a str;
    type IntoIter = std::iter::Map<std::slice::Iter<'a, String>, fn(&'a String) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter().map(String::as_str)
    }
}

/// Copy `text` into freshly reserved storage
pub(crate) fn copy_text(text: &str, origin: &'static str) -> Signal<String> {
    let mut owned = String::new();
    owned
        .try_reserve_exact(text.len())
        .map_err(|_| Error::allocation(origin))?;
    owned.push_str(text);
    Ok(owned)
}
