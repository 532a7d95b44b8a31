// Copyright 2026 The Matrix.org Foundation C.I.C.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Inline annotations (bold, links, ...) and their per-post intern table.
//!
//! Markups are interned by (tag, sorted attributes) so that structurally
//! identical markups share one [`MarkupId`]. Range-based markup toggling
//! relies on this: "already applied" is an id comparison.

use std::collections::HashMap;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// The closed set of inline markup tags.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum MarkupTag {
    A,
    B,
    Code,
    Em,
    I,
    S,
    Strong,
    Sub,
    Sup,
    U,
}

/// Attribute keys a markup may carry.
pub const VALID_MARKUP_ATTRIBUTES: &[&str] = &["href", "rel"];

/// An immutable inline annotation: a tag plus whitelisted attributes.
///
/// Attributes are stored sorted by key so that equality (and interning)
/// is structural.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Markup {
    tag: MarkupTag,
    attributes: Vec<(String, String)>,
}

impl Markup {
    pub fn new(tag: MarkupTag) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
        }
    }

    /// Build a markup with attributes. Non-whitelisted keys are dropped.
    pub fn with_attributes(
        tag: MarkupTag,
        attributes: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        let mut attributes: Vec<(String, String)> = attributes
            .into_iter()
            .filter(|(key, _)| VALID_MARKUP_ATTRIBUTES.contains(&key.as_str()))
            .collect();
        attributes.sort();
        attributes.dedup_by(|a, b| a.0 == b.0);
        Self { tag, attributes }
    }

    pub fn tag(&self) -> MarkupTag {
        self.tag
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Handle to an interned [`Markup`] in a post's [`MarkupTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkupId(u32);

/// The per-post markup intern table.
#[derive(Debug, Clone, Default)]
pub struct MarkupTable {
    markups: Vec<Markup>,
    index: HashMap<Markup, MarkupId>,
}

impl MarkupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `markup`, returning the id of the structurally identical
    /// entry if one exists already.
    pub fn intern(&mut self, markup: Markup) -> MarkupId {
        if let Some(id) = self.index.get(&markup) {
            return *id;
        }
        let id = MarkupId(self.markups.len() as u32);
        self.markups.push(markup.clone());
        self.index.insert(markup, id);
        id
    }

    /// # Panics
    ///
    /// Panics if `id` was issued by a different table.
    pub fn get(&self, id: MarkupId) -> &Markup {
        &self.markups[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.markups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MarkupId, &Markup)> {
        self.markups
            .iter()
            .enumerate()
            .map(|(index, markup)| (MarkupId(index as u32), markup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_structural() {
        let mut table = MarkupTable::new();
        let b1 = table.intern(Markup::new(MarkupTag::B));
        let b2 = table.intern(Markup::new(MarkupTag::B));
        assert_eq!(b1, b2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn interning_sorts_attributes() {
        let mut table = MarkupTable::new();
        let a1 = table.intern(Markup::with_attributes(
            MarkupTag::A,
            vec![
                ("rel".to_string(), "noopener".to_string()),
                ("href".to_string(), "https://example.com".to_string()),
            ],
        ));
        let a2 = table.intern(Markup::with_attributes(
            MarkupTag::A,
            vec![
                ("href".to_string(), "https://example.com".to_string()),
                ("rel".to_string(), "noopener".to_string()),
            ],
        ));
        assert_eq!(a1, a2);
        assert_eq!(
            table.get(a1).attribute("href"),
            Some("https://example.com")
        );
    }

    #[test]
    fn distinct_attributes_intern_separately() {
        let mut table = MarkupTable::new();
        let a1 = table.intern(Markup::with_attributes(
            MarkupTag::A,
            vec![("href".to_string(), "https://a.example".to_string())],
        ));
        let a2 = table.intern(Markup::with_attributes(
            MarkupTag::A,
            vec![("href".to_string(), "https://b.example".to_string())],
        ));
        assert_ne!(a1, a2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn non_whitelisted_attributes_are_dropped() {
        let markup = Markup::with_attributes(
            MarkupTag::A,
            vec![
                ("href".to_string(), "https://example.com".to_string()),
                ("onclick".to_string(), "alert(1)".to_string()),
            ],
        );
        assert_eq!(markup.attributes().len(), 1);
        assert!(markup.attribute("onclick").is_none());
    }

    #[test]
    fn tags_parse_from_their_lowercase_names() {
        use std::str::FromStr;
        assert_eq!(MarkupTag::from_str("strong"), Ok(MarkupTag::Strong));
        assert_eq!(MarkupTag::from_str("a"), Ok(MarkupTag::A));
        assert!(MarkupTag::from_str("blink").is_err());
    }
}
