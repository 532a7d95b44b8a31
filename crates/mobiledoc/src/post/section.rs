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

//! Block-level content: the [`Section`] tagged union and its variants.
//!
//! Paragraph-like sections and list items share the [`Markerable`]
//! capability; cards and images are atomic units of length 1 that the
//! cursor can only sit before or after.

use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use super::attributes::Attributes;
use super::markerable::Markerable;
use crate::list::LinkedList;

/// The closed set of markup section tags. `P` is the default a section
/// reverts to when block formatting is toggled off.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum SectionTag {
    Aside,
    Blockquote,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    P,
}

impl SectionTag {
    pub const DEFAULT: SectionTag = SectionTag::P;
}

/// The closed set of list section tags.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ListTag {
    Ol,
    Ul,
}

/// A paragraph-like block: heading, paragraph, quote or aside.
#[derive(Debug, Clone)]
pub struct MarkupSection {
    pub tag: SectionTag,
    pub content: Markerable,
    pub attributes: Attributes,
}

impl MarkupSection {
    pub fn new(tag: SectionTag, content: Markerable) -> Self {
        Self {
            tag,
            content,
            attributes: Attributes::new(),
        }
    }

    pub fn blank() -> Self {
        Self::new(SectionTag::DEFAULT, Markerable::new())
    }
}

/// One item of a list section. Markerable, and addressed as a leaf
/// section by the cursor.
#[derive(Debug, Clone, Default)]
pub struct ListItem {
    pub content: Markerable,
}

impl ListItem {
    pub fn new(content: Markerable) -> Self {
        Self { content }
    }
}

/// An ordered or unordered list holding [`ListItem`]s. Not itself a leaf
/// section; the cursor addresses its items.
#[derive(Debug, Clone)]
pub struct ListSection {
    pub tag: ListTag,
    pub items: LinkedList<ListItem>,
    pub attributes: Attributes,
}

impl ListSection {
    pub fn new(tag: ListTag, items: Vec<ListItem>) -> Self {
        Self {
            tag,
            items: LinkedList::from_items(items),
            attributes: Attributes::new(),
        }
    }

    /// Adopt another list's items (same or different tag), or wrap a
    /// markerable in a new trailing item.
    pub fn join_list(&mut self, mut other: ListSection) {
        for item in other.items.drain_all() {
            self.items.append(item);
        }
    }

    pub fn join_markerable(&mut self, content: Markerable) {
        self.items.append(ListItem::new(content));
    }
}

/// An opaque embed identified by name, carrying a JSON payload. Fixed
/// length 1; it cannot be split except at its two boundary offsets.
#[derive(Debug, Clone, PartialEq)]
pub struct CardSection {
    pub name: String,
    pub payload: Value,
}

impl CardSection {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// An image block addressed by source URL. Atomic, like a card.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSection {
    pub src: String,
}

impl ImageSection {
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into() }
    }
}

/// A top-level block of the document.
#[derive(Debug, Clone)]
pub enum Section {
    Markup(MarkupSection),
    List(ListSection),
    Card(CardSection),
    Image(ImageSection),
}

impl Section {
    pub fn blank_markup() -> Section {
        Section::Markup(MarkupSection::blank())
    }

    pub fn is_markerable(&self) -> bool {
        matches!(self, Section::Markup(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Section::List(_))
    }

    pub fn is_card(&self) -> bool {
        matches!(self, Section::Card(_))
    }

    pub fn as_markup(&self) -> Option<&MarkupSection> {
        match self {
            Section::Markup(section) => Some(section),
            _ => None,
        }
    }

    pub fn as_markup_mut(&mut self) -> Option<&mut MarkupSection> {
        match self {
            Section::Markup(section) => Some(section),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListSection> {
        match self {
            Section::List(section) => Some(section),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut ListSection> {
        match self {
            Section::List(section) => Some(section),
            _ => None,
        }
    }

    /// Whether the section holds no content. Cards and images are never
    /// blank; a list is blank when it has no items.
    pub fn is_blank(&self) -> bool {
        match self {
            Section::Markup(section) => section.content.is_blank(),
            Section::List(section) => section.items.is_empty(),
            Section::Card(_) | Section::Image(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::marker::Marker;

    #[test]
    fn default_tag_is_paragraph() {
        assert_eq!(SectionTag::DEFAULT, SectionTag::P);
        assert_eq!(SectionTag::DEFAULT.to_string(), "p");
    }

    #[test]
    fn list_tags_parse_from_their_names() {
        use std::str::FromStr;
        assert_eq!(ListTag::from_str("ol"), Ok(ListTag::Ol));
        assert_eq!(ListTag::from_str("ul"), Ok(ListTag::Ul));
        assert!(ListTag::from_str("dl").is_err());
    }

    #[test]
    fn join_list_adopts_items_in_order() {
        let mut list = ListSection::new(
            ListTag::Ul,
            vec![ListItem::new(Markerable::from_markers(vec![Marker::text(
                "one",
                vec![],
            )]))],
        );
        let other = ListSection::new(
            ListTag::Ol,
            vec![ListItem::new(Markerable::from_markers(vec![Marker::text(
                "two",
                vec![],
            )]))],
        );
        list.join_list(other);
        let texts: Vec<String> = list
            .items
            .iter()
            .map(|(_, item)| item.content.text())
            .collect();
        assert_eq!(texts, ["one", "two"]);
    }

    #[test]
    fn join_markerable_wraps_in_a_new_item() {
        let mut list = ListSection::new(ListTag::Ul, vec![]);
        list.join_markerable(Markerable::from_markers(vec![Marker::text(
            "tail", vec![],
        )]));
        assert_eq!(list.items.len(), 1);
    }

    #[test]
    fn blankness_by_variant() {
        assert!(Section::blank_markup().is_blank());
        assert!(Section::List(ListSection::new(ListTag::Ul, vec![])).is_blank());
        assert!(!Section::Card(CardSection::new("hr", Value::Null)).is_blank());
        assert!(!Section::Image(ImageSection::new("img.png")).is_blank());
    }
}
