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

//! The document tree: a [`Post`] owning an ordered list of sections plus
//! the per-post markup intern table.
//!
//! Leaf sections are the blocks the cursor can address directly: markup
//! sections, list items (but not their containing list), cards and
//! images. [`SectionId`] names a leaf or a top-level section; ids stay
//! valid until the section is removed.

mod attributes;
mod marker;
mod markerable;
mod markup;
mod section;

pub use attributes::{Attributes, TEXT_ALIGN, VALID_SECTION_ATTRIBUTES};
pub use marker::{Atom, Marker, MarkerContent};
pub use markerable::{Markerable, MarkerSplit, UnitClass};
pub use markup::{Markup, MarkupId, MarkupTable, MarkupTag, VALID_MARKUP_ATTRIBUTES};
pub use section::{
    CardSection, ImageSection, ListItem, ListSection, ListTag, MarkupSection,
    Section, SectionTag,
};

use crate::cursor::{Position, Range};
use crate::list::{ItemId, LinkedList};

/// Address of a section within a post: either a top-level section, or an
/// item nested in a top-level list section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionId {
    Top(ItemId),
    Item { list: ItemId, item: ItemId },
}

/// The root of the document tree.
#[derive(Debug, Clone, Default)]
pub struct Post {
    sections: LinkedList<Section>,
    markups: MarkupTable,
}

impl Post {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &LinkedList<Section> {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut LinkedList<Section> {
        &mut self.sections
    }

    pub fn markups(&self) -> &MarkupTable {
        &self.markups
    }

    /// Intern `markup` in this post's table.
    pub fn intern_markup(&mut self, markup: Markup) -> MarkupId {
        self.markups.intern(markup)
    }

    pub fn markup(&self, id: MarkupId) -> &Markup {
        self.markups.get(id)
    }

    pub fn is_blank(&self) -> bool {
        self.sections.is_empty()
    }

    // -----------------------------------------------------------------------
    // Leaf section navigation
    // -----------------------------------------------------------------------

    fn first_leaf_in_section(&self, id: ItemId) -> Option<SectionId> {
        match self.sections.get(id)? {
            Section::List(list) => {
                list.items.head().map(|item| SectionId::Item { list: id, item })
            }
            _ => Some(SectionId::Top(id)),
        }
    }

    fn last_leaf_in_section(&self, id: ItemId) -> Option<SectionId> {
        match self.sections.get(id)? {
            Section::List(list) => {
                list.items.tail().map(|item| SectionId::Item { list: id, item })
            }
            _ => Some(SectionId::Top(id)),
        }
    }

    fn first_leaf_from(&self, mut cursor: Option<ItemId>) -> Option<SectionId> {
        while let Some(id) = cursor {
            if let Some(leaf) = self.first_leaf_in_section(id) {
                return Some(leaf);
            }
            cursor = self.sections.next(id);
        }
        None
    }

    fn last_leaf_from(&self, mut cursor: Option<ItemId>) -> Option<SectionId> {
        while let Some(id) = cursor {
            if let Some(leaf) = self.last_leaf_in_section(id) {
                return Some(leaf);
            }
            cursor = self.sections.prev(id);
        }
        None
    }

    pub fn first_leaf(&self) -> Option<SectionId> {
        self.first_leaf_from(self.sections.head())
    }

    /// The last leaf inside one top-level section: the section itself,
    /// or the last item of a list. `None` for an empty list.
    pub fn last_leaf_in(&self, section: ItemId) -> Option<SectionId> {
        self.last_leaf_in_section(section)
    }

    pub fn last_leaf(&self) -> Option<SectionId> {
        self.last_leaf_from(self.sections.tail())
    }

    pub fn next_leaf(&self, leaf: SectionId) -> Option<SectionId> {
        match leaf {
            SectionId::Item { list, item } => {
                let section = self.sections.get(list)?.as_list()?;
                if let Some(next) = section.items.next(item) {
                    return Some(SectionId::Item { list, item: next });
                }
                self.first_leaf_from(self.sections.next(list))
            }
            SectionId::Top(id) => self.first_leaf_from(self.sections.next(id)),
        }
    }

    pub fn prev_leaf(&self, leaf: SectionId) -> Option<SectionId> {
        match leaf {
            SectionId::Item { list, item } => {
                let section = self.sections.get(list)?.as_list()?;
                if let Some(prev) = section.items.prev(item) {
                    return Some(SectionId::Item { list, item: prev });
                }
                self.last_leaf_from(self.sections.prev(list))
            }
            SectionId::Top(id) => self.last_leaf_from(self.sections.prev(id)),
        }
    }

    /// Every leaf section, in document order.
    pub fn leaf_sections(&self) -> Vec<SectionId> {
        let mut leaves = Vec::new();
        let mut cursor = self.first_leaf();
        while let Some(leaf) = cursor {
            leaves.push(leaf);
            cursor = self.next_leaf(leaf);
        }
        leaves
    }

    pub fn leaf_index(&self, leaf: SectionId) -> Option<usize> {
        self.leaf_sections().iter().position(|l| *l == leaf)
    }

    pub fn leaf_at_index(&self, index: usize) -> Option<SectionId> {
        self.leaf_sections().get(index).copied()
    }

    /// Whether `leaf` still resolves to a live section.
    pub fn contains_leaf(&self, leaf: SectionId) -> bool {
        match leaf {
            SectionId::Top(id) => self.sections.contains(id),
            SectionId::Item { list, item } => self
                .sections
                .get(list)
                .and_then(|s| s.as_list())
                .is_some_and(|l| l.items.contains(item)),
        }
    }

    // -----------------------------------------------------------------------
    // Leaf section access
    // -----------------------------------------------------------------------

    /// The markerable content of `leaf`, if it has any.
    pub fn markerable(&self, leaf: SectionId) -> Option<&Markerable> {
        match leaf {
            SectionId::Top(id) => match self.sections.get(id)? {
                Section::Markup(section) => Some(&section.content),
                _ => None,
            },
            SectionId::Item { list, item } => {
                let section = self.sections.get(list)?.as_list()?;
                Some(&section.items.get(item)?.content)
            }
        }
    }

    pub fn markerable_mut(&mut self, leaf: SectionId) -> Option<&mut Markerable> {
        match leaf {
            SectionId::Top(id) => match self.sections.get_mut(id)? {
                Section::Markup(section) => Some(&mut section.content),
                _ => None,
            },
            SectionId::Item { list, item } => {
                let section = self.sections.get_mut(list)?.as_list_mut()?;
                Some(&mut section.items.get_mut(item)?.content)
            }
        }
    }

    /// Whether `leaf` is an atomic unit (card or image).
    pub fn leaf_is_atomic(&self, leaf: SectionId) -> bool {
        match leaf {
            SectionId::Top(id) => matches!(
                self.sections.get(id),
                Some(Section::Card(_)) | Some(Section::Image(_))
            ),
            SectionId::Item { .. } => false,
        }
    }

    /// Length of `leaf` in offset units. Atomic sections have length 1.
    pub fn leaf_len(&self, leaf: SectionId) -> usize {
        if self.leaf_is_atomic(leaf) {
            return 1;
        }
        self.markerable(leaf).map_or(0, |m| m.text_len())
    }

    pub fn leaf_text(&self, leaf: SectionId) -> String {
        self.markerable(leaf).map_or_else(String::new, |m| m.text())
    }

    pub fn leaf_is_blank(&self, leaf: SectionId) -> bool {
        match leaf {
            SectionId::Top(id) => {
                self.sections.get(id).is_some_and(|s| s.is_blank())
            }
            SectionId::Item { .. } => {
                self.markerable(leaf).is_none_or(|m| m.is_blank())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Positions
    // -----------------------------------------------------------------------

    /// Position at the very start of the post, or the blank sentinel for a
    /// blank post.
    pub fn head_position(&self) -> Position {
        match self.first_leaf() {
            Some(leaf) => Position::at(leaf, 0),
            None => Position::blank(),
        }
    }

    /// Position at the very end of the post, or the blank sentinel for a
    /// blank post.
    pub fn tail_position(&self) -> Position {
        match self.last_leaf() {
            Some(leaf) => Position::at(leaf, self.leaf_len(leaf)),
            None => Position::blank(),
        }
    }

    /// The range covering the whole post.
    pub fn to_range(&self) -> Range {
        Range::new(self.head_position(), self.tail_position())
    }

    /// The leaf sections touched by `range`, head to tail inclusive.
    pub fn walk_leaf_sections(&self, range: &Range) -> Vec<SectionId> {
        let (Some((head, _)), Some((tail, _))) =
            (range.head.parts(), range.tail.parts())
        else {
            return Vec::new();
        };
        let mut leaves = Vec::new();
        let mut cursor = Some(head);
        while let Some(leaf) = cursor {
            leaves.push(leaf);
            if leaf == tail {
                break;
            }
            cursor = self.next_leaf(leaf);
        }
        leaves
    }

    /// Plain text of the post: leaf section texts joined by newlines.
    pub fn text(&self) -> String {
        self.leaf_sections()
            .iter()
            .map(|leaf| self.leaf_text(*leaf))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // -----------------------------------------------------------------------
    // Debug rendering
    // -----------------------------------------------------------------------

    /// A tree rendering of the post, for tests and debugging.
    pub fn to_tree(&self) -> String {
        let mut out = String::from("\n");
        let count = self.sections.len();
        for (index, (_, section)) in self.sections.iter().enumerate() {
            let last = index == count - 1;
            self.tree_section(&mut out, section, last);
        }
        out
    }

    fn tree_section(&self, out: &mut String, section: &Section, last: bool) {
        let branch = if last { "└>" } else { "├>" };
        let indent = if last { "  " } else { "│ " };
        match section {
            Section::Markup(section) => {
                out.push_str(&format!("{branch}{}\n", section.tag));
                self.tree_markers(out, &section.content, indent);
            }
            Section::List(section) => {
                out.push_str(&format!("{branch}{}\n", section.tag));
                let count = section.items.len();
                for (index, (_, item)) in section.items.iter().enumerate() {
                    let item_last = index == count - 1;
                    let item_branch = if item_last { "└>" } else { "├>" };
                    let item_indent = if item_last { "  " } else { "│ " };
                    out.push_str(&format!("{indent}{item_branch}li\n"));
                    self.tree_markers(
                        out,
                        &item.content,
                        &format!("{indent}{item_indent}"),
                    );
                }
            }
            Section::Card(card) => {
                out.push_str(&format!("{branch}card \"{}\"\n", card.name));
            }
            Section::Image(image) => {
                out.push_str(&format!("{branch}img \"{}\"\n", image.src));
            }
        }
    }

    fn tree_markers(&self, out: &mut String, content: &Markerable, indent: &str) {
        let count = content.markers().len();
        for (index, (_, marker)) in content.markers().iter().enumerate() {
            let branch = if index == count - 1 { "└>" } else { "├>" };
            let markups = if marker.markups.is_empty() {
                String::new()
            } else {
                let names: Vec<String> = marker
                    .markups
                    .iter()
                    .map(|id| self.markup(*id).tag().to_string())
                    .collect();
                format!(" ({})", names.join(","))
            };
            match &marker.content {
                MarkerContent::Text(text) => {
                    out.push_str(&format!("{indent}{branch}\"{text}\"{markups}\n"));
                }
                MarkerContent::Atom(atom) => {
                    out.push_str(&format!(
                        "{indent}{branch}atom \"{}\" \"{}\"{markups}\n",
                        atom.name, atom.value
                    ));
                }
            }
        }
    }
}
