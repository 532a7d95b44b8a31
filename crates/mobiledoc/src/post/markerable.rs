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

//! The markerable capability: an ordered run of [`Marker`]s plus the
//! offset arithmetic shared by paragraph-like sections and list items.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::marker::{Marker, MarkerContent};
use crate::list::{ItemId, LinkedList};

/// Unicode word-character class, as used by word-wise cursor movement.
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w").unwrap());

/// What occupies a single offset unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitClass {
    Word,
    NonWord,
    Atom,
}

/// Edit record returned by [`Markerable::split_marker_at_offset`].
#[derive(Debug, Default)]
pub struct MarkerSplit {
    /// Handles of markers created by the split, in order.
    pub added: Vec<ItemId>,
    /// Markers removed by the split, by value.
    pub removed: Vec<Marker>,
}

/// Inline content of a paragraph-like section or list item.
#[derive(Debug, Clone, Default)]
pub struct Markerable {
    markers: LinkedList<Marker>,
}

impl Markerable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_markers(markers: Vec<Marker>) -> Self {
        Self {
            markers: LinkedList::from_items(markers),
        }
    }

    pub fn markers(&self) -> &LinkedList<Marker> {
        &self.markers
    }

    pub fn markers_mut(&mut self) -> &mut LinkedList<Marker> {
        &mut self.markers
    }

    /// Total length in offset units (graphemes; atoms count 1).
    pub fn text_len(&self) -> usize {
        self.markers.iter().map(|(_, m)| m.len()).sum()
    }

    pub fn text(&self) -> String {
        self.markers
            .iter()
            .map(|(_, m)| m.display_text())
            .collect()
    }

    pub fn is_blank(&self) -> bool {
        self.text_len() == 0
    }

    /// Offset of the start of `marker` within this content.
    ///
    /// # Panics
    ///
    /// Panics if `marker` is not in this marker list.
    pub fn offset_of(&self, marker: ItemId) -> usize {
        let mut offset = 0;
        for (id, m) in self.markers.iter() {
            if id == marker {
                return offset;
            }
            offset += m.len();
        }
        panic!("marker is not in this section");
    }

    /// The marker owning the unit that ends at `offset` (the left-hand
    /// marker at an exact boundary). `None` at offset 0.
    pub fn marker_before(&self, offset: usize) -> Option<ItemId> {
        if offset == 0 {
            return None;
        }
        let mut cum = 0;
        for (id, m) in self.markers.iter() {
            let len = m.len();
            if offset > cum && offset <= cum + len {
                return Some(id);
            }
            cum += len;
        }
        None
    }

    /// The marker owning the unit that starts at `offset` (the right-hand
    /// marker at an exact boundary). `None` at the tail.
    pub fn marker_after(&self, offset: usize) -> Option<ItemId> {
        let mut cum = 0;
        for (id, m) in self.markers.iter() {
            let len = m.len();
            if offset >= cum && offset < cum + len {
                return Some(id);
            }
            cum += len;
        }
        None
    }

    /// Classify the unit occupying `[offset, offset + 1)`.
    pub fn classify_unit(&self, offset: usize) -> Option<UnitClass> {
        let mut cum = 0;
        for (_, m) in self.markers.iter() {
            let len = m.len();
            if offset >= cum && offset < cum + len {
                return Some(match &m.content {
                    MarkerContent::Atom(_) => UnitClass::Atom,
                    MarkerContent::Text(text) => {
                        let grapheme = text
                            .graphemes(true)
                            .nth(offset - cum)
                            .expect("offset is inside this marker");
                        if WORD.is_match(grapheme) {
                            UnitClass::Word
                        } else {
                            UnitClass::NonWord
                        }
                    }
                });
            }
            cum += len;
        }
        None
    }

    /// Ensure a marker boundary exists exactly at `offset`, splitting the
    /// covering marker when the offset is interior to it. An empty marker
    /// list gains a single blank marker.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the end of the content.
    pub fn split_marker_at_offset(&mut self, offset: usize) -> MarkerSplit {
        assert!(
            offset <= self.text_len(),
            "split offset {offset} is out of bounds"
        );
        if self.markers.is_empty() {
            let id = self.markers.append(Marker::blank());
            return MarkerSplit {
                added: vec![id],
                removed: Vec::new(),
            };
        }
        let mut cum = 0;
        for id in self.markers.ids() {
            let len = self.markers.get(id).expect("marker id is live").len();
            if offset > cum && offset < cum + len {
                let anchor = self.markers.next(id);
                let original = self.markers.remove(id);
                let (before, after) = original.split_at(offset - cum);
                let before_id = self.markers.insert_before(anchor, before);
                let after_id = self.markers.insert_before(anchor, after);
                return MarkerSplit {
                    added: vec![before_id, after_id],
                    removed: vec![original],
                };
            }
            cum += len;
        }
        // The offset already falls on a marker boundary.
        MarkerSplit::default()
    }

    /// Clone the content into two halves split at `offset`. The
    /// concatenated text of the halves equals the original text.
    pub fn split_markers_at(&self, offset: usize) -> (Vec<Marker>, Vec<Marker>) {
        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut cum = 0;
        for (_, m) in self.markers.iter() {
            let len = m.len();
            if cum + len <= offset {
                before.push(m.clone());
            } else if cum >= offset {
                after.push(m.clone());
            } else {
                let (b, a) = m.split_at(offset - cum);
                before.push(b);
                after.push(a);
            }
            cum += len;
        }
        (before, after)
    }

    /// Append another markerable's markers onto this one.
    pub fn join(&mut self, mut other: Markerable) {
        for marker in other.markers.drain_all() {
            self.markers.append(marker);
        }
    }

    /// Remove the content covered by `[head, tail)`, splitting boundary
    /// markers first. Returns the removed markers.
    pub fn cut(&mut self, head: usize, tail: usize) -> Vec<Marker> {
        if head >= tail {
            return Vec::new();
        }
        self.split_marker_at_offset(head);
        self.split_marker_at_offset(tail);
        let mut cum = 0;
        let mut doomed = Vec::new();
        for (id, m) in self.markers.iter() {
            let len = m.len();
            if len > 0 && cum >= head && cum + len <= tail {
                doomed.push(id);
            }
            cum += len;
        }
        doomed
            .into_iter()
            .map(|id| self.markers.remove(id))
            .collect()
    }

    /// Insert `markers` at `offset`, splitting the boundary first.
    /// Returns the offset just past the inserted content.
    pub fn insert_markers_at(&mut self, offset: usize, markers: Vec<Marker>) -> usize {
        let total: usize = markers.iter().map(|m| m.len()).sum();
        self.split_marker_at_offset(offset);
        let mut cum = 0;
        let mut anchor = None;
        for (id, m) in self.markers.iter() {
            if cum >= offset {
                anchor = Some(id);
                break;
            }
            cum += m.len();
        }
        for marker in markers {
            self.markers.insert_before(anchor, marker);
        }
        offset + total
    }

    /// Handles of the non-blank markers lying entirely within
    /// `[head, tail)`.
    pub fn marker_ids_between(&self, head: usize, tail: usize) -> Vec<ItemId> {
        let mut cum = 0;
        let mut ids = Vec::new();
        for (id, m) in self.markers.iter() {
            let len = m.len();
            if len > 0 && cum >= head && cum + len <= tail {
                ids.push(id);
            }
            cum += len;
        }
        ids
    }

    /// Drop blank markers and join adjacent joinable text runs.
    pub fn coalesce(&mut self) {
        for id in self.markers.ids() {
            if self.markers.get(id).is_some_and(|m| m.is_blank()) {
                self.markers.remove(id);
            }
        }
        let mut cursor = self.markers.head();
        while let Some(id) = cursor {
            let Some(next_id) = self.markers.next(id) else {
                break;
            };
            let joinable = {
                let current = self.markers.get(id).expect("cursor is live");
                let next = self.markers.get(next_id).expect("next is live");
                current.can_join(next)
            };
            if joinable {
                let next = self.markers.remove(next_id);
                if let MarkerContent::Text(text) =
                    &mut self.markers.get_mut(id).expect("cursor is live").content
                {
                    text.push_str(next.display_text());
                }
            } else {
                cursor = Some(next_id);
            }
        }
    }
}
