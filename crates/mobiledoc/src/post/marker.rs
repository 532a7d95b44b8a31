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

//! Inline content: text runs and atoms, each carrying a list of open
//! markups.
//!
//! Offsets throughout the crate count extended grapheme clusters, so a
//! combining sequence or an emoji moves as one unit. An atom always
//! counts as exactly 1, regardless of its display text or payload.

use serde_json::Value;
use unicode_segmentation::UnicodeSegmentation;

use super::markup::MarkupId;

/// Grapheme count of `text`.
pub(crate) fn grapheme_len(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Byte index of the grapheme boundary at `offset`.
///
/// # Panics
///
/// Panics if `offset` is past the end of `text`.
pub(crate) fn grapheme_byte_index(text: &str, offset: usize) -> usize {
    if offset == 0 {
        return 0;
    }
    text.grapheme_indices(true)
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or_else(|| {
            assert!(
                grapheme_len(text) == offset,
                "offset {offset} is out of bounds for {text:?}"
            );
            text.len()
        })
}

/// An opaque, atomic inline unit with a name, display text and payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Atom {
    pub name: String,
    pub value: String,
    pub payload: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MarkerContent {
    Text(String),
    Atom(Atom),
}

/// A run of inline content plus the markups open across it.
///
/// The markup list is ordered outermost-first, matching nesting order in
/// any rendered output.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub content: MarkerContent,
    pub markups: Vec<MarkupId>,
}

impl Marker {
    pub fn text(text: impl Into<String>, markups: Vec<MarkupId>) -> Self {
        Self {
            content: MarkerContent::Text(text.into()),
            markups,
        }
    }

    pub fn blank() -> Self {
        Self::text("", Vec::new())
    }

    pub fn atom(
        name: impl Into<String>,
        value: impl Into<String>,
        payload: Value,
        markups: Vec<MarkupId>,
    ) -> Self {
        Self {
            content: MarkerContent::Atom(Atom {
                name: name.into(),
                value: value.into(),
                payload,
            }),
            markups,
        }
    }

    pub fn is_atom(&self) -> bool {
        matches!(self.content, MarkerContent::Atom(_))
    }

    /// The text this marker contributes to its section. For an atom this
    /// is the display text, even though its length is always 1.
    pub fn display_text(&self) -> &str {
        match &self.content {
            MarkerContent::Text(text) => text,
            MarkerContent::Atom(atom) => &atom.value,
        }
    }

    pub fn len(&self) -> usize {
        match &self.content {
            MarkerContent::Text(text) => grapheme_len(text),
            MarkerContent::Atom(_) => 1,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.len() == 0
    }

    pub fn has_markup(&self, markup: MarkupId) -> bool {
        self.markups.contains(&markup)
    }

    /// Add `markup` at `index` in the open-markup list, clamped to the
    /// end. A markup already present is not added twice.
    pub fn add_markup_at(&mut self, markup: MarkupId, index: usize) {
        if self.has_markup(markup) {
            return;
        }
        let index = index.min(self.markups.len());
        self.markups.insert(index, markup);
    }

    pub fn remove_markup(&mut self, markup: MarkupId) {
        self.markups.retain(|m| *m != markup);
    }

    /// Two markers can join only if both are text runs with identical
    /// markup sets.
    pub fn can_join(&self, other: &Marker) -> bool {
        match (&self.content, &other.content) {
            (MarkerContent::Text(_), MarkerContent::Text(_)) => {
                self.markups == other.markups
            }
            _ => false,
        }
    }

    /// Split into (before, after) at `offset`.
    ///
    /// An atom splits only at its two boundary offsets; the empty side is
    /// a blank text marker carrying the same markups.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is past the end of the marker, or at an interior
    /// offset of an atom.
    pub fn split_at(&self, offset: usize) -> (Marker, Marker) {
        match &self.content {
            MarkerContent::Text(text) => {
                let index = grapheme_byte_index(text, offset);
                (
                    Marker::text(&text[..index], self.markups.clone()),
                    Marker::text(&text[index..], self.markups.clone()),
                )
            }
            MarkerContent::Atom(_) => match offset {
                0 => (
                    Marker::text("", self.markups.clone()),
                    self.clone(),
                ),
                1 => (
                    self.clone(),
                    Marker::text("", self.markups.clone()),
                ),
                _ => panic!("an atom only splits at offset 0 or 1"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::post::markup::{Markup, MarkupTable, MarkupTag};

    fn bold() -> (MarkupTable, MarkupId) {
        let mut table = MarkupTable::new();
        let b = table.intern(Markup::new(MarkupTag::B));
        (table, b)
    }

    #[test]
    fn text_marker_length_counts_graphemes() {
        assert_eq!(Marker::text("abc", vec![]).len(), 3);
        assert_eq!(Marker::text("e\u{301}", vec![]).len(), 1);
        assert_eq!(Marker::text("", vec![]).len(), 0);
    }

    #[test]
    fn atom_length_is_always_one() {
        let marker = Marker::atom("mention", "@alice", json!({"id": 42}), vec![]);
        assert_eq!(marker.len(), 1);
        assert_eq!(marker.display_text(), "@alice");
    }

    #[test]
    fn split_text_marker_keeps_markups_on_both_sides() {
        let (_, b) = bold();
        let marker = Marker::text("abcd", vec![b]);
        let (before, after) = marker.split_at(2);
        assert_eq!(before.display_text(), "ab");
        assert_eq!(after.display_text(), "cd");
        assert!(before.has_markup(b));
        assert!(after.has_markup(b));
    }

    #[test]
    fn split_at_boundaries_yields_a_blank_side() {
        let marker = Marker::text("ab", vec![]);
        let (before, after) = marker.split_at(0);
        assert!(before.is_blank());
        assert_eq!(after.display_text(), "ab");
        let (before, after) = marker.split_at(2);
        assert_eq!(before.display_text(), "ab");
        assert!(after.is_blank());
    }

    #[test]
    fn atom_splits_only_at_its_boundaries() {
        let marker = Marker::atom("mention", "@alice", json!(null), vec![]);
        let (before, after) = marker.split_at(0);
        assert!(before.is_blank());
        assert!(after.is_atom());
        let (before, after) = marker.split_at(1);
        assert!(before.is_atom());
        assert!(after.is_blank());
    }

    #[test]
    #[should_panic(expected = "only splits at offset 0 or 1")]
    fn atom_interior_split_fails_fast() {
        let marker = Marker::atom("mention", "@alice", json!(null), vec![]);
        let _ = marker.split_at(5);
    }

    #[test]
    fn can_join_requires_identical_markups_on_text_runs() {
        let (_, b) = bold();
        assert!(Marker::text("a", vec![b]).can_join(&Marker::text("b", vec![b])));
        assert!(!Marker::text("a", vec![b]).can_join(&Marker::text("b", vec![])));
        let atom = Marker::atom("mention", "@a", json!(null), vec![]);
        assert!(!atom.can_join(&atom.clone()));
        assert!(!Marker::text("a", vec![]).can_join(&atom));
    }

    #[test]
    fn add_markup_at_clamps_and_dedupes() {
        let (mut table, b) = bold();
        let em = table.intern(Markup::new(MarkupTag::Em));
        let mut marker = Marker::text("a", vec![b]);
        marker.add_markup_at(em, 10);
        assert_eq!(marker.markups, vec![b, em]);
        marker.add_markup_at(em, 0);
        assert_eq!(marker.markups, vec![b, em]);
        marker.remove_markup(b);
        assert_eq!(marker.markups, vec![em]);
    }
}
