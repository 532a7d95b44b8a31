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

//! Inline formatting over ranges: applying, removing and toggling
//! markups.
//!
//! Markers are split at both range boundaries first, so a markup never
//! spreads into unaffected text. A newly added markup is inserted at the
//! index shared by every affected marker's markup set, which keeps
//! surrounding markups from being needlessly closed and reopened.

use crate::cursor::Range;
use crate::list::ItemId;
use crate::post::{Markup, MarkupId, SectionId};

use super::PostEditor;

impl PostEditor {
    /// Apply `markup` to every marker in `range`.
    pub fn add_markup_to_range(&mut self, range: Range, markup: MarkupId) {
        self.assert_open();
        if range.is_collapsed() {
            return;
        }
        let groups = self.split_range_markers(range);
        self.add_markup_to_groups(&groups, markup);
        self.did_mutate = true;
    }

    /// Remove `markup` from every marker in `range`.
    pub fn remove_markup_from_range(&mut self, range: Range, markup: MarkupId) {
        self.assert_open();
        if range.is_collapsed() {
            return;
        }
        let groups = self.split_range_markers(range);
        self.remove_markup_from_groups(&groups, markup);
        self.did_mutate = true;
    }

    /// Remove every markup matching `predicate` from the markers in
    /// `range`.
    pub fn remove_markup_from_range_where(
        &mut self,
        range: Range,
        predicate: impl Fn(&Markup) -> bool,
    ) {
        self.assert_open();
        if range.is_collapsed() {
            return;
        }
        let matching: Vec<MarkupId> = self
            .post
            .markups()
            .iter()
            .filter(|(_, markup)| predicate(markup))
            .map(|(id, _)| id)
            .collect();
        let groups = self.split_range_markers(range);
        for markup in matching {
            self.remove_markup_from_groups(&groups, markup);
        }
        self.did_mutate = true;
    }

    /// Apply `markup` to the whole range, unless every marker already
    /// carries it — then remove it from the whole range instead.
    pub fn toggle_markup(&mut self, markup: MarkupId, range: Range) {
        self.assert_open();
        if range.is_collapsed() {
            return;
        }
        let groups = self.split_range_markers(range);
        let mut any = false;
        let mut has_all = true;
        for (section, markers) in &groups {
            let content = self
                .post
                .markerable(*section)
                .expect("grouped sections are markerable");
            for marker in markers {
                any = true;
                if !content
                    .markers()
                    .get(*marker)
                    .is_some_and(|m| m.has_markup(markup))
                {
                    has_all = false;
                }
            }
        }
        if any && has_all {
            self.remove_markup_from_groups(&groups, markup);
        } else {
            self.add_markup_to_groups(&groups, markup);
        }
        self.did_mutate = true;
    }

    /// Split markers at the range boundaries and collect, per markerable
    /// section, the markers lying inside the range.
    fn split_range_markers(
        &mut self,
        range: Range,
    ) -> Vec<(SectionId, Vec<ItemId>)> {
        let mut groups = Vec::new();
        for leaf in self.post.walk_leaf_sections(&range) {
            if self.post.markerable(leaf).is_none() {
                continue;
            }
            let slice = range.trim_to(&self.post, leaf);
            let head = slice.head.offset();
            let tail = slice.tail.offset();
            let content = self.chain_mut(leaf);
            content.split_marker_at_offset(head);
            content.split_marker_at_offset(tail);
            let markers = content.marker_ids_between(head, tail);
            self.mark_dirty(leaf);
            groups.push((leaf, markers));
        }
        groups
    }

    fn add_markup_to_groups(
        &mut self,
        groups: &[(SectionId, Vec<ItemId>)],
        markup: MarkupId,
    ) {
        // The insertion index is the size of the markup set common to
        // every affected marker.
        let mut common: Option<Vec<MarkupId>> = None;
        for (section, markers) in groups {
            let content = self
                .post
                .markerable(*section)
                .expect("grouped sections are markerable");
            for marker in markers {
                let markups = &content
                    .markers()
                    .get(*marker)
                    .expect("grouped markers are live")
                    .markups;
                match &mut common {
                    None => common = Some(markups.clone()),
                    Some(common) => common.retain(|m| markups.contains(m)),
                }
            }
        }
        let index = common.map_or(0, |common| common.len());
        for (section, markers) in groups {
            let content = self.chain_mut(*section);
            for marker in markers {
                content
                    .markers_mut()
                    .get_mut(*marker)
                    .expect("grouped markers are live")
                    .add_markup_at(markup, index);
            }
        }
    }

    fn remove_markup_from_groups(
        &mut self,
        groups: &[(SectionId, Vec<ItemId>)],
        markup: MarkupId,
    ) {
        for (section, markers) in groups {
            let content = self.chain_mut(*section);
            for marker in markers {
                content
                    .markers_mut()
                    .get_mut(*marker)
                    .expect("grouped markers are live")
                    .remove_markup(markup);
            }
        }
    }
}
