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

//! Section splitting: paragraph splits, list item splits, and the card
//! boundary cases.

use crate::cursor::Position;
use crate::list::ItemId;
use crate::post::{
    ListItem, Markerable, MarkupSection, Section, SectionId,
};

use super::PostEditor;

impl PostEditor {
    /// Split the section holding `position` into a (before, after) pair.
    ///
    /// Cards and images only split at their two boundary offsets, gaining
    /// a blank paragraph on the appropriate side. A list item splits into
    /// two items — except the last, blank item of a list, which becomes a
    /// blank paragraph after the list instead of an empty trailing item.
    ///
    /// # Panics
    ///
    /// Panics if the position is blank.
    pub fn split_section(&mut self, position: Position) -> (SectionId, SectionId) {
        self.assert_open();
        let (section, offset) = position
            .parts()
            .expect("cannot split at a blank position");
        self.did_mutate = true;
        match section {
            SectionId::Top(id) => {
                if self.post.leaf_is_atomic(section) {
                    return self.split_atomic_section(id, offset);
                }
                self.split_markup_section(id, offset)
            }
            SectionId::Item { list, item } => {
                self.split_list_item(list, item, offset)
            }
        }
    }

    fn split_atomic_section(
        &mut self,
        id: ItemId,
        offset: usize,
    ) -> (SectionId, SectionId) {
        let sections = self.post.sections_mut();
        if offset == 0 {
            let new_id = sections.insert_before(Some(id), Section::blank_markup());
            (SectionId::Top(new_id), SectionId::Top(id))
        } else {
            let new_id = sections.insert_after(id, Section::blank_markup());
            (SectionId::Top(id), SectionId::Top(new_id))
        }
    }

    fn split_markup_section(
        &mut self,
        id: ItemId,
        offset: usize,
    ) -> (SectionId, SectionId) {
        let (tag, attributes, before_markers, after_markers) = {
            let Some(Section::Markup(section)) = self.post.sections().get(id)
            else {
                panic!("cannot split a list container");
            };
            let (before, after) = section.content.split_markers_at(offset);
            (section.tag, section.attributes.clone(), before, after)
        };
        let sections = self.post.sections_mut();
        let mut before =
            MarkupSection::new(tag, Markerable::from_markers(before_markers));
        before.attributes = attributes.clone();
        let mut after =
            MarkupSection::new(tag, Markerable::from_markers(after_markers));
        after.attributes = attributes;
        let before_id = sections.insert_before(Some(id), Section::Markup(before));
        let after_id = sections.insert_before(Some(id), Section::Markup(after));
        sections.remove(id);
        self.mark_dirty(SectionId::Top(before_id));
        self.mark_dirty(SectionId::Top(after_id));
        (SectionId::Top(before_id), SectionId::Top(after_id))
    }

    fn split_list_item(
        &mut self,
        list: ItemId,
        item: ItemId,
        offset: usize,
    ) -> (SectionId, SectionId) {
        let leaf = SectionId::Item { list, item };
        let is_last = self
            .post
            .sections()
            .get(list)
            .and_then(Section::as_list)
            .is_some_and(|section| section.items.tail() == Some(item));
        if is_last && self.post.leaf_is_blank(leaf) {
            // Exit the list instead of producing an empty trailing item.
            let emptied = {
                let section = self
                    .post
                    .sections_mut()
                    .get_mut(list)
                    .and_then(Section::as_list_mut)
                    .expect("list item parent is a list");
                section.items.remove(item);
                section.items.is_empty()
            };
            if emptied {
                self.schedule_for_removal(SectionId::Top(list));
            }
            let new_id = self
                .post
                .sections_mut()
                .insert_after(list, Section::blank_markup());
            return (SectionId::Top(list), SectionId::Top(new_id));
        }

        let (before_markers, after_markers) = self
            .post
            .markerable(leaf)
            .expect("list items are markerable")
            .split_markers_at(offset);
        let section = self
            .post
            .sections_mut()
            .get_mut(list)
            .and_then(Section::as_list_mut)
            .expect("list item parent is a list");
        let before_id = section.items.insert_before(
            Some(item),
            ListItem::new(Markerable::from_markers(before_markers)),
        );
        let after_id = section.items.insert_before(
            Some(item),
            ListItem::new(Markerable::from_markers(after_markers)),
        );
        section.items.remove(item);
        let before = SectionId::Item { list, item: before_id };
        let after = SectionId::Item { list, item: after_id };
        self.mark_dirty(before);
        self.mark_dirty(after);
        (before, after)
    }
}
