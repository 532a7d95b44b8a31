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

//! Block formatting: uniform tag toggling over a range, list/paragraph
//! restructuring, and section attribute mutation.

use crate::cursor::{Position, Range};
use crate::list::ItemId;
use crate::post::{
    ListItem, ListSection, ListTag, MarkupSection, Section, SectionId, SectionTag,
};

use super::PostEditor;

/// Target of a block-level toggle: a markup section tag or a list tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTag {
    Markup(SectionTag),
    List(ListTag),
}

impl From<SectionTag> for BlockTag {
    fn from(tag: SectionTag) -> Self {
        BlockTag::Markup(tag)
    }
}

impl From<ListTag> for BlockTag {
    fn from(tag: ListTag) -> Self {
        BlockTag::List(tag)
    }
}

impl PostEditor {
    /// Toggle block formatting over every markerable leaf section touched
    /// by `range`.
    ///
    /// Application is uniform: if *every* touched section already matches
    /// `tag`, all of them revert to the default paragraph tag; otherwise
    /// all of them convert to `tag`. Converting to a list tag wraps each
    /// section in a list (contiguous same-tag lists merge on completion);
    /// converting a list item out of its list splits the list around it.
    pub fn toggle_section(&mut self, tag: impl Into<BlockTag>, range: Range) {
        self.assert_open();
        let tag = tag.into();
        let leaves: Vec<SectionId> = self
            .post
            .walk_leaf_sections(&range)
            .into_iter()
            .filter(|leaf| self.post.markerable(*leaf).is_some())
            .collect();
        if leaves.is_empty() {
            return;
        }
        let all_match = leaves
            .iter()
            .all(|leaf| self.leaf_matches_tag(*leaf, tag));
        let target = if all_match {
            BlockTag::Markup(SectionTag::DEFAULT)
        } else {
            tag
        };

        // Conversions keep the leaf count stable, so leaves are tracked
        // by index across the structural changes.
        let indices: Vec<usize> = leaves
            .iter()
            .filter_map(|leaf| self.post.leaf_index(*leaf))
            .collect();
        let head_anchor = range
            .head
            .parts()
            .and_then(|(s, o)| self.post.leaf_index(s).map(|i| (i, o)));
        let tail_anchor = range
            .tail
            .parts()
            .and_then(|(s, o)| self.post.leaf_index(s).map(|i| (i, o)));
        for index in indices {
            let Some(leaf) = self.post.leaf_at_index(index) else {
                continue;
            };
            self.convert_leaf(leaf, target);
        }
        if let (Some((head_index, head_offset)), Some((tail_index, tail_offset))) =
            (head_anchor, tail_anchor)
        {
            if let (Some(head), Some(tail)) = (
                self.post.leaf_at_index(head_index),
                self.post.leaf_at_index(tail_index),
            ) {
                self.schedule_range(Range::new(
                    Position::at(head, head_offset.min(self.post.leaf_len(head))),
                    Position::at(tail, tail_offset.min(self.post.leaf_len(tail))),
                ));
            }
        }
        self.did_mutate = true;
    }

    /// Set a whitelisted attribute on every attribute-bearing section in
    /// `range`. List items resolve to their containing list.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not a valid section attribute.
    pub fn set_attribute(&mut self, key: &str, value: &str, range: Range) {
        self.assert_open();
        self.each_attribute_host(range, |section| match section {
            Section::Markup(section) => section.attributes.set(key, value),
            Section::List(section) => section.attributes.set(key, value),
            _ => {}
        });
    }

    /// Remove an attribute from every attribute-bearing section in
    /// `range`.
    pub fn remove_attribute(&mut self, key: &str, range: Range) {
        self.assert_open();
        self.each_attribute_host(range, |section| match section {
            Section::Markup(section) => section.attributes.remove(key),
            Section::List(section) => section.attributes.remove(key),
            _ => {}
        });
    }

    fn each_attribute_host(
        &mut self,
        range: Range,
        mut apply: impl FnMut(&mut Section),
    ) {
        let mut hosts: Vec<ItemId> = Vec::new();
        for leaf in self.post.walk_leaf_sections(&range) {
            let host = match leaf {
                SectionId::Top(id) => id,
                SectionId::Item { list, .. } => list,
            };
            if !hosts.contains(&host) {
                hosts.push(host);
            }
        }
        for host in hosts {
            if let Some(section) = self.post.sections_mut().get_mut(host) {
                apply(section);
            }
        }
        self.did_mutate = true;
    }

    fn leaf_matches_tag(&self, leaf: SectionId, tag: BlockTag) -> bool {
        match (leaf, tag) {
            (SectionId::Top(id), BlockTag::Markup(tag)) => self
                .post
                .sections()
                .get(id)
                .and_then(Section::as_markup)
                .is_some_and(|section| section.tag == tag),
            (SectionId::Item { list, .. }, BlockTag::List(tag)) => self
                .post
                .sections()
                .get(list)
                .and_then(Section::as_list)
                .is_some_and(|section| section.tag == tag),
            _ => false,
        }
    }

    fn convert_leaf(&mut self, leaf: SectionId, target: BlockTag) -> SectionId {
        match (leaf, target) {
            (SectionId::Top(id), BlockTag::Markup(tag)) => {
                if let Some(section) =
                    self.post.sections_mut().get_mut(id).and_then(Section::as_markup_mut)
                {
                    section.tag = tag;
                    self.mark_dirty(leaf);
                }
                leaf
            }
            (SectionId::Top(id), BlockTag::List(tag)) => {
                self.change_section_to_list_item(id, tag)
            }
            (SectionId::Item { list, item }, BlockTag::Markup(tag)) => {
                self.change_section_from_list_item(list, item, tag)
            }
            (SectionId::Item { list, .. }, BlockTag::List(tag)) => {
                if let Some(section) =
                    self.post.sections_mut().get_mut(list).and_then(Section::as_list_mut)
                {
                    section.tag = tag;
                }
                leaf
            }
        }
    }

    /// Rewrap a markup section as the sole item of a new list. Adjacent
    /// same-tag lists merge during completion.
    fn change_section_to_list_item(&mut self, id: ItemId, tag: ListTag) -> SectionId {
        let anchor = self.post.sections().next(id);
        let Section::Markup(section) = self.post.sections_mut().remove(id) else {
            panic!("section is not markerable");
        };
        let list = ListSection::new(tag, vec![ListItem::new(section.content)]);
        let list_id = self
            .post
            .sections_mut()
            .insert_before(anchor, Section::List(list));
        let item_id = self
            .post
            .sections()
            .get(list_id)
            .and_then(Section::as_list)
            .expect("just inserted a list")
            .items
            .head()
            .expect("list was created with one item");
        let leaf = SectionId::Item { list: list_id, item: item_id };
        self.mark_dirty(leaf);
        leaf
    }

    /// Pull a list item out into a markup section, splitting its list
    /// into up-to-three fragments; blank fragments are scheduled for
    /// removal.
    fn change_section_from_list_item(
        &mut self,
        list: ItemId,
        item: ItemId,
        tag: SectionTag,
    ) -> SectionId {
        let (_, mid, _) = self.split_list_at_item(list, item);
        let anchor = self.post.sections().next(mid);
        let Section::List(mut fragment) = self.post.sections_mut().remove(mid) else {
            unreachable!("the middle fragment is a list");
        };
        let content = fragment
            .items
            .drain_all()
            .pop()
            .map(|item| item.content)
            .unwrap_or_default();
        let section = MarkupSection::new(tag, content);
        let new_id = self
            .post
            .sections_mut()
            .insert_before(anchor, Section::Markup(section));
        let leaf = SectionId::Top(new_id);
        self.mark_dirty(leaf);
        leaf
    }

    /// Fragment a list into (prev, mid, next) lists where `mid` holds
    /// exactly `item`. Blank fragments are scheduled for removal.
    pub(crate) fn split_list_at_item(
        &mut self,
        list: ItemId,
        item: ItemId,
    ) -> (ItemId, ItemId, ItemId) {
        let anchor = self.post.sections().next(list);
        let Section::List(mut original) = self.post.sections_mut().remove(list)
        else {
            panic!("section is not a list");
        };
        let tag = original.tag;
        let attributes = original.attributes.clone();
        let mut prev_items = Vec::new();
        let mut mid_items = Vec::new();
        let mut next_items = Vec::new();
        let mut seen = false;
        for id in original.items.ids() {
            let value = original.items.remove(id);
            if id == item {
                seen = true;
                mid_items.push(value);
            } else if seen {
                next_items.push(value);
            } else {
                prev_items.push(value);
            }
        }
        assert!(seen, "item is not in this list");

        let mut fragments = Vec::with_capacity(3);
        for items in [prev_items, mid_items, next_items] {
            let mut fragment = ListSection::new(tag, items);
            fragment.attributes = attributes.clone();
            let id = self
                .post
                .sections_mut()
                .insert_before(anchor, Section::List(fragment));
            fragments.push(id);
        }
        let (prev, mid, next) = (fragments[0], fragments[1], fragments[2]);
        for id in [prev, next] {
            if self
                .post
                .sections()
                .get(id)
                .is_some_and(Section::is_blank)
            {
                self.schedule_for_removal(SectionId::Top(id));
            }
        }
        self.did_mutate = true;
        (prev, mid, next)
    }

    /// Split a list in two before `item`: the first fragment keeps the
    /// items before it, the second starts with it. Used when whole
    /// sections are inserted at a position inside a list.
    pub(crate) fn split_list_before_item(
        &mut self,
        list: ItemId,
        item: ItemId,
    ) -> (ItemId, ItemId) {
        let anchor = self.post.sections().next(list);
        let Section::List(mut original) = self.post.sections_mut().remove(list)
        else {
            panic!("section is not a list");
        };
        let tag = original.tag;
        let attributes = original.attributes.clone();
        let mut prev_items = Vec::new();
        let mut next_items = Vec::new();
        let mut seen = false;
        for id in original.items.ids() {
            let value = original.items.remove(id);
            if id == item {
                seen = true;
            }
            if seen {
                next_items.push(value);
            } else {
                prev_items.push(value);
            }
        }
        assert!(seen, "item is not in this list");

        let mut prev = ListSection::new(tag, prev_items);
        prev.attributes = attributes.clone();
        let mut next = ListSection::new(tag, next_items);
        next.attributes = attributes;
        let prev_id = self
            .post
            .sections_mut()
            .insert_before(anchor, Section::List(prev));
        let next_id = self
            .post
            .sections_mut()
            .insert_before(anchor, Section::List(next));
        if self
            .post
            .sections()
            .get(prev_id)
            .is_some_and(Section::is_blank)
        {
            self.schedule_for_removal(SectionId::Top(prev_id));
        }
        self.did_mutate = true;
        (prev_id, next_id)
    }
}
