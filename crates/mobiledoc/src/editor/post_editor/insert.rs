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

//! Insertion: markers, text, atoms, whole sections and whole posts.

use serde_json::Value;

use crate::cursor::{Direction, Position};
use crate::list::ItemId;
use crate::post::{
    ImageSection, ListItem, ListSection, Marker, Markerable, MarkupSection,
    Post, Section, SectionId,
};

use super::PostEditor;

impl PostEditor {
    /// Insert `markers` at a markerable position, splitting the boundary
    /// marker first. Adjacent same-markup markers coalesce during
    /// completion. Returns the position just past the inserted content.
    ///
    /// # Panics
    ///
    /// Panics if the position is blank or not markerable.
    pub fn insert_markers(
        &mut self,
        position: Position,
        markers: Vec<Marker>,
    ) -> Position {
        self.assert_open();
        let (section, offset) = position
            .parts()
            .expect("cannot insert markers at a blank position");
        let content = self.chain_mut(section);
        let end = content.insert_markers_at(offset, markers);
        self.mark_dirty(section);
        self.did_mutate = true;
        let result = Position::at(section, end);
        self.schedule_range(result.to_range());
        result
    }

    /// Insert plain text carrying the markups already open at `position`.
    pub fn insert_text(&mut self, position: Position, text: &str) -> Position {
        let markups = position
            .marker_in(&self.post, Direction::Backward)
            .and_then(|marker| {
                let (section, _) = position.parts()?;
                let content = self.post.markerable(section)?;
                Some(content.markers().get(marker)?.markups.clone())
            })
            .unwrap_or_default();
        self.insert_markers(position, vec![Marker::text(text, markups)])
    }

    /// Insert text with an explicit markup list.
    pub fn insert_text_with_markups(
        &mut self,
        position: Position,
        text: &str,
        markups: Vec<crate::post::MarkupId>,
    ) -> Position {
        self.insert_markers(position, vec![Marker::text(text, markups)])
    }

    /// Insert an atom at `position`.
    pub fn insert_atom(
        &mut self,
        position: Position,
        name: &str,
        value: &str,
        payload: Value,
    ) -> Position {
        self.insert_markers(position, vec![Marker::atom(name, value, payload, vec![])])
    }

    /// Insert a top-level section before `anchor`; a `None` anchor
    /// appends at the end of the post.
    pub fn insert_section_before(
        &mut self,
        anchor: Option<ItemId>,
        section: Section,
    ) -> ItemId {
        self.assert_open();
        self.did_mutate = true;
        self.post.sections_mut().insert_before(anchor, section)
    }

    pub fn insert_section_at_end(&mut self, section: Section) -> ItemId {
        self.insert_section_before(None, section)
    }

    /// Replace a top-level section in place.
    pub fn replace_section(&mut self, target: ItemId, section: Section) -> ItemId {
        self.assert_open();
        self.did_mutate = true;
        let sections = self.post.sections_mut();
        let new_id = sections.insert_before(Some(target), section);
        sections.remove(target);
        new_id
    }

    /// Insert another post's content at `position`, re-interning its
    /// markups into this post. A single-paragraph post merges inline;
    /// anything else splits the section at `position` and inserts the
    /// sections between the halves. Returns the position at the end of
    /// the inserted content.
    pub fn insert_post(&mut self, position: Position, other: &Post) -> Position {
        self.assert_open();
        if other.is_blank() {
            return position;
        }
        let Some((section, _)) = position.parts() else {
            // Blank post: adopt the sections wholesale.
            for section in self.import_sections(other) {
                self.insert_section_at_end(section);
            }
            let result = self.post.tail_position();
            self.schedule_range(result.to_range());
            return result;
        };

        let single_markerable = other.sections().len() == 1
            && other
                .sections()
                .head()
                .and_then(|id| other.sections().get(id))
                .is_some_and(Section::is_markerable);
        if single_markerable && self.post.markerable(section).is_some() {
            let head = other.sections().head().expect("post is not blank");
            let Section::Markup(imported) = self.import_section(other, head) else {
                unreachable!("section is markerable");
            };
            let markers: Vec<Marker> = imported
                .content
                .markers()
                .iter()
                .map(|(_, m)| m.clone())
                .collect();
            return self.insert_markers(position, markers);
        }

        let (_, after) = self.split_section(position);
        let anchor = match after {
            SectionId::Top(id) => id,
            SectionId::Item { list, item } => {
                let (_, next_list) = self.split_list_before_item(list, item);
                next_list
            }
        };
        let imported = self.import_sections(other);
        let mut last_leaf = None;
        for section in imported {
            let id = self.insert_section_before(Some(anchor), section);
            last_leaf = self.post.last_leaf_in(id).or(last_leaf);
        }
        let result = match last_leaf {
            Some(leaf) => Position::at(leaf, self.post.leaf_len(leaf)),
            None => position,
        };
        self.schedule_range(result.to_range());
        result
    }

    fn import_sections(&mut self, other: &Post) -> Vec<Section> {
        let ids: Vec<ItemId> = other.sections().iter().map(|(id, _)| id).collect();
        ids.into_iter()
            .map(|id| self.import_section(other, id))
            .collect()
    }

    /// Clone a section out of `other`, re-interning markups into this
    /// post's table.
    fn import_section(&mut self, other: &Post, id: ItemId) -> Section {
        let section = other.sections().get(id).expect("section is live");
        match section {
            Section::Markup(section) => {
                let mut imported = MarkupSection::new(
                    section.tag,
                    self.import_markerable(other, &section.content),
                );
                imported.attributes = section.attributes.clone();
                Section::Markup(imported)
            }
            Section::List(section) => {
                let items = section
                    .items
                    .iter()
                    .map(|(_, item)| {
                        ListItem::new(self.import_markerable(other, &item.content))
                    })
                    .collect();
                let mut imported = ListSection::new(section.tag, items);
                imported.attributes = section.attributes.clone();
                Section::List(imported)
            }
            Section::Card(card) => Section::Card(card.clone()),
            Section::Image(image) => {
                Section::Image(ImageSection::new(image.src.clone()))
            }
        }
    }

    fn import_markerable(&mut self, other: &Post, content: &Markerable) -> Markerable {
        let markers = content
            .markers()
            .iter()
            .map(|(_, marker)| {
                let mut marker = marker.clone();
                marker.markups = marker
                    .markups
                    .iter()
                    .map(|id| self.post.intern_markup(other.markup(*id).clone()))
                    .collect();
                marker
            })
            .collect();
        Markerable::from_markers(markers)
    }
}
