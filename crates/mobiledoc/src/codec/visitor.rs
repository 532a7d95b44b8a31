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

//! First serialization phase: flatten the document tree into an opcode
//! list.
//!
//! Opcodes carry resolved markup values rather than per-post ids, so a
//! compiler can intern its own version-specific tables without seeing
//! the post.

use serde_json::Value;

use crate::post::{
    Attributes, ListTag, Markerable, MarkerContent, Markup, Post, Section,
    SectionTag,
};

#[derive(Debug, Clone)]
pub(crate) enum Opcode {
    BeginMarkupSection { tag: SectionTag, attributes: Attributes },
    EndMarkupSection,
    BeginListSection { tag: ListTag, attributes: Attributes },
    EndListSection,
    BeginListItem,
    EndListItem,
    Marker { markups: Vec<Markup>, content: MarkerContent },
    Card { name: String, payload: Value },
    Image { src: String },
}

pub(crate) fn visit(post: &Post) -> Vec<Opcode> {
    let mut opcodes = Vec::new();
    for (_, section) in post.sections().iter() {
        match section {
            Section::Markup(section) => {
                opcodes.push(Opcode::BeginMarkupSection {
                    tag: section.tag,
                    attributes: section.attributes.clone(),
                });
                visit_markers(post, &section.content, &mut opcodes);
                opcodes.push(Opcode::EndMarkupSection);
            }
            Section::List(section) => {
                opcodes.push(Opcode::BeginListSection {
                    tag: section.tag,
                    attributes: section.attributes.clone(),
                });
                for (_, item) in section.items.iter() {
                    opcodes.push(Opcode::BeginListItem);
                    visit_markers(post, &item.content, &mut opcodes);
                    opcodes.push(Opcode::EndListItem);
                }
                opcodes.push(Opcode::EndListSection);
            }
            Section::Card(card) => opcodes.push(Opcode::Card {
                name: card.name.clone(),
                payload: card.payload.clone(),
            }),
            Section::Image(image) => opcodes.push(Opcode::Image {
                src: image.src.clone(),
            }),
        }
    }
    opcodes
}

fn visit_markers(post: &Post, content: &Markerable, opcodes: &mut Vec<Opcode>) {
    for (_, marker) in content.markers().iter() {
        let markups = marker
            .markups
            .iter()
            .map(|id| post.markup(*id).clone())
            .collect();
        opcodes.push(Opcode::Marker {
            markups,
            content: marker.content.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::post::{
        CardSection, ListItem, ListSection, Marker, MarkupSection, MarkupTag,
    };

    #[test]
    fn visit_flattens_the_tree_in_document_order() {
        let mut post = Post::new();
        let strong = post.intern_markup(Markup::new(MarkupTag::Strong));
        post.sections_mut().append(Section::Markup(MarkupSection::new(
            SectionTag::P,
            Markerable::from_markers(vec![Marker::text("ab", vec![strong])]),
        )));
        post.sections_mut().append(Section::List(ListSection::new(
            ListTag::Ol,
            vec![ListItem::new(Markerable::from_markers(vec![Marker::text(
                "one", vec![],
            )]))],
        )));
        post.sections_mut()
            .append(Section::Card(CardSection::new("hr", json!({}))));

        let opcodes = visit(&post);
        let shape: Vec<&'static str> = opcodes
            .iter()
            .map(|op| match op {
                Opcode::BeginMarkupSection { .. } => "begin-markup",
                Opcode::EndMarkupSection => "end-markup",
                Opcode::BeginListSection { .. } => "begin-list",
                Opcode::EndListSection => "end-list",
                Opcode::BeginListItem => "begin-item",
                Opcode::EndListItem => "end-item",
                Opcode::Marker { .. } => "marker",
                Opcode::Card { .. } => "card",
                Opcode::Image { .. } => "image",
            })
            .collect();
        assert_eq!(
            shape,
            [
                "begin-markup",
                "marker",
                "end-markup",
                "begin-list",
                "begin-item",
                "marker",
                "end-item",
                "end-list",
                "card",
            ]
        );
    }

    #[test]
    fn markers_carry_resolved_markup_values() {
        let mut post = Post::new();
        let link = post.intern_markup(Markup::with_attributes(
            MarkupTag::A,
            vec![("href".to_string(), "https://example.com".to_string())],
        ));
        post.sections_mut().append(Section::Markup(MarkupSection::new(
            SectionTag::P,
            Markerable::from_markers(vec![Marker::text("x", vec![link])]),
        )));
        let opcodes = visit(&post);
        let Opcode::Marker { markups, .. } = &opcodes[1] else {
            panic!("expected a marker opcode");
        };
        assert_eq!(markups.len(), 1);
        assert_eq!(markups[0].attribute("href"), Some("https://example.com"));
    }
}
