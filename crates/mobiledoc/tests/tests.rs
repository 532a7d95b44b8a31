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

use indoc::indoc;
use serde_json::json;
use speculoos::{assert_that, AssertionFailure, Spec};

use mobiledoc::{
    parse, render, CardSection, Direction, Editor, ImageSection, ListItem,
    ListSection, ListTag, Marker, Markerable, Markup, MarkupSection, MarkupTag,
    MobiledocVersion, Position, Post, Range, Section, SectionTag,
};

fn paragraph(text: &str) -> Section {
    Section::Markup(MarkupSection::new(
        SectionTag::P,
        Markerable::from_markers(vec![Marker::text(text, vec![])]),
    ))
}

fn list(tag: ListTag, items: &[&str]) -> Section {
    Section::List(ListSection::new(
        tag,
        items
            .iter()
            .map(|text| {
                ListItem::new(Markerable::from_markers(vec![Marker::text(
                    *text,
                    vec![],
                )]))
            })
            .collect(),
    ))
}

/// A post exercising every section kind and a nested markup run.
fn rich_post() -> Post {
    let mut post = Post::new();
    let strong = post.intern_markup(Markup::new(MarkupTag::Strong));
    let link = post.intern_markup(Markup::with_attributes(
        MarkupTag::A,
        vec![("href".to_string(), "https://example.com".to_string())],
    ));
    post.sections_mut().append(Section::Markup(MarkupSection::new(
        SectionTag::H2,
        Markerable::from_markers(vec![Marker::text("Title", vec![])]),
    )));
    post.sections_mut().append(Section::Markup(MarkupSection::new(
        SectionTag::P,
        Markerable::from_markers(vec![
            Marker::text("plain ", vec![]),
            Marker::text("bold", vec![strong]),
            Marker::text("bold link", vec![strong, link]),
            Marker::text(" tail", vec![]),
        ]),
    )));
    post.sections_mut().append(list(ListTag::Ol, &["one", "two"]));
    post.sections_mut()
        .append(Section::Card(CardSection::new("hr", json!({}))));
    post.sections_mut()
        .append(Section::Image(ImageSection::new("cat.png")));
    post
}

trait Roundtrips {
    fn roundtrips_at(&self, version: MobiledocVersion);
}

impl Roundtrips for Spec<'_, Post> {
    fn roundtrips_at(&self, version: MobiledocVersion) {
        let doc = render(self.subject, version);
        let reparsed = parse(&doc).expect("a rendered document parses");
        let output = render(&reparsed, version);
        if output != doc {
            AssertionFailure::from_spec(self)
                .with_expected(doc.to_string())
                .with_actual(output.to_string())
                .fail();
        }
    }
}

// ---------------------------------------------------------------------------
// Content preservation across splits
// ---------------------------------------------------------------------------

#[test]
fn splitting_a_section_preserves_concatenated_text() {
    for offset in 0..=9 {
        let mut editor = Editor::new();
        editor.run(|post_editor| {
            let strong = post_editor.intern_markup(Markup::new(MarkupTag::Strong));
            let position = post_editor.post().head_position();
            post_editor.insert_markers(
                position,
                vec![
                    Marker::text("abc", vec![strong]),
                    Marker::atom("mention", "@alice", json!(null), vec![]),
                    Marker::text("defgh", vec![]),
                ],
            );
        });
        let original = editor.post().leaf_text(editor.post().leaf_sections()[0]);
        editor.run(|post_editor| {
            let leaf = post_editor.post().leaf_sections()[0];
            post_editor.split_section(Position::at(leaf, offset));
        });
        let leaves = editor.post().leaf_sections();
        let rejoined: String = leaves
            .iter()
            .map(|leaf| editor.post().leaf_text(*leaf))
            .collect();
        assert_eq!(rejoined, original, "split at {offset}");
    }
}

#[test]
fn split_marker_at_offset_keeps_markup_assignment() {
    let mut post = Post::new();
    let bold = post.intern_markup(Markup::new(MarkupTag::B));
    let mut content = Markerable::from_markers(vec![
        Marker::text("ab", vec![bold]),
        Marker::text("cd", vec![]),
    ]);
    content.split_marker_at_offset(1);
    let summary: Vec<(String, bool)> = content
        .markers()
        .iter()
        .map(|(_, m)| (m.display_text().to_string(), m.has_markup(bold)))
        .collect();
    assert_eq!(
        summary,
        [
            ("a".to_string(), true),
            ("b".to_string(), true),
            ("cd".to_string(), false),
        ]
    );
}

// ---------------------------------------------------------------------------
// Round trips through every wire revision
// ---------------------------------------------------------------------------

#[test]
fn every_version_round_trips_the_rich_post() {
    let post = rich_post();
    for version in [
        MobiledocVersion::V0_2,
        MobiledocVersion::V0_3,
        MobiledocVersion::V0_3_1,
        MobiledocVersion::V0_3_2,
    ] {
        assert_that!(post).roundtrips_at(version);
    }
}

#[test]
fn parsing_preserves_text_and_structure() {
    let post = rich_post();
    let reparsed = parse(&render(&post, MobiledocVersion::LATEST)).unwrap();
    assert_eq!(reparsed.text(), post.text());
    assert_eq!(reparsed.to_tree(), post.to_tree());
}

#[test]
fn atoms_survive_0_3_and_later() {
    let mut post = Post::new();
    post.sections_mut().append(Section::Markup(MarkupSection::new(
        SectionTag::P,
        Markerable::from_markers(vec![
            Marker::text("hi ", vec![]),
            Marker::atom("mention", "@alice", json!({"id": 7}), vec![]),
        ]),
    )));
    for version in [
        MobiledocVersion::V0_3,
        MobiledocVersion::V0_3_1,
        MobiledocVersion::V0_3_2,
    ] {
        assert_that!(post).roundtrips_at(version);
        let reparsed = parse(&render(&post, version)).unwrap();
        let leaf = reparsed.leaf_sections()[0];
        let content = reparsed.markerable(leaf).unwrap();
        let (_, atom) = content.markers().iter().nth(1).unwrap();
        assert!(atom.is_atom(), "{version}");
    }
}

#[test]
fn an_ordered_list_round_trips_0_3_2_exactly() {
    let mut post = Post::new();
    post.sections_mut().append(list(ListTag::Ol, &["abc"]));
    let doc = render(&post, MobiledocVersion::V0_3_2);
    assert_eq!(
        doc,
        json!({
            "version": "0.3.2",
            "atoms": [],
            "cards": [],
            "markups": [],
            "sections": [[3, "ol", [[[0, [], 0, "abc"]]], []]],
        })
    );
    let reparsed = parse(&doc).unwrap();
    let head = reparsed.sections().head().unwrap();
    let section = reparsed.sections().get(head).unwrap().as_list().unwrap();
    assert_eq!(section.tag, ListTag::Ol);
    assert_eq!(section.items.len(), 1);
    assert_eq!(reparsed.text(), "abc");
}

// ---------------------------------------------------------------------------
// Deletion and its inverse
// ---------------------------------------------------------------------------

#[test]
fn deleting_then_reinserting_restores_the_text() {
    for (head, tail) in [(0, 2), (1, 4), (3, 6), (0, 6)] {
        let mut editor = Editor::new();
        editor.run(|post_editor| {
            let position = post_editor.post().head_position();
            post_editor.insert_text(position, "abcdef");
        });
        let leaf = editor.post().leaf_sections()[0];
        let deleted: String = "abcdef"
            .chars()
            .skip(head)
            .take(tail - head)
            .collect();
        editor.run(|post_editor| {
            let position = post_editor.delete_range(Range::new(
                Position::at(leaf, head),
                Position::at(leaf, tail),
            ));
            post_editor.insert_text(position, &deleted);
        });
        assert_eq!(editor.post().text(), "abcdef", "cut [{head}, {tail})");
    }
}

#[test]
fn deleting_across_sections_joins_cross_type_remainders() {
    let mut post = Post::new();
    post.sections_mut().append(paragraph("intro"));
    post.sections_mut().append(list(ListTag::Ul, &["first", "second"]));
    let mut editor = Editor::from_post(post);
    let leaves = editor.post().leaf_sections();
    editor.run(|post_editor| {
        post_editor.delete_range(Range::new(
            Position::at(leaves[0], 3),
            Position::at(leaves[1], 3),
        ));
    });
    assert_eq!(editor.post().text(), "intst\nsecond");
    assert_eq!(
        editor.post().to_tree(),
        indoc! {r#"

            ├>p
            │ └>"intst"
            └>ul
              └>li
                └>"second"
        "#}
    );
}

// ---------------------------------------------------------------------------
// Cursor movement laws
// ---------------------------------------------------------------------------

#[test]
fn unit_moves_invert_away_from_post_boundaries() {
    let mut post = Post::new();
    post.sections_mut().append(paragraph("ab"));
    post.sections_mut().append(list(ListTag::Ul, &["cd"]));
    let leaves = post.leaf_sections();
    let interior = Position::at(leaves[0], 1);
    for n in [1isize, 2, 3] {
        assert_eq!(
            interior.move_unit(&post, n).move_unit(&post, -n),
            interior,
            "move {n}"
        );
    }
}

#[test]
fn unit_moves_clamp_at_post_boundaries() {
    let mut post = Post::new();
    post.sections_mut().append(paragraph("ab"));
    let head = post.head_position();
    let tail = post.tail_position();
    assert_eq!(head.move_unit(&post, -5), head);
    assert_eq!(tail.move_unit(&post, 5), tail);
    // A move past the boundary does not invert.
    assert_ne!(head.move_unit(&post, -1).move_unit(&post, 1), head);
}

// ---------------------------------------------------------------------------
// Block toggling
// ---------------------------------------------------------------------------

#[test]
fn blockquote_toggle_is_uniform_and_reverts() {
    let mut post = Post::new();
    post.sections_mut().append(paragraph("one"));
    post.sections_mut().append(list(ListTag::Ul, &["two"]));
    let mut editor = Editor::from_post(post);

    let range = editor.post().to_range();
    editor.run(|post_editor| {
        post_editor.toggle_section(SectionTag::Blockquote, range);
    });
    let tags: Vec<bool> = editor
        .post()
        .sections()
        .iter()
        .map(|(_, section)| {
            section
                .as_markup()
                .is_some_and(|s| s.tag == SectionTag::Blockquote)
        })
        .collect();
    assert_eq!(tags, [true, true]);

    let range = editor.post().to_range();
    editor.run(|post_editor| {
        post_editor.toggle_section(SectionTag::Blockquote, range);
    });
    let tags: Vec<bool> = editor
        .post()
        .sections()
        .iter()
        .map(|(_, section)| {
            section.as_markup().is_some_and(|s| s.tag == SectionTag::P)
        })
        .collect();
    assert_eq!(tags, [true, true]);
    assert_eq!(editor.post().text(), "one\ntwo");
}

// ---------------------------------------------------------------------------
// Undo / redo
// ---------------------------------------------------------------------------

#[test]
fn undo_then_redo_restores_the_serialized_document() {
    let mut editor = Editor::new();
    editor.run(|post_editor| {
        let position = post_editor.post().head_position();
        post_editor.insert_text(position, "hello");
    });
    editor.run(|post_editor| {
        let strong = post_editor.intern_markup(Markup::new(MarkupTag::Strong));
        let leaf = post_editor.post().leaf_sections()[0];
        let range = Range::new(Position::at(leaf, 0), Position::at(leaf, 5));
        post_editor.add_markup_to_range(range, strong);
    });
    let formatted = editor.serialize(MobiledocVersion::LATEST);

    assert!(editor.undo());
    assert_ne!(editor.serialize(MobiledocVersion::LATEST), formatted);
    assert!(editor.redo());
    assert_eq!(editor.serialize(MobiledocVersion::LATEST), formatted);
}

#[test]
fn undo_crosses_structural_boundaries() {
    let mut post = Post::new();
    post.sections_mut().append(paragraph("abc"));
    post.sections_mut().append(paragraph("def"));
    let mut editor = Editor::from_post(post);
    let before = editor.serialize(MobiledocVersion::LATEST);
    let leaves = editor.post().leaf_sections();
    editor.run(|post_editor| {
        post_editor.delete_range(Range::new(
            Position::at(leaves[0], 1),
            Position::at(leaves[1], 2),
        ));
    });
    assert_eq!(editor.post().text(), "af");
    assert!(editor.undo());
    assert_eq!(editor.serialize(MobiledocVersion::LATEST), before);
    assert_eq!(editor.post().text(), "abc\ndef");
}

// ---------------------------------------------------------------------------
// An end-to-end session
// ---------------------------------------------------------------------------

#[test]
fn an_editing_session_survives_persistence() {
    let mut editor = Editor::new();
    editor.run(|post_editor| {
        let position = post_editor.post().head_position();
        let end = post_editor.insert_text(position, "Hello world");
        post_editor.split_section(end);
    });
    editor.run(|post_editor| {
        let tail = post_editor.post().tail_position();
        post_editor.insert_text(tail, "Second paragraph");
    });
    editor.run(|post_editor| {
        let em = post_editor.intern_markup(Markup::new(MarkupTag::Em));
        let leaf = post_editor.post().leaf_sections()[0];
        let range = Range::new(Position::at(leaf, 0), Position::at(leaf, 5));
        post_editor.add_markup_to_range(range, em);
    });
    assert_eq!(editor.post().text(), "Hello world\nSecond paragraph");

    let doc = editor.serialize(MobiledocVersion::LATEST);
    let reopened = Editor::from_mobiledoc(&doc).unwrap();
    assert_eq!(reopened.post().to_tree(), editor.post().to_tree());
    assert_eq!(
        reopened.post().to_tree(),
        indoc! {r#"

            ├>p
            │ ├>"Hello" (em)
            │ └>" world"
            └>p
              └>"Second paragraph"
        "#}
    );
}

#[test]
fn word_movement_crosses_markers_but_not_sections() {
    let mut post = Post::new();
    post.sections_mut().append(paragraph("one two"));
    post.sections_mut().append(paragraph("three"));
    let leaves = post.leaf_sections();
    let tail = post.tail_position();
    let mut position = tail;
    let mut stops = Vec::new();
    loop {
        let next = position.move_word(&post, Direction::Backward);
        if next == position {
            break;
        }
        stops.push(next);
        position = next;
    }
    assert_eq!(
        stops,
        [
            Position::at(leaves[1], 0),
            Position::at(leaves[0], 4),
            Position::at(leaves[0], 0),
        ]
    );
}
