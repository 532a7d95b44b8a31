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

//! Logical cursor addresses: a zero-width point between two units of a
//! leaf section, or the blank sentinel of an empty post.

use std::cmp::Ordering;

use crate::list::ItemId;
use crate::post::{Post, SectionId, UnitClass};

use super::range::{Direction, Range};

/// A logical (leaf section, offset) address, or the blank sentinel.
///
/// `0 <= offset <= leaf length` always holds for positions produced by
/// this crate. Atom units and atomic sections count as exactly 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    inner: Option<(SectionId, usize)>,
}

impl Position {
    pub fn at(section: SectionId, offset: usize) -> Self {
        Self {
            inner: Some((section, offset)),
        }
    }

    pub fn blank() -> Self {
        Self { inner: None }
    }

    pub fn is_blank(&self) -> bool {
        self.inner.is_none()
    }

    pub fn parts(&self) -> Option<(SectionId, usize)> {
        self.inner
    }

    pub fn section(&self) -> Option<SectionId> {
        self.inner.map(|(section, _)| section)
    }

    pub fn offset(&self) -> usize {
        self.inner.map_or(0, |(_, offset)| offset)
    }

    pub fn to_range(self) -> Range {
        Range::new(self, self)
    }

    pub fn is_head_of_section(&self) -> bool {
        self.inner.is_some_and(|(_, offset)| offset == 0)
    }

    pub fn is_tail_of_section(&self, post: &Post) -> bool {
        self.inner
            .is_some_and(|(section, offset)| offset == post.leaf_len(section))
    }

    pub fn is_head_of_post(&self, post: &Post) -> bool {
        *self == post.head_position()
    }

    pub fn is_tail_of_post(&self, post: &Post) -> bool {
        *self == post.tail_position()
    }

    /// Step one unit left, hopping to the previous leaf section's tail at
    /// a section head. A no-op at the head of the post.
    pub fn move_left(&self, post: &Post) -> Position {
        let Some((section, offset)) = self.inner else {
            return *self;
        };
        if offset > 0 {
            return Position::at(section, offset - 1);
        }
        match post.prev_leaf(section) {
            Some(prev) => Position::at(prev, post.leaf_len(prev)),
            None => *self,
        }
    }

    /// Step one unit right, hopping to the next leaf section's head at a
    /// section tail. A no-op at the tail of the post.
    pub fn move_right(&self, post: &Post) -> Position {
        let Some((section, offset)) = self.inner else {
            return *self;
        };
        if offset < post.leaf_len(section) {
            return Position::at(section, offset + 1);
        }
        match post.next_leaf(section) {
            Some(next) => Position::at(next, 0),
            None => *self,
        }
    }

    /// Step `units` to the right (negative values step left), clamping at
    /// the post boundaries.
    pub fn move_unit(&self, post: &Post, units: isize) -> Position {
        let mut position = *self;
        for _ in 0..units.unsigned_abs() {
            position = if units < 0 {
                position.move_left(post)
            } else {
                position.move_right(post)
            };
        }
        position
    }

    /// Move to the previous/next word boundary. The scan stops at leaf
    /// section boundaries and treats an atom as a single indivisible word.
    pub fn move_word(&self, post: &Post, direction: Direction) -> Position {
        match direction {
            Direction::Backward => self.move_word_backward(post),
            Direction::Forward => self.move_word_forward(post),
        }
    }

    fn move_word_backward(&self, post: &Post) -> Position {
        let Some((mut section, mut offset)) = self.inner else {
            return *self;
        };
        if offset == 0 {
            match post.prev_leaf(section) {
                Some(prev) => {
                    section = prev;
                    offset = post.leaf_len(prev);
                }
                None => return *self,
            }
        }
        let Some(content) = post.markerable(section) else {
            // An atomic section: step to its head.
            return Position::at(section, 0);
        };
        let mut o = offset;
        while o > 0 && content.classify_unit(o - 1) == Some(UnitClass::NonWord) {
            o -= 1;
        }
        if o > 0 && content.classify_unit(o - 1) == Some(UnitClass::Atom) {
            return Position::at(section, o - 1);
        }
        while o > 0 && content.classify_unit(o - 1) == Some(UnitClass::Word) {
            o -= 1;
        }
        Position::at(section, o)
    }

    fn move_word_forward(&self, post: &Post) -> Position {
        let Some((mut section, mut offset)) = self.inner else {
            return *self;
        };
        if offset == post.leaf_len(section) {
            match post.next_leaf(section) {
                Some(next) => {
                    section = next;
                    offset = 0;
                }
                None => return *self,
            }
        }
        let Some(content) = post.markerable(section) else {
            return Position::at(section, post.leaf_len(section));
        };
        let len = content.text_len();
        let mut o = offset;
        while o < len && content.classify_unit(o) == Some(UnitClass::NonWord) {
            o += 1;
        }
        if o < len && content.classify_unit(o) == Some(UnitClass::Atom) {
            return Position::at(section, o + 1);
        }
        while o < len && content.classify_unit(o) == Some(UnitClass::Word) {
            o += 1;
        }
        Position::at(section, o)
    }

    /// The marker owning this position's boundary: the left marker going
    /// backward, the right marker going forward, the containing marker at
    /// an interior offset either way.
    pub fn marker_in(&self, post: &Post, direction: Direction) -> Option<ItemId> {
        let (section, offset) = self.inner?;
        let content = post.markerable(section)?;
        match direction {
            Direction::Backward => content.marker_before(offset),
            Direction::Forward => content.marker_after(offset),
        }
    }

    /// Document-order comparison. The blank sentinel only equals itself.
    pub fn cmp_in(&self, other: &Position, post: &Post) -> Ordering {
        match (self.inner, other.inner) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some((a_section, a_offset)), Some((b_section, b_offset))) => {
                if a_section == b_section {
                    return a_offset.cmp(&b_offset);
                }
                let a_index = post.leaf_index(a_section).unwrap_or(usize::MAX);
                let b_index = post.leaf_index(b_section).unwrap_or(usize::MAX);
                a_index.cmp(&b_index)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::post::{
        CardSection, ListItem, ListSection, ListTag, Marker, Markerable,
        MarkupSection, Section, SectionTag,
    };

    fn post_with_sections() -> Post {
        let mut post = Post::new();
        post.sections_mut().append(Section::Markup(MarkupSection::new(
            SectionTag::P,
            Markerable::from_markers(vec![Marker::text("ab", vec![])]),
        )));
        post.sections_mut().append(Section::List(ListSection::new(
            ListTag::Ul,
            vec![ListItem::new(Markerable::from_markers(vec![Marker::text(
                "cd", vec![],
            )]))],
        )));
        post
    }

    #[test]
    fn move_right_crosses_leaf_boundaries() {
        let post = post_with_sections();
        let leaves = post.leaf_sections();
        let position = Position::at(leaves[0], 2).move_right(&post);
        assert_eq!(position, Position::at(leaves[1], 0));
    }

    #[test]
    fn move_left_crosses_leaf_boundaries() {
        let post = post_with_sections();
        let leaves = post.leaf_sections();
        let position = Position::at(leaves[1], 0).move_left(&post);
        assert_eq!(position, Position::at(leaves[0], 2));
    }

    #[test]
    fn moves_clamp_at_the_post_boundaries() {
        let post = post_with_sections();
        let head = post.head_position();
        let tail = post.tail_position();
        assert_eq!(head.move_left(&post), head);
        assert_eq!(tail.move_right(&post), tail);
    }

    #[test]
    fn move_unit_round_trips_away_from_boundaries() {
        let post = post_with_sections();
        let leaves = post.leaf_sections();
        let position = Position::at(leaves[0], 1);
        for n in [1isize, 2, 3] {
            let there_and_back =
                position.move_unit(&post, n).move_unit(&post, -n);
            assert_eq!(there_and_back, position, "move {n}");
        }
    }

    #[test]
    fn move_word_skips_words_and_separators() {
        let mut post = Post::new();
        post.sections_mut().append(Section::Markup(MarkupSection::new(
            SectionTag::P,
            Markerable::from_markers(vec![Marker::text("one two", vec![])]),
        )));
        let leaf = post.leaf_sections()[0];
        let tail = post.tail_position();
        let back = tail.move_word(&post, Direction::Backward);
        assert_eq!(back, Position::at(leaf, 4));
        let back = back.move_word(&post, Direction::Backward);
        assert_eq!(back, Position::at(leaf, 0));
        let forward = back.move_word(&post, Direction::Forward);
        assert_eq!(forward, Position::at(leaf, 3));
    }

    #[test]
    fn move_word_treats_an_atom_as_one_unit() {
        let mut post = Post::new();
        post.sections_mut().append(Section::Markup(MarkupSection::new(
            SectionTag::P,
            Markerable::from_markers(vec![
                Marker::text("hi ", vec![]),
                Marker::atom("mention", "@alice", json!(null), vec![]),
            ]),
        )));
        let leaf = post.leaf_sections()[0];
        let back = post.tail_position().move_word(&post, Direction::Backward);
        assert_eq!(back, Position::at(leaf, 3));
        let forward = Position::at(leaf, 3).move_word(&post, Direction::Forward);
        assert_eq!(forward, Position::at(leaf, 4));
    }

    #[test]
    fn move_word_stops_at_leaf_section_boundaries() {
        let post = post_with_sections();
        let leaves = post.leaf_sections();
        let back =
            Position::at(leaves[1], 0).move_word(&post, Direction::Backward);
        assert_eq!(back, Position::at(leaves[0], 0));
    }

    #[test]
    fn move_word_steps_over_an_atomic_section() {
        let mut post = post_with_sections();
        post.sections_mut()
            .append(Section::Card(CardSection::new("hr", json!({}))));
        let leaves = post.leaf_sections();
        let back = Position::at(leaves[2], 1).move_word(&post, Direction::Backward);
        assert_eq!(back, Position::at(leaves[2], 0));
    }

    #[test]
    fn marker_in_disambiguates_boundaries() {
        let mut post = Post::new();
        post.sections_mut().append(Section::Markup(MarkupSection::new(
            SectionTag::P,
            Markerable::from_markers(vec![
                Marker::text("ab", vec![]),
                Marker::text("cd", vec![]),
            ]),
        )));
        let leaf = post.leaf_sections()[0];
        let boundary = Position::at(leaf, 2);
        let left = boundary.marker_in(&post, Direction::Backward).unwrap();
        let right = boundary.marker_in(&post, Direction::Forward).unwrap();
        let content = post.markerable(leaf).unwrap();
        assert_eq!(content.offset_of(left), 0);
        assert_eq!(content.offset_of(right), 2);
        let interior = Position::at(leaf, 1);
        assert_eq!(
            interior.marker_in(&post, Direction::Backward),
            interior.marker_in(&post, Direction::Forward),
        );
    }

    #[test]
    fn positions_order_by_leaf_then_offset() {
        let post = post_with_sections();
        let leaves = post.leaf_sections();
        let a = Position::at(leaves[0], 1);
        let b = Position::at(leaves[1], 0);
        assert_eq!(a.cmp_in(&b, &post), Ordering::Less);
        assert_eq!(b.cmp_in(&a, &post), Ordering::Greater);
        assert_eq!(a.cmp_in(&a, &post), Ordering::Equal);
    }
}
