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

//! Deletion: range deletion, section cutting, and unit deletion at a
//! position (backspace / forward-delete semantics).

use crate::cursor::{Direction, Position, Range};
use crate::post::{Section, SectionId};

use super::PostEditor;

impl PostEditor {
    /// Delete the content covered by `range` and return the resulting
    /// collapsed position.
    ///
    /// When head and tail share a section the section is trimmed in
    /// place. Otherwise the head section's tail and the tail section's
    /// head are cut, whole interior leaf sections are removed, and the
    /// two remainders are joined when both are markerable (cross-type
    /// joins, e.g. list item onto paragraph, included) — or the blank
    /// markerable side is dropped. Deleting everything leaves one blank
    /// paragraph.
    pub fn delete_range(&mut self, range: Range) -> Position {
        self.assert_open();
        let (Some((head_section, head_offset)), Some((tail_section, tail_offset))) =
            (range.head.parts(), range.tail.parts())
        else {
            return range.head;
        };
        if range.head == range.tail {
            return range.head;
        }
        self.did_mutate = true;

        let position = if head_section == tail_section {
            let new_id = self.cut_section(head_section, head_offset, tail_offset);
            let offset = if new_id == head_section { head_offset } else { 0 };
            Position::at(new_id, offset)
        } else {
            let leaves = self.post.walk_leaf_sections(&range);
            for leaf in &leaves[1..leaves.len().saturating_sub(1)] {
                self.remove_leaf(*leaf);
            }
            let head_len = self.post.leaf_len(head_section);
            let new_head = self.cut_section(head_section, head_offset, head_len);
            let new_tail = self.cut_section(tail_section, 0, tail_offset);
            let head_markerable = self.post.markerable(new_head).is_some();
            let tail_markerable = self.post.markerable(new_tail).is_some();
            match (head_markerable, tail_markerable) {
                (true, true) => {
                    let content = self.take_leaf_content(new_tail);
                    let offset = self.post.leaf_len(new_head).min(head_offset);
                    self.chain_mut(new_head).join(content);
                    self.mark_dirty(new_head);
                    Position::at(new_head, offset)
                }
                (true, false) if self.post.leaf_is_blank(new_head) => {
                    self.remove_leaf(new_head);
                    Position::at(new_tail, 0)
                }
                (true, false) => Position::at(new_head, head_offset),
                (false, true) => Position::at(new_tail, 0),
                (false, false) => Position::at(new_head, head_offset),
            }
        };

        if self.post.is_blank() {
            let id = self.post.sections_mut().append(Section::blank_markup());
            let position = Position::at(SectionId::Top(id), 0);
            self.schedule_range(position.to_range());
            return position;
        }
        self.schedule_range(position.to_range());
        position
    }

    /// Trim `[head_offset, tail_offset)` out of a single section.
    ///
    /// Blank sections and empty spans are no-ops. A fully covered card or
    /// image is replaced by a blank paragraph; partial coverage of an
    /// atomic section is a no-op. Returns the id of the surviving (or
    /// replacement) section.
    pub fn cut_section(
        &mut self,
        section: SectionId,
        head_offset: usize,
        tail_offset: usize,
    ) -> SectionId {
        self.assert_open();
        if head_offset >= tail_offset {
            return section;
        }
        if self.post.leaf_is_atomic(section) {
            let SectionId::Top(id) = section else {
                unreachable!("atomic sections are top-level");
            };
            if head_offset == 0 && tail_offset >= 1 {
                let sections = self.post.sections_mut();
                let new_id = sections.insert_before(Some(id), Section::blank_markup());
                sections.remove(id);
                self.did_mutate = true;
                return SectionId::Top(new_id);
            }
            return section;
        }
        if self.post.leaf_is_blank(section) {
            return section;
        }
        let Some(content) = self.post.markerable_mut(section) else {
            return section;
        };
        content.cut(head_offset, tail_offset);
        self.mark_dirty(section);
        self.did_mutate = true;
        section
    }

    /// Delete one unit at `position` in `direction`: backspace when
    /// backward, forward-delete when forward. Returns the resulting
    /// position. Joins across leaf section boundaries; a neighboring
    /// atomic section is removed outright.
    pub fn delete_at(&mut self, position: Position, direction: Direction) -> Position {
        self.assert_open();
        let Some((section, offset)) = position.parts() else {
            return position;
        };
        match direction {
            Direction::Backward => {
                if offset == 0 {
                    let Some(prev) = self.post.prev_leaf(section) else {
                        return position;
                    };
                    if self.post.leaf_is_atomic(prev) {
                        self.remove_leaf(prev);
                        self.schedule_range(position.to_range());
                        return position;
                    }
                    let prev_tail = Position::at(prev, self.post.leaf_len(prev));
                    return self.delete_range(Range::new(prev_tail, position));
                }
                if self.post.leaf_is_atomic(section) {
                    let new_id = self.cut_section(section, 0, 1);
                    let result = Position::at(new_id, 0);
                    self.schedule_range(result.to_range());
                    return result;
                }
                let start = Position::at(section, offset - 1);
                self.delete_range(Range::new(start, position))
            }
            Direction::Forward => {
                let len = self.post.leaf_len(section);
                if offset == len {
                    let Some(next) = self.post.next_leaf(section) else {
                        return position;
                    };
                    if self.post.leaf_is_atomic(next) {
                        self.remove_leaf(next);
                        self.schedule_range(position.to_range());
                        return position;
                    }
                    let next_head = Position::at(next, 0);
                    return self.delete_range(Range::new(position, next_head));
                }
                if self.post.leaf_is_atomic(section) {
                    let new_id = self.cut_section(section, 0, 1);
                    let result = Position::at(new_id, 0);
                    self.schedule_range(result.to_range());
                    return result;
                }
                let end = Position::at(section, offset + 1);
                self.delete_range(Range::new(position, end))
            }
        }
    }
}
