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

//! An ordered pair of positions forming a selection, with an optional
//! locked direction.

use std::cmp::Ordering;

use crate::post::{Post, SectionId};

use super::position::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// A selection: `head` comes at or before `tail` in document order.
/// Collapsed when they are equal. Carries no identity of its own; it is
/// always derived from two positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    pub head: Position,
    pub tail: Position,
    pub direction: Option<Direction>,
}

impl Range {
    pub fn new(head: Position, tail: Position) -> Self {
        Self {
            head,
            tail,
            direction: None,
        }
    }

    pub fn with_direction(head: Position, tail: Position, direction: Direction) -> Self {
        Self {
            head,
            tail,
            direction: Some(direction),
        }
    }

    /// Build a range from two positions in either order.
    pub fn ordered(post: &Post, a: Position, b: Position) -> Self {
        match a.cmp_in(&b, post) {
            Ordering::Greater => Self::new(b, a),
            _ => Self::new(a, b),
        }
    }

    pub fn blank() -> Self {
        Self::new(Position::blank(), Position::blank())
    }

    pub fn is_blank(&self) -> bool {
        self.head.is_blank() && self.tail.is_blank()
    }

    pub fn is_collapsed(&self) -> bool {
        self.head == self.tail
    }

    /// The moving end of the range: the tail when extending forward, the
    /// head when extending backward.
    pub fn focused(&self) -> Position {
        match self.direction {
            Some(Direction::Backward) => self.head,
            _ => self.tail,
        }
    }

    /// Grow the non-anchored end by `units`, locking the direction on the
    /// first extension.
    pub fn extend(&self, post: &Post, units: isize) -> Range {
        if units == 0 {
            return *self;
        }
        let direction = self.direction.unwrap_or(if units < 0 {
            Direction::Backward
        } else {
            Direction::Forward
        });
        let (head, tail) = match direction {
            Direction::Forward => (self.head, self.tail.move_unit(post, units)),
            Direction::Backward => (self.head.move_unit(post, units), self.tail),
        };
        let (head, tail) = match head.cmp_in(&tail, post) {
            Ordering::Greater => (tail, head),
            _ => (head, tail),
        };
        Range {
            head,
            tail,
            direction: Some(direction),
        }
    }

    /// Collapse a non-collapsed range to its directional end, or step a
    /// collapsed range by one unit.
    pub fn move_dir(&self, post: &Post, direction: Direction) -> Range {
        if self.is_collapsed() {
            let units = match direction {
                Direction::Backward => -1,
                Direction::Forward => 1,
            };
            return self.head.move_unit(post, units).to_range();
        }
        match direction {
            Direction::Backward => self.head.to_range(),
            Direction::Forward => self.tail.to_range(),
        }
    }

    /// Clamp this range to the slice of a single leaf section, producing
    /// offsets within `[0, section length]`.
    pub fn trim_to(&self, post: &Post, section: SectionId) -> Range {
        let len = post.leaf_len(section);
        let head_offset = match self.head.parts() {
            Some((s, offset)) if s == section => offset.min(len),
            _ => 0,
        };
        let tail_offset = match self.tail.parts() {
            Some((s, offset)) if s == section => offset.min(len),
            _ => len,
        };
        Range::new(
            Position::at(section, head_offset),
            Position::at(section, tail_offset),
        )
    }
}
