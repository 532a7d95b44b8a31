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

//! The transactional mutation engine.
//!
//! A [`PostEditor`] is bound to one transaction: every structural change
//! to a post goes through it, so that dirty tracking and queue-based
//! repair run consistently. `complete()` drains the three callback
//! queues in strict order — structural repair, caller callbacks, range
//! re-selection — exactly once; mutating after completion is a bug at
//! the call site and panics.

mod delete;
mod formatting;
mod insert;
mod sections;
mod split;

pub use sections::BlockTag;

use std::collections::HashSet;

use tracing::trace;

use crate::cursor::{Position, Range};
use crate::post::{Markerable, Markup, MarkupId, Post, Section, SectionId};

/// The three completion queues, drained in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Queue {
    /// Structural repair: scheduled section removal, contiguous list
    /// merging, marker coalescing.
    BeforeComplete,
    /// Caller-scheduled work.
    Complete,
    /// Range re-selection.
    AfterComplete,
}

type Callback = Box<dyn FnOnce(&mut PostEditor)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Open,
    Completing,
    Closed,
}

pub(crate) struct Outcome {
    pub post: Post,
    pub range: Range,
    pub did_mutate: bool,
    pub snapshot_cancelled: bool,
}

/// Single-use mutation handle for one `Editor::run` transaction.
pub struct PostEditor {
    post: Post,
    range: Range,
    phase: Phase,
    before_complete: Vec<Callback>,
    on_complete: Vec<Callback>,
    after_complete: Vec<Callback>,
    once_keys: HashSet<(Queue, &'static str)>,
    dirty: Vec<SectionId>,
    removals: Vec<SectionId>,
    scheduled_range: Option<Range>,
    did_mutate: bool,
    snapshot_cancelled: bool,
}

impl PostEditor {
    pub(crate) fn new(post: Post, range: Range) -> Self {
        Self {
            post,
            range,
            phase: Phase::Open,
            before_complete: Vec::new(),
            on_complete: Vec::new(),
            after_complete: Vec::new(),
            once_keys: HashSet::new(),
            dirty: Vec::new(),
            removals: Vec::new(),
            scheduled_range: None,
            did_mutate: false,
            snapshot_cancelled: false,
        }
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    /// Intern `markup` into the post's table, for use with the markup
    /// range operations.
    pub fn intern_markup(&mut self, markup: Markup) -> MarkupId {
        self.post.intern_markup(markup)
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Queue `callback` to run during `complete()`.
    pub fn schedule(
        &mut self,
        queue: Queue,
        callback: impl FnOnce(&mut PostEditor) + 'static,
    ) {
        self.assert_open();
        self.queue_mut(queue).push(Box::new(callback));
    }

    /// Queue `callback` at most once per `key` for the whole transaction.
    pub fn schedule_once(
        &mut self,
        queue: Queue,
        key: &'static str,
        callback: impl FnOnce(&mut PostEditor) + 'static,
    ) {
        self.assert_open();
        if self.once_keys.insert((queue, key)) {
            self.queue_mut(queue).push(Box::new(callback));
        }
    }

    /// Select `range` once the transaction completes.
    pub fn schedule_range(&mut self, range: Range) {
        self.scheduled_range = Some(range);
    }

    /// Remove `section` during structural repair if it is still blank by
    /// then.
    pub fn schedule_for_removal(&mut self, section: SectionId) {
        if !self.removals.contains(&section) {
            self.removals.push(section);
        }
    }

    /// Drop the history snapshot pending for this transaction, so that a
    /// restore does not pollute the undo stack.
    pub fn cancel_snapshot(&mut self) {
        self.snapshot_cancelled = true;
    }

    /// Replace the live post wholesale. Used when restoring a serialized
    /// snapshot.
    pub(crate) fn replace_post(&mut self, post: Post) {
        self.assert_open();
        self.post = post;
        self.did_mutate = true;
    }

    /// Drain the three completion queues in order. Runs exactly once.
    ///
    /// # Panics
    ///
    /// Panics if called twice.
    pub fn complete(&mut self) {
        assert!(
            self.phase == Phase::Open,
            "complete() may only run once per transaction"
        );
        self.phase = Phase::Completing;
        self.perform_repairs();
        self.drain(Queue::BeforeComplete);
        self.drain(Queue::Complete);
        if let Some(range) = self.scheduled_range.take() {
            self.range = range;
        }
        self.range = self.clamp_range(self.range);
        self.drain(Queue::AfterComplete);
        self.phase = Phase::Closed;
        trace!(did_mutate = self.did_mutate, "transaction complete");
    }

    pub(crate) fn into_outcome(self) -> Outcome {
        Outcome {
            post: self.post,
            range: self.range,
            did_mutate: self.did_mutate,
            snapshot_cancelled: self.snapshot_cancelled,
        }
    }

    // -----------------------------------------------------------------------
    // Internals shared by the operation modules
    // -----------------------------------------------------------------------

    fn assert_open(&self) {
        assert!(
            self.phase == Phase::Open,
            "a PostEditor cannot mutate after complete()"
        );
    }

    fn queue_mut(&mut self, queue: Queue) -> &mut Vec<Callback> {
        match queue {
            Queue::BeforeComplete => &mut self.before_complete,
            Queue::Complete => &mut self.on_complete,
            Queue::AfterComplete => &mut self.after_complete,
        }
    }

    fn drain(&mut self, queue: Queue) {
        let callbacks = std::mem::take(self.queue_mut(queue));
        for callback in callbacks {
            callback(self);
        }
    }

    fn mark_dirty(&mut self, section: SectionId) {
        if !self.dirty.contains(&section) {
            self.dirty.push(section);
        }
    }

    /// The markerable content of `section`.
    ///
    /// # Panics
    ///
    /// Panics if the section is not markerable.
    fn chain_mut(&mut self, section: SectionId) -> &mut Markerable {
        self.post
            .markerable_mut(section)
            .expect("section is not markerable")
    }

    /// Remove a leaf section. Removing the last item of a list schedules
    /// the emptied list for removal.
    fn remove_leaf(&mut self, leaf: SectionId) {
        match leaf {
            SectionId::Top(id) => {
                self.post.sections_mut().remove(id);
            }
            SectionId::Item { list, item } => {
                let empty = {
                    let section = self
                        .post
                        .sections_mut()
                        .get_mut(list)
                        .and_then(Section::as_list_mut)
                        .expect("list item parent is a list");
                    section.items.remove(item);
                    section.items.is_empty()
                };
                if empty {
                    self.schedule_for_removal(SectionId::Top(list));
                }
            }
        }
        self.did_mutate = true;
    }

    /// Remove a markerable leaf and return its content, for joins.
    fn take_leaf_content(&mut self, leaf: SectionId) -> Markerable {
        match leaf {
            SectionId::Top(id) => {
                let Section::Markup(section) = self.post.sections_mut().remove(id)
                else {
                    panic!("section is not markerable");
                };
                self.did_mutate = true;
                section.content
            }
            SectionId::Item { list, item } => {
                let (content, empty) = {
                    let section = self
                        .post
                        .sections_mut()
                        .get_mut(list)
                        .and_then(Section::as_list_mut)
                        .expect("list item parent is a list");
                    let content = section.items.remove(item).content;
                    (content, section.items.is_empty())
                };
                if empty {
                    self.schedule_for_removal(SectionId::Top(list));
                }
                self.did_mutate = true;
                content
            }
        }
    }

    /// Clamp a range to live sections and valid offsets, falling back to
    /// the head of the post.
    fn clamp_range(&self, range: Range) -> Range {
        let clamp = |position: Position| -> Position {
            match position.parts() {
                Some((section, offset)) if self.post.contains_leaf(section) => {
                    Position::at(section, offset.min(self.post.leaf_len(section)))
                }
                _ => self.post.head_position(),
            }
        };
        let head = clamp(range.head);
        let tail = clamp(range.tail);
        Range {
            head,
            tail,
            direction: range.direction,
        }
    }

    /// Structural repair, run at the head of `complete()`.
    fn perform_repairs(&mut self) {
        // Scheduled removals of sections that are still blank.
        let removals = std::mem::take(&mut self.removals);
        for section in removals {
            if self.post.contains_leaf(section) && self.post.leaf_is_blank(section) {
                self.remove_leaf(section);
            }
        }

        // Merge contiguous list sections with the same tag.
        let mut cursor = self.post.sections().head();
        while let Some(id) = cursor {
            let next_id = self.post.sections().next(id);
            let merge = match (
                self.post.sections().get(id),
                next_id.and_then(|next| self.post.sections().get(next)),
            ) {
                (Some(Section::List(a)), Some(Section::List(b))) => a.tag == b.tag,
                _ => false,
            };
            if merge {
                let next_id = next_id.expect("merge candidate exists");
                let Section::List(other) = self.post.sections_mut().remove(next_id)
                else {
                    unreachable!("merge candidate is a list");
                };
                self.post
                    .sections_mut()
                    .get_mut(id)
                    .and_then(Section::as_list_mut)
                    .expect("merge target is a list")
                    .join_list(other);
                self.did_mutate = true;
            } else {
                cursor = next_id;
            }
        }

        // Coalesce markers in sections touched by this transaction.
        let dirty = std::mem::take(&mut self.dirty);
        for section in dirty {
            if let Some(content) = self.post.markerable_mut(section) {
                content.coalesce();
            }
        }

        // A post never ends a transaction with zero sections.
        if self.post.is_blank() {
            self.post.sections_mut().append(Section::blank_markup());
        }
    }
}
