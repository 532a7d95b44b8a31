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

//! The Mobiledoc codec: serialization of a [`Post`](crate::post::Post)
//! into the versioned JSON wire format, and parsing of all four
//! historical schema revisions back into a post.
//!
//! Rendering is a two-phase pipeline: a single visitor flattens the
//! document tree into an opcode list, and a per-version compiler turns
//! the opcodes into the target revision's JSON shape. Parsing dispatches
//! on the document's `version` field; each version parser rebuilds the
//! markup/card/atom lookup tables by index before materializing
//! sections.
//!
//! Round-trip law: `parse(render(post, v))` is structurally equivalent
//! to `post` for every version `v` that can express the post's content,
//! modulo de-duplication of structurally identical markups, cards and
//! atoms.

mod compiler;
mod parser;
mod visitor;

pub use parser::{parse, parse_with, ParseOptions};

use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::post::Post;

/// Wire tag of a markup section tuple: `[1, tag, markers, ...]`.
pub(crate) const MARKUP_SECTION_TYPE: u64 = 1;
/// Wire tag of an image section tuple: `[2, src]`.
pub(crate) const IMAGE_SECTION_TYPE: u64 = 2;
/// Wire tag of a list section tuple: `[3, tag, items, ...]`.
pub(crate) const LIST_SECTION_TYPE: u64 = 3;
/// Wire tag of a card section tuple: `[10, index]` (0.3+) or
/// `[10, name, payload]` (0.2).
pub(crate) const CARD_SECTION_TYPE: u64 = 10;

/// Marker discriminant for a markup run, 0.3 onwards.
pub(crate) const MARKUP_MARKER_TYPE: u64 = 0;
/// Marker discriminant for an atom reference, 0.3 onwards.
pub(crate) const ATOM_MARKER_TYPE: u64 = 1;

/// The supported Mobiledoc schema revisions.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
pub enum MobiledocVersion {
    /// `{version, sections: [markerTypes[], sections[]]}`; markers are
    /// `[openIndexes[], closeCount, value]`. Predates atoms and section
    /// attributes.
    #[strum(serialize = "0.2")]
    V0_2,
    /// Top-level `atoms`/`cards`/`markups` tables; markers gain a
    /// leading type discriminant.
    #[strum(serialize = "0.3")]
    V0_3,
    #[strum(serialize = "0.3.1")]
    V0_3_1,
    /// Adds a trailing attributes array to markup-section and
    /// list-section tuples.
    #[strum(serialize = "0.3.2")]
    V0_3_2,
}

impl MobiledocVersion {
    pub const LATEST: MobiledocVersion = MobiledocVersion::V0_3_2;

    /// Whether this revision carries per-section attribute arrays.
    pub(crate) fn has_section_attributes(&self) -> bool {
        matches!(self, MobiledocVersion::V0_3_2)
    }

    /// Whether this revision carries top-level atom/card tables.
    pub(crate) fn has_item_tables(&self) -> bool {
        !matches!(self, MobiledocVersion::V0_2)
    }
}

/// Serialize `post` as a Mobiledoc document of the given `version`.
///
/// Content the target revision cannot express degrades: atoms render as
/// their display text before 0.3, and section attributes are dropped
/// before 0.3.2.
pub fn render(post: &Post, version: MobiledocVersion) -> Value {
    let opcodes = visitor::visit(post);
    compiler::compile(version, &opcodes)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;
    use strum::IntoEnumIterator;

    use super::*;
    use crate::post::{
        Marker, Markerable, Markup, MarkupSection, MarkupTag, Section, SectionTag,
    };

    #[test]
    fn versions_parse_from_their_wire_strings() {
        for version in MobiledocVersion::iter() {
            let round = MobiledocVersion::from_str(version.as_ref()).unwrap();
            assert_eq!(round, version);
        }
        assert!(MobiledocVersion::from_str("0.4").is_err());
        assert_eq!(MobiledocVersion::LATEST.as_ref(), "0.3.2");
    }

    #[test]
    fn render_emits_the_requested_version_field() {
        let mut post = Post::new();
        post.sections_mut().append(Section::Markup(MarkupSection::new(
            SectionTag::P,
            Markerable::from_markers(vec![Marker::text("abc", vec![])]),
        )));
        for version in MobiledocVersion::iter() {
            let doc = render(&post, version);
            assert_eq!(doc["version"], json!(version.as_ref()));
        }
    }

    #[test]
    fn round_trip_preserves_text_for_every_version() {
        let mut post = Post::new();
        let strong = post.intern_markup(Markup::new(MarkupTag::Strong));
        post.sections_mut().append(Section::Markup(MarkupSection::new(
            SectionTag::H2,
            Markerable::from_markers(vec![
                Marker::text("ab", vec![strong]),
                Marker::text("cd", vec![]),
            ]),
        )));
        for version in MobiledocVersion::iter() {
            let doc = render(&post, version);
            let parsed = parse(&doc).unwrap();
            assert_eq!(parsed.text(), post.text(), "{version}");
            assert_eq!(render(&parsed, version), doc, "{version}");
        }
    }
}
