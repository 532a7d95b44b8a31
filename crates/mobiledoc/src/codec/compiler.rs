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

//! Second serialization phase: compile an opcode list into one wire
//! revision's JSON shape.
//!
//! The compiler interns markups, cards and atoms into the revision's
//! lookup tables by structural identity, so repeated values share one
//! table entry. Marker open/close counts are derived by comparing each
//! marker's markup list with its neighbors': a markup opens at the first
//! marker whose list introduces it and closes after the last marker
//! whose list retains it.

use serde_json::{json, Value};

use crate::post::{Atom, Attributes, Markup, MarkerContent};

use super::visitor::Opcode;
use super::{
    MobiledocVersion, ATOM_MARKER_TYPE, CARD_SECTION_TYPE, IMAGE_SECTION_TYPE,
    LIST_SECTION_TYPE, MARKUP_MARKER_TYPE, MARKUP_SECTION_TYPE,
};

pub(crate) fn compile(version: MobiledocVersion, opcodes: &[Opcode]) -> Value {
    Compiler::new(version).document(opcodes)
}

struct Compiler {
    version: MobiledocVersion,
    markups: Vec<Markup>,
    cards: Vec<(String, Value)>,
    atoms: Vec<Atom>,
}

/// One marker's payload, collected out of the opcode stream.
type MarkerRun<'a> = (&'a [Markup], &'a MarkerContent);

impl Compiler {
    fn new(version: MobiledocVersion) -> Self {
        Self {
            version,
            markups: Vec::new(),
            cards: Vec::new(),
            atoms: Vec::new(),
        }
    }

    fn document(mut self, opcodes: &[Opcode]) -> Value {
        let mut sections = Vec::new();
        let mut i = 0;
        while i < opcodes.len() {
            match &opcodes[i] {
                Opcode::BeginMarkupSection { tag, attributes } => {
                    i += 1;
                    let markers = collect_markers(opcodes, &mut i);
                    debug_assert!(matches!(opcodes[i], Opcode::EndMarkupSection));
                    i += 1;
                    let mut tuple = vec![
                        json!(MARKUP_SECTION_TYPE),
                        json!(tag.as_ref()),
                        Value::Array(self.encode_markers(&markers)),
                    ];
                    if self.version.has_section_attributes() {
                        tuple.push(attributes_value(attributes));
                    }
                    sections.push(Value::Array(tuple));
                }
                Opcode::BeginListSection { tag, attributes } => {
                    i += 1;
                    let mut items = Vec::new();
                    while matches!(opcodes.get(i), Some(Opcode::BeginListItem)) {
                        i += 1;
                        let markers = collect_markers(opcodes, &mut i);
                        debug_assert!(matches!(opcodes[i], Opcode::EndListItem));
                        i += 1;
                        items.push(Value::Array(self.encode_markers(&markers)));
                    }
                    debug_assert!(matches!(opcodes[i], Opcode::EndListSection));
                    i += 1;
                    let mut tuple = vec![
                        json!(LIST_SECTION_TYPE),
                        json!(tag.as_ref()),
                        Value::Array(items),
                    ];
                    if self.version.has_section_attributes() {
                        tuple.push(attributes_value(attributes));
                    }
                    sections.push(Value::Array(tuple));
                }
                Opcode::Card { name, payload } => {
                    i += 1;
                    sections.push(if self.version.has_item_tables() {
                        let index = self.intern_card(name, payload);
                        json!([CARD_SECTION_TYPE, index])
                    } else {
                        json!([CARD_SECTION_TYPE, name, payload])
                    });
                }
                Opcode::Image { src } => {
                    i += 1;
                    sections.push(json!([IMAGE_SECTION_TYPE, src]));
                }
                other => unreachable!("unexpected opcode at section level: {other:?}"),
            }
        }

        let markup_defs: Vec<Value> =
            self.markups.iter().map(markup_value).collect();
        if self.version.has_item_tables() {
            let atoms: Vec<Value> = self
                .atoms
                .iter()
                .map(|atom| json!([atom.name, atom.value, atom.payload]))
                .collect();
            let cards: Vec<Value> = self
                .cards
                .iter()
                .map(|(name, payload)| json!([name, payload]))
                .collect();
            json!({
                "version": self.version.as_ref(),
                "atoms": atoms,
                "cards": cards,
                "markups": markup_defs,
                "sections": sections,
            })
        } else {
            json!({
                "version": self.version.as_ref(),
                "sections": [markup_defs, sections],
            })
        }
    }

    fn encode_markers(&mut self, markers: &[MarkerRun<'_>]) -> Vec<Value> {
        let mut out = Vec::with_capacity(markers.len());
        for index in 0..markers.len() {
            let (markups, content) = markers[index];
            let prev: &[Markup] = if index == 0 {
                &[]
            } else {
                markers[index - 1].0
            };
            let next: &[Markup] = markers.get(index + 1).map_or(&[], |run| run.0);
            let opens: Vec<Value> = markups[shared_prefix(prev, markups)..]
                .iter()
                .map(|markup| json!(self.intern_markup(markup)))
                .collect();
            let close = markups.len() - shared_prefix(markups, next);
            out.push(self.marker_value(opens, close, content));
        }
        out
    }

    fn marker_value(
        &mut self,
        opens: Vec<Value>,
        close: usize,
        content: &MarkerContent,
    ) -> Value {
        if !self.version.has_item_tables() {
            // 0.2 predates atoms; an atom degrades to its display text.
            let text = match content {
                MarkerContent::Text(text) => text,
                MarkerContent::Atom(atom) => &atom.value,
            };
            return json!([opens, close, text]);
        }
        match content {
            MarkerContent::Text(text) => {
                json!([MARKUP_MARKER_TYPE, opens, close, text])
            }
            MarkerContent::Atom(atom) => {
                let index = self.intern_atom(atom);
                json!([ATOM_MARKER_TYPE, opens, close, index])
            }
        }
    }

    fn intern_markup(&mut self, markup: &Markup) -> usize {
        match self.markups.iter().position(|m| m == markup) {
            Some(index) => index,
            None => {
                self.markups.push(markup.clone());
                self.markups.len() - 1
            }
        }
    }

    fn intern_card(&mut self, name: &str, payload: &Value) -> usize {
        match self
            .cards
            .iter()
            .position(|(n, p)| n == name && p == payload)
        {
            Some(index) => index,
            None => {
                self.cards.push((name.to_string(), payload.clone()));
                self.cards.len() - 1
            }
        }
    }

    fn intern_atom(&mut self, atom: &Atom) -> usize {
        match self.atoms.iter().position(|a| a == atom) {
            Some(index) => index,
            None => {
                self.atoms.push(atom.clone());
                self.atoms.len() - 1
            }
        }
    }
}

fn collect_markers<'a>(opcodes: &'a [Opcode], i: &mut usize) -> Vec<MarkerRun<'a>> {
    let mut markers = Vec::new();
    while let Some(Opcode::Marker { markups, content }) = opcodes.get(*i) {
        markers.push((markups.as_slice(), content));
        *i += 1;
    }
    markers
}

/// Length of the shared leading run of two markup lists.
fn shared_prefix(a: &[Markup], b: &[Markup]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// A markup table entry: `["strong"]`, or `["a", ["href", ...]]` with a
/// flat key/value attribute array.
fn markup_value(markup: &Markup) -> Value {
    if markup.attributes().is_empty() {
        return json!([markup.tag().as_ref()]);
    }
    let mut pairs = Vec::new();
    for (key, value) in markup.attributes() {
        pairs.push(json!(key));
        pairs.push(json!(value));
    }
    json!([markup.tag().as_ref(), pairs])
}

/// A section attribute array: flat key/value pairs, 0.3.2 only.
fn attributes_value(attributes: &Attributes) -> Value {
    let mut pairs = Vec::new();
    for (key, value) in attributes.iter() {
        pairs.push(json!(key));
        pairs.push(json!(value));
    }
    Value::Array(pairs)
}
