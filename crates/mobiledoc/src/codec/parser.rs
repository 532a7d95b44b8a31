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

//! Per-version Mobiledoc parsers.
//!
//! The parser is selected purely by the document's `version` field. Each
//! version rebuilds its markup/card/atom lookup tables by index before
//! materializing sections, and strips the blank markers the open/close
//! annotation protocol can produce. A format error rejects the whole
//! document; unknown card and atom names are only fatal when a name
//! registry is configured without a fallback handler.

use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::error::ParseError;
use crate::post::{
    Atom, Attributes, CardSection, ImageSection, ListItem, ListSection, ListTag,
    Marker, MarkerContent, Markerable, Markup, MarkupId, MarkupSection, MarkupTag,
    Post, Section, SectionTag, VALID_SECTION_ATTRIBUTES,
};

use super::{
    MobiledocVersion, ATOM_MARKER_TYPE, CARD_SECTION_TYPE, IMAGE_SECTION_TYPE,
    LIST_SECTION_TYPE, MARKUP_MARKER_TYPE, MARKUP_SECTION_TYPE,
};

type CardFallback = dyn Fn(&str, &Value) -> CardSection;
type AtomFallback = dyn Fn(&str, &str, &Value) -> Atom;

/// Extension-point policy for parsing.
///
/// With no registry (the default) every card and atom name is accepted
/// opaquely. Registering names narrows acceptance: an unregistered name
/// goes to the fallback handler, or fails the parse when none is set.
#[derive(Default)]
pub struct ParseOptions {
    known_cards: Option<Vec<String>>,
    known_atoms: Option<Vec<String>>,
    unknown_card_handler: Option<Box<CardFallback>>,
    unknown_atom_handler: Option<Box<AtomFallback>>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict accepted card names to `names`.
    pub fn known_cards(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.known_cards = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict accepted atom names to `names`.
    pub fn known_atoms(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.known_atoms = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Absorb unregistered card names instead of failing the parse.
    pub fn on_unknown_card(
        mut self,
        handler: impl Fn(&str, &Value) -> CardSection + 'static,
    ) -> Self {
        self.unknown_card_handler = Some(Box::new(handler));
        self
    }

    /// Absorb unregistered atom names instead of failing the parse.
    pub fn on_unknown_atom(
        mut self,
        handler: impl Fn(&str, &str, &Value) -> Atom + 'static,
    ) -> Self {
        self.unknown_atom_handler = Some(Box::new(handler));
        self
    }

    fn resolve_card(
        &self,
        name: &str,
        payload: &Value,
    ) -> Result<CardSection, ParseError> {
        match &self.known_cards {
            Some(known) if !known.iter().any(|k| k == name) => {
                match &self.unknown_card_handler {
                    Some(handler) => Ok(handler(name, payload)),
                    None => Err(ParseError::UnknownCard(name.to_string())),
                }
            }
            _ => Ok(CardSection::new(name, payload.clone())),
        }
    }

    fn resolve_atom(
        &self,
        name: &str,
        value: &str,
        payload: &Value,
    ) -> Result<Atom, ParseError> {
        match &self.known_atoms {
            Some(known) if !known.iter().any(|k| k == name) => {
                match &self.unknown_atom_handler {
                    Some(handler) => Ok(handler(name, value, payload)),
                    None => Err(ParseError::UnknownAtom(name.to_string())),
                }
            }
            _ => Ok(Atom {
                name: name.to_string(),
                value: value.to_string(),
                payload: payload.clone(),
            }),
        }
    }
}

/// Parse a Mobiledoc document with the default (accept-everything)
/// options.
pub fn parse(doc: &Value) -> Result<Post, ParseError> {
    parse_with(doc, &ParseOptions::default())
}

/// Parse a Mobiledoc document of any supported version.
pub fn parse_with(doc: &Value, options: &ParseOptions) -> Result<Post, ParseError> {
    let version_field = doc
        .get("version")
        .and_then(Value::as_str)
        .ok_or(ParseError::malformed("document is missing its version field"))?;
    let version = MobiledocVersion::from_str(version_field)
        .map_err(|_| ParseError::UnrecognizedVersion(version_field.to_string()))?;
    debug!(version = %version, "parsing mobiledoc");

    let mut parser = Parser {
        post: Post::new(),
        version,
        options,
        markups: Vec::new(),
        cards: Vec::new(),
        atoms: Vec::new(),
    };
    if version.has_item_tables() {
        parser.load_markups(doc.get("markups"))?;
        parser.load_cards(doc.get("cards"))?;
        parser.load_atoms(doc.get("atoms"))?;
        parser.sections(require(doc.get("sections"), "sections")?)?;
    } else {
        // 0.2 nests the marker type table inside `sections`.
        let envelope = array(require(doc.get("sections"), "sections")?, "sections")?;
        if envelope.len() != 2 {
            return Err(ParseError::malformed(
                "0.2 sections must pair a marker type table with a section list",
            ));
        }
        parser.load_markups(envelope.first())?;
        parser.sections(&envelope[1])?;
    }
    Ok(parser.post)
}

struct Parser<'o> {
    post: Post,
    version: MobiledocVersion,
    options: &'o ParseOptions,
    markups: Vec<MarkupId>,
    cards: Vec<CardSection>,
    atoms: Vec<Atom>,
}

impl Parser<'_> {
    fn load_markups(&mut self, raw: Option<&Value>) -> Result<(), ParseError> {
        for def in array(require(raw, "markup table")?, "markup table")? {
            let def = array(def, "markup definition")?;
            let tag = MarkupTag::from_str(string(def.first(), "markup tag")?)?;
            let attributes = match def.get(1) {
                Some(pairs) => flat_pairs(pairs, "markup attributes")?,
                None => Vec::new(),
            };
            let id = self
                .post
                .intern_markup(Markup::with_attributes(tag, attributes));
            self.markups.push(id);
        }
        Ok(())
    }

    fn load_cards(&mut self, raw: Option<&Value>) -> Result<(), ParseError> {
        for def in array(require(raw, "card table")?, "card table")? {
            let def = array(def, "card definition")?;
            let name = string(def.first(), "card name")?;
            let payload = def.get(1).cloned().unwrap_or(Value::Null);
            self.cards.push(self.options.resolve_card(name, &payload)?);
        }
        Ok(())
    }

    fn load_atoms(&mut self, raw: Option<&Value>) -> Result<(), ParseError> {
        for def in array(require(raw, "atom table")?, "atom table")? {
            let def = array(def, "atom definition")?;
            let name = string(def.first(), "atom name")?;
            let value = string(def.get(1), "atom value")?;
            let payload = def.get(2).cloned().unwrap_or(Value::Null);
            self.atoms
                .push(self.options.resolve_atom(name, value, &payload)?);
        }
        Ok(())
    }

    fn sections(&mut self, raw: &Value) -> Result<(), ParseError> {
        for tuple in array(raw, "section list")? {
            let tuple = array(tuple, "section")?;
            let section = match integer(tuple.first(), "section type")? {
                MARKUP_SECTION_TYPE => {
                    let tag = SectionTag::from_str(string(
                        tuple.get(1),
                        "markup section tag",
                    )?)?;
                    let content =
                        self.markers(require(tuple.get(2), "section markers")?)?;
                    let mut section = MarkupSection::new(tag, content);
                    if self.version.has_section_attributes() {
                        section.attributes = section_attributes(tuple.get(3))?;
                    }
                    Section::Markup(section)
                }
                IMAGE_SECTION_TYPE => Section::Image(ImageSection::new(string(
                    tuple.get(1),
                    "image src",
                )?)),
                LIST_SECTION_TYPE => {
                    let tag =
                        ListTag::from_str(string(tuple.get(1), "list section tag")?)?;
                    let mut items = Vec::new();
                    for item in
                        array(require(tuple.get(2), "list items")?, "list items")?
                    {
                        items.push(ListItem::new(self.markers(item)?));
                    }
                    let mut section = ListSection::new(tag, items);
                    if self.version.has_section_attributes() {
                        section.attributes = section_attributes(tuple.get(3))?;
                    }
                    Section::List(section)
                }
                CARD_SECTION_TYPE => {
                    if self.version.has_item_tables() {
                        let index = integer(tuple.get(1), "card index")? as usize;
                        let card = self
                            .cards
                            .get(index)
                            .ok_or(ParseError::malformed(
                                "card index is out of range",
                            ))?
                            .clone();
                        Section::Card(card)
                    } else {
                        let name = string(tuple.get(1), "card name")?;
                        let payload = tuple.get(2).cloned().unwrap_or(Value::Null);
                        Section::Card(self.options.resolve_card(name, &payload)?)
                    }
                }
                _ => {
                    return Err(ParseError::malformed("unrecognized section type"));
                }
            };
            self.post.sections_mut().append(section);
        }
        Ok(())
    }

    /// Replay one marker list through the open/close protocol, then
    /// strip the blank markers the protocol can produce.
    fn markers(&mut self, raw: &Value) -> Result<Markerable, ParseError> {
        let mut open: Vec<MarkupId> = Vec::new();
        let mut markers: Vec<Marker> = Vec::new();
        for tuple in array(raw, "marker list")? {
            let tuple = array(tuple, "marker")?;
            let (opens, close, content) = self.marker_parts(tuple)?;
            for index in opens {
                let id = *self.markups.get(index).ok_or(ParseError::malformed(
                    "marker opens a markup out of table range",
                ))?;
                open.push(id);
            }
            if close > open.len() {
                return Err(ParseError::malformed(
                    "marker closes more markups than are open",
                ));
            }
            markers.push(Marker {
                content,
                markups: open.clone(),
            });
            open.truncate(open.len() - close);
        }
        markers.retain(|marker| !marker.is_blank());
        Ok(Markerable::from_markers(markers))
    }

    fn marker_parts(
        &self,
        tuple: &[Value],
    ) -> Result<(Vec<usize>, usize, MarkerContent), ParseError> {
        if !self.version.has_item_tables() {
            let opens = indexes(tuple.first(), "marker open list")?;
            let close = integer(tuple.get(1), "marker close count")? as usize;
            let text = string(tuple.get(2), "marker text")?;
            return Ok((opens, close, MarkerContent::Text(text.to_string())));
        }
        let opens = indexes(tuple.get(1), "marker open list")?;
        let close = integer(tuple.get(2), "marker close count")? as usize;
        let content = match integer(tuple.first(), "marker type")? {
            MARKUP_MARKER_TYPE => {
                MarkerContent::Text(string(tuple.get(3), "marker text")?.to_string())
            }
            ATOM_MARKER_TYPE => {
                let index = integer(tuple.get(3), "atom index")? as usize;
                let atom = self
                    .atoms
                    .get(index)
                    .ok_or(ParseError::malformed("atom index is out of range"))?
                    .clone();
                MarkerContent::Atom(atom)
            }
            _ => return Err(ParseError::malformed("unrecognized marker type")),
        };
        Ok((opens, close, content))
    }
}

// ---------------------------------------------------------------------------
// Value accessors
// ---------------------------------------------------------------------------

fn require<'a>(
    value: Option<&'a Value>,
    context: &'static str,
) -> Result<&'a Value, ParseError> {
    value.ok_or(ParseError::Malformed { context })
}

fn array<'a>(
    value: &'a Value,
    context: &'static str,
) -> Result<&'a Vec<Value>, ParseError> {
    value.as_array().ok_or(ParseError::Malformed { context })
}

fn string<'a>(
    value: Option<&'a Value>,
    context: &'static str,
) -> Result<&'a str, ParseError> {
    value
        .and_then(Value::as_str)
        .ok_or(ParseError::Malformed { context })
}

fn integer(value: Option<&Value>, context: &'static str) -> Result<u64, ParseError> {
    value
        .and_then(Value::as_u64)
        .ok_or(ParseError::Malformed { context })
}

fn indexes(
    value: Option<&Value>,
    context: &'static str,
) -> Result<Vec<usize>, ParseError> {
    array(require(value, context)?, context)?
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|n| n as usize)
                .ok_or(ParseError::Malformed { context })
        })
        .collect()
}

fn flat_pairs(
    value: &Value,
    context: &'static str,
) -> Result<Vec<(String, String)>, ParseError> {
    let items = array(value, context)?;
    if items.len() % 2 != 0 {
        return Err(ParseError::Malformed { context });
    }
    items
        .chunks(2)
        .map(|pair| {
            match (pair[0].as_str(), pair[1].as_str()) {
                (Some(key), Some(value)) => Ok((key.to_string(), value.to_string())),
                _ => Err(ParseError::Malformed { context }),
            }
        })
        .collect()
}

/// Build section attributes from the 0.3.2 trailing array, tolerating
/// its absence. Non-whitelisted keys are dropped, as with markup
/// attributes.
fn section_attributes(value: Option<&Value>) -> Result<Attributes, ParseError> {
    let mut attributes = Attributes::new();
    let Some(value) = value else {
        return Ok(attributes);
    };
    for (key, val) in flat_pairs(value, "section attributes")? {
        if VALID_SECTION_ATTRIBUTES.contains(&key.as_str()) {
            attributes.set(&key, &val);
        }
    }
    Ok(attributes)
}
