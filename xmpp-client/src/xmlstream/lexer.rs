// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Single-event lexing on top of [`quick_xml`].
//!
//! The reader keeps its own buffer and hands the unparsed tail of it to
//! [`lex`] one event at a time. A fresh [`quick_xml::Reader`] is created for
//! every call, which keeps quick-xml entirely stateless with respect to the
//! stream: nesting, namespaces and stream restarts are tracked by the
//! caller. In exchange, the lexer has to tell apart "this event is
//! complete" from "the buffer ends in the middle of this event".

use quick_xml::errors::SyntaxError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::Error;

/// An event with owned, prefix-unresolved names.
#[derive(Debug, PartialEq)]
pub(super) enum Lexed {
    /// `<name attrs...>` or `<name attrs.../>`
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        empty: bool,
    },
    /// `</name>`
    End { name: String },
    /// Character data, entity references resolved.
    Text(String),
    /// XML declaration, comment, processing instruction or doctype.
    Skip,
}

#[derive(Debug, PartialEq)]
pub(super) enum Step {
    /// A complete event spanning the first `len` bytes of the input.
    Event { lexed: Lexed, len: usize },
    /// The input ends inside an event.
    NeedMore,
    /// The input is exhausted and no more data will arrive.
    Eof,
}

fn utf8(bytes: &[u8]) -> Result<String, Error> {
    Ok(std::str::from_utf8(bytes)?.to_owned())
}

fn start_of(e: &BytesStart<'_>, empty: bool) -> Result<Lexed, Error> {
    let name = utf8(e.name().as_ref())?;
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(Lexed::Start { name, attrs, empty })
}

/// Whether `err` only means the input stops inside a construct.
fn truncated(err: &SyntaxError, input: &[u8]) -> bool {
    match err {
        SyntaxError::UnclosedPIOrXmlDecl
        | SyntaxError::UnclosedComment
        | SyntaxError::UnclosedDoctype
        | SyntaxError::UnclosedCData
        | SyntaxError::UnclosedTag => true,
        // quick-xml cannot classify `<!` before seeing the next byte.
        SyntaxError::InvalidBangMarkup => input == b"<!",
    }
}

/// Lex the first event of `input`.
///
/// `at_eof` tells whether `input` is all that will ever be available. If it
/// is not, truncated markup and trailing character data are reported as
/// [`Step::NeedMore`] instead of being returned early.
pub(super) fn lex(input: &[u8], at_eof: bool) -> Result<Step, Error> {
    let mut reader = Reader::from_reader(input);
    let config = reader.config_mut();
    config.trim_text(false);
    // Nesting is checked by the caller, and each call sees a single event
    // without the start tags that came before it.
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let event = match reader.read_event() {
        Ok(event) => event,
        Err(quick_xml::Error::Syntax(e)) if !at_eof && truncated(&e, input) => {
            return Ok(Step::NeedMore)
        }
        Err(e) => return Err(e.into()),
    };
    let len = reader.buffer_position() as usize;

    let lexed = match event {
        Event::Start(e) => start_of(&e, false)?,
        Event::Empty(e) => start_of(&e, true)?,
        Event::End(e) => Lexed::End {
            name: utf8(e.name().as_ref())?,
        },
        Event::Text(t) => {
            // Text only ends at the next '<'.
            if len >= input.len() && !at_eof {
                return Ok(Step::NeedMore);
            }
            Lexed::Text(t.unescape()?.into_owned())
        }
        Event::CData(c) => Lexed::Text(utf8(&c)?),
        Event::Eof => {
            return Ok(if at_eof { Step::Eof } else { Step::NeedMore });
        }
        _ => Lexed::Skip,
    };
    Ok(Step::Event { lexed, len })
}
