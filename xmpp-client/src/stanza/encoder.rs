// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{Error, ProtocolError};
use crate::ns;
use crate::xmlstream::{Namespaces, QName};

/// The bindings a top-level element of a client stream is read against.
fn client_stream() -> Namespaces {
    Namespaces {
        default: ns::JABBER_CLIENT.to_owned(),
        prefixes: vec![("stream".to_owned(), ns::STREAM.to_owned())],
    }
}

/// A prefix which is not bound in `namespaces`.
fn free_prefix(namespaces: &Namespaces) -> String {
    (0..)
        .map(|n| format!("ns{}", n))
        .find(|prefix| namespaces.prefix_uri(prefix).is_none())
        .unwrap_or_default()
}

struct Open {
    tag: String,
    namespaces: Namespaces,
}

/// Writes elements as they are meant to appear on a client stream.
///
/// Elements are written against the namespaces of the stream: a top-level
/// element in `jabber:client` carries no namespace declaration, and below
/// it a child only declares its namespace where it differs from the
/// default in effect. Attributes are single-quoted.
///
/// A start tag is held back until the element gets content, so elements
/// without any are written as `<empty/>`.
pub struct Encoder {
    writer: Writer<Vec<u8>>,
    root: Namespaces,
    open: Vec<Open>,
    pending: Option<String>,
}

impl Default for Encoder {
    fn default() -> Encoder {
        Encoder::new()
    }
}

impl Encoder {
    /// Create an encoder for top-level elements of a client stream.
    pub fn new() -> Encoder {
        Encoder {
            writer: Writer::new(Vec::new()),
            root: client_stream(),
            open: Vec::new(),
            pending: None,
        }
    }

    fn scope(&self) -> &Namespaces {
        self.open.last().map_or(&self.root, |open| &open.namespaces)
    }

    fn flush(&mut self) -> Result<(), Error> {
        if let Some(content) = self.pending.take() {
            let name_len = self.open.last().map_or(content.len(), |open| open.tag.len());
            self.writer
                .write_event(Event::Start(BytesStart::from_content(content, name_len)))?;
        }
        Ok(())
    }

    fn open_tag(&mut self, tag: String, namespaces: Namespaces) -> Result<(), Error> {
        self.flush()?;
        let outer = self.scope();
        let mut content = tag.clone();
        if namespaces.default != outer.default {
            push_attr(&mut content, "xmlns", &namespaces.default);
        }
        for (prefix, uri) in &namespaces.prefixes {
            if outer.prefix_uri(prefix) != Some(uri.as_str()) {
                push_attr(&mut content, &format!("xmlns:{}", prefix), uri);
            }
        }
        self.pending = Some(content);
        self.open.push(Open { tag, namespaces });
        Ok(())
    }

    /// Open the element `local` in namespace `ns`.
    pub fn start(&mut self, ns: &str, local: &str) -> Result<(), Error> {
        let mut namespaces = self.scope().clone();
        namespaces.default = ns.to_owned();
        self.open_tag(local.to_owned(), namespaces)
    }

    /// Open the element `name`, whose content is to be read against
    /// `namespaces`.
    ///
    /// Every binding of `namespaces` which differs from the one in effect
    /// is declared on the element. If the default namespace of the content
    /// is not the namespace of `name`, the element name gets a prefix.
    pub fn start_within(&mut self, name: &QName, namespaces: &Namespaces) -> Result<(), Error> {
        let mut namespaces = namespaces.clone();
        if name.ns.is_empty() {
            namespaces.default = String::new();
        }
        let tag = if namespaces.default == name.ns {
            name.local.clone()
        } else {
            let prefix = match namespaces.prefix_of(&name.ns) {
                Some(prefix) => prefix.to_owned(),
                None => {
                    let prefix = free_prefix(&namespaces);
                    namespaces.bind(&prefix, &name.ns);
                    prefix
                }
            };
            format!("{}:{}", prefix, name.local)
        };
        self.open_tag(tag, namespaces)
    }

    /// Add an attribute to the element just opened, named exactly `name`.
    pub fn attr(&mut self, name: &str, value: &str) {
        if let Some(content) = &mut self.pending {
            push_attr(content, name, value);
        }
    }

    /// Add an attribute to the element just opened, if `value` is set.
    pub fn opt_attr(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.attr(name, value);
        }
    }

    /// Add the attribute `name` to the element just opened, declaring a
    /// prefix for its namespace if none is bound.
    pub fn qualified_attr(&mut self, name: &QName, value: &str) {
        match name.ns.as_str() {
            "" => self.attr(&name.local, value),
            ns::XML => self.attr(&format!("xml:{}", name.local), value),
            uri => {
                let prefix = self.attr_prefix(uri);
                self.attr(&format!("{}:{}", prefix, name.local), value);
            }
        }
    }

    fn attr_prefix(&mut self, uri: &str) -> String {
        if let Some(prefix) = self.scope().prefix_of(uri) {
            return prefix.to_owned();
        }
        let prefix = free_prefix(self.scope());
        if let Some(open) = self.open.last_mut() {
            open.namespaces.bind(&prefix, uri);
        }
        self.attr(&format!("xmlns:{}", prefix), uri);
        prefix
    }

    /// Write character data, escaping it.
    pub fn text(&mut self, text: &str) -> Result<(), Error> {
        if text.is_empty() {
            return Ok(());
        }
        self.flush()?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    /// Write markup exactly as given.
    pub fn raw(&mut self, markup: &str) -> Result<(), Error> {
        if markup.is_empty() {
            return Ok(());
        }
        self.flush()?;
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(markup)))?;
        Ok(())
    }

    /// Close the innermost open element.
    pub fn end(&mut self) -> Result<(), Error> {
        let open = self.open.pop().ok_or(ProtocolError::UnbalancedEndTag)?;
        match self.pending.take() {
            Some(content) => {
                let name_len = open.tag.len();
                self.writer
                    .write_event(Event::Empty(BytesStart::from_content(content, name_len)))?;
            }
            None => self.writer.write_event(Event::End(BytesEnd::new(open.tag)))?,
        }
        Ok(())
    }

    /// Write `<local>text</local>` in namespace `ns`.
    pub fn text_child(&mut self, ns: &str, local: &str, text: &str) -> Result<(), Error> {
        self.start(ns, local)?;
        self.text(text)?;
        self.end()
    }

    /// Close whatever is still open and return the markup.
    pub fn finish(mut self) -> Result<String, Error> {
        while !self.open.is_empty() {
            self.end()?;
        }
        String::from_utf8(self.writer.into_inner()).map_err(|e| e.utf8_error().into())
    }
}

fn push_attr(content: &mut String, name: &str, value: &str) {
    content.push(' ');
    content.push_str(name);
    content.push_str("='");
    content.push_str(&escape(value));
    content.push('\'');
}
