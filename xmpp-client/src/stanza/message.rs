// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{check_name, AsXml, Element, Encoder};
use crate::error::{Error, ProtocolError};
use crate::ns;

/// The main structure representing the `<message/>` stanza.
///
/// A message error is not modeled: it stays in
/// [`other_elem`][`Message::other_elem`] together with every other payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    /// The JID emitting this stanza.
    pub from: Option<String>,

    /// The recipient of this stanza.
    pub to: Option<String>,

    /// The @id attribute of this stanza, which is required in order to
    /// match a request with its response.
    pub id: Option<String>,

    /// The type of this message.
    pub type_: Option<String>,

    /// The `xml:lang` of this message.
    pub lang: Option<String>,

    /// The subject of this message.
    pub subject: Option<String>,

    /// The body of this message.
    pub body: Option<String>,

    /// An optional thread identifier.
    pub thread: Option<String>,

    /// A list of the extension payloads contained in this stanza.
    pub other_elem: Vec<Element>,
}

impl Message {
    /// Creates a new `<message type='chat'/>` to `to`, with the given body.
    pub fn chat<T: Into<String>, B: Into<String>>(to: T, body: B) -> Message {
        Message {
            to: Some(to.into()),
            type_: Some(String::from("chat")),
            body: Some(body.into()),
            ..Default::default()
        }
    }

    /// The decoded character data of every extension payload, in order.
    pub fn other_texts(&self) -> Vec<&str> {
        self.other_elem
            .iter()
            .map(|elem| elem.text.as_str())
            .collect()
    }
}

impl TryFrom<Element> for Message {
    type Error = ProtocolError;

    fn try_from(elem: Element) -> Result<Message, ProtocolError> {
        check_name(&elem, ns::JABBER_CLIENT, "message")?;
        let attr = |name: &str| elem.attr(name).map(str::to_owned);
        let mut message = Message {
            from: attr("from"),
            to: attr("to"),
            id: attr("id"),
            type_: attr("type"),
            lang: elem.attr_ns(ns::XML, "lang").map(str::to_owned),
            ..Default::default()
        };
        for child in elem.children {
            let slot = match (child.name.ns.as_str(), child.name.local.as_str()) {
                (ns::JABBER_CLIENT, "subject") => &mut message.subject,
                (ns::JABBER_CLIENT, "body") => &mut message.body,
                (ns::JABBER_CLIENT, "thread") => &mut message.thread,
                _ => {
                    message.other_elem.push(child);
                    continue;
                }
            };
            *slot = Some(child.text);
        }
        Ok(message)
    }
}

impl AsXml for Message {
    fn write_xml(&self, w: &mut Encoder) -> Result<(), Error> {
        w.start(ns::JABBER_CLIENT, "message")?;
        w.opt_attr("from", self.from.as_deref());
        w.opt_attr("id", self.id.as_deref());
        w.opt_attr("to", self.to.as_deref());
        w.opt_attr("type", self.type_.as_deref());
        w.opt_attr("xml:lang", self.lang.as_deref());
        let texts = [
            ("subject", &self.subject),
            ("body", &self.body),
            ("thread", &self.thread),
        ];
        for (local, text) in texts {
            if let Some(text) = text {
                w.text_child(ns::JABBER_CLIENT, local, text)?;
            }
        }
        for elem in &self.other_elem {
            elem.write_xml(w)?;
        }
        w.end()
    }
}
