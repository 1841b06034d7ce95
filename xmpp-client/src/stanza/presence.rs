// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{check_name, AsXml, Element, Encoder, StanzaError};
use crate::error::{Error, ProtocolError};
use crate::ns;

/// The main structure representing the `<presence/>` stanza.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Presence {
    /// The sender of this presence.
    pub from: Option<String>,

    /// The recipient of this presence.
    pub to: Option<String>,

    /// The identifier, unique on this stream, of this stanza.
    pub id: Option<String>,

    /// The type of this presence stanza.
    pub type_: Option<String>,

    /// The `xml:lang` of this presence.
    pub lang: Option<String>,

    /// The availability of the sender of this presence.
    pub show: Option<String>,

    /// A localised status message.
    pub status: Option<String>,

    /// The sender's resource priority, as sent.
    pub priority: Option<String>,

    /// The error, for presences of type `error`.
    pub error: Option<StanzaError>,

    /// A list of payloads contained in this presence.
    pub other_elem: Vec<Element>,
}

impl TryFrom<Element> for Presence {
    type Error = ProtocolError;

    fn try_from(elem: Element) -> Result<Presence, ProtocolError> {
        check_name(&elem, ns::JABBER_CLIENT, "presence")?;
        let attr = |name: &str| elem.attr(name).map(str::to_owned);
        let mut presence = Presence {
            from: attr("from"),
            to: attr("to"),
            id: attr("id"),
            type_: attr("type"),
            lang: elem.attr_ns(ns::XML, "lang").map(str::to_owned),
            ..Default::default()
        };
        for child in elem.children {
            let slot = match (child.name.ns.as_str(), child.name.local.as_str()) {
                (ns::JABBER_CLIENT, "show") => &mut presence.show,
                (ns::JABBER_CLIENT, "status") => &mut presence.status,
                (ns::JABBER_CLIENT, "priority") => &mut presence.priority,
                (ns::JABBER_CLIENT, "error") => {
                    presence.error = Some(StanzaError::try_from(child)?);
                    continue;
                }
                _ => {
                    presence.other_elem.push(child);
                    continue;
                }
            };
            *slot = Some(child.text);
        }
        Ok(presence)
    }
}

impl AsXml for Presence {
    fn write_xml(&self, w: &mut Encoder) -> Result<(), Error> {
        w.start(ns::JABBER_CLIENT, "presence")?;
        w.opt_attr("from", self.from.as_deref());
        w.opt_attr("id", self.id.as_deref());
        w.opt_attr("to", self.to.as_deref());
        w.opt_attr("type", self.type_.as_deref());
        w.opt_attr("xml:lang", self.lang.as_deref());
        if let Some(show) = &self.show {
            w.text_child(ns::JABBER_CLIENT, "show", show)?;
        }
        if let Some(status) = &self.status {
            w.text_child(ns::JABBER_CLIENT, "status", status)?;
        }
        if let Some(priority) = &self.priority {
            w.text_child(ns::JABBER_CLIENT, "priority", priority)?;
        }
        if let Some(error) = &self.error {
            error.write_xml(w)?;
        }
        for elem in &self.other_elem {
            elem.write_xml(w)?;
        }
        w.end()
    }
}
