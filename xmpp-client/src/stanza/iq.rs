// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{check_name, AsXml, Bind, Element, Encoder, StanzaError};
use crate::error::{Error, ProtocolError};
use crate::ns;

/// The main structure representing the `<iq/>` stanza.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Iq {
    /// The JID emitting this stanza.
    pub from: Option<String>,

    /// The recipient of this stanza.
    pub to: Option<String>,

    /// The @id attribute of this stanza, which is required in order to
    /// match a request with its response.
    pub id: Option<String>,

    /// The type of this query: `get`, `set`, `result` or `error`.
    pub type_: Option<String>,

    /// A resource binding payload.
    pub bind: Option<Bind>,

    /// The error, for queries of type `error`.
    pub error: Option<StanzaError>,

    /// Any other payload.
    pub other_elem: Vec<Element>,
}

impl Iq {
    /// A resource binding request.
    pub fn bind_request<S: Into<String>>(id: S, bind: Bind) -> Iq {
        Iq {
            id: Some(id.into()),
            type_: Some(String::from("set")),
            bind: Some(bind),
            ..Default::default()
        }
    }

    /// Whether this is a `result` query.
    pub fn is_result(&self) -> bool {
        self.type_.as_deref() == Some("result")
    }
}

impl TryFrom<Element> for Iq {
    type Error = ProtocolError;

    fn try_from(elem: Element) -> Result<Iq, ProtocolError> {
        check_name(&elem, ns::JABBER_CLIENT, "iq")?;
        let attr = |name: &str| elem.attr(name).map(str::to_owned);
        let mut iq = Iq {
            from: attr("from"),
            to: attr("to"),
            id: attr("id"),
            type_: attr("type"),
            ..Default::default()
        };
        for child in elem.children {
            match (child.name.ns.as_str(), child.name.local.as_str()) {
                (ns::BIND, "bind") => iq.bind = Some(Bind::try_from(child)?),
                (ns::JABBER_CLIENT, "error") => iq.error = Some(StanzaError::try_from(child)?),
                _ => iq.other_elem.push(child),
            }
        }
        Ok(iq)
    }
}

impl AsXml for Iq {
    fn write_xml(&self, w: &mut Encoder) -> Result<(), Error> {
        w.start(ns::JABBER_CLIENT, "iq")?;
        w.opt_attr("type", self.type_.as_deref());
        w.opt_attr("id", self.id.as_deref());
        w.opt_attr("from", self.from.as_deref());
        w.opt_attr("to", self.to.as_deref());
        if let Some(bind) = &self.bind {
            bind.write_xml(w)?;
        }
        for elem in &self.other_elem {
            elem.write_xml(w)?;
        }
        if let Some(error) = &self.error {
            error.write_xml(w)?;
        }
        w.end()
    }
}
