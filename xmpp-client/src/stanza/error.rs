// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;

use super::{check_name, AsXml, Element, Encoder};
use crate::error::{Error, ProtocolError};
use crate::ns;
use crate::xmlstream::QName;

/// The `<error/>` child of a stanza.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StanzaError {
    /// Legacy numeric error code.
    pub code: Option<String>,

    /// The type of this error, such as `cancel` or `modify`.
    pub type_: Option<String>,

    /// The defined condition.
    pub condition: Option<QName>,

    /// A human-readable description.
    pub text: Option<String>,
}

impl fmt::Display for StanzaError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match &self.condition {
            Some(condition) => fmt.write_str(&condition.local)?,
            None => fmt.write_str("undefined-condition")?,
        }
        if let Some(text) = &self.text {
            write!(fmt, " ({})", text.trim())?;
        }
        Ok(())
    }
}

impl TryFrom<Element> for StanzaError {
    type Error = ProtocolError;

    fn try_from(elem: Element) -> Result<StanzaError, ProtocolError> {
        check_name(&elem, ns::JABBER_CLIENT, "error")?;
        let mut error = StanzaError {
            code: elem.attr("code").map(str::to_owned),
            type_: elem.attr("type").map(str::to_owned),
            ..Default::default()
        };
        for child in elem.children {
            if child.is(ns::XMPP_STANZAS, "text") {
                error.text = Some(child.text);
            } else if error.condition.is_none() {
                error.condition = Some(child.name);
            }
        }
        Ok(error)
    }
}

impl AsXml for StanzaError {
    fn write_xml(&self, w: &mut Encoder) -> Result<(), Error> {
        w.start(ns::JABBER_CLIENT, "error")?;
        w.opt_attr("code", self.code.as_deref());
        w.opt_attr("type", self.type_.as_deref());
        if let Some(condition) = &self.condition {
            w.start(&condition.ns, &condition.local)?;
            w.end()?;
        }
        if let Some(text) = &self.text {
            w.text_child(ns::XMPP_STANZAS, "text", text)?;
        }
        w.end()
    }
}
