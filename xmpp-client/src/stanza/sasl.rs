// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{check_name, AsXml, Element, Encoder};
use crate::error::{Error, ProtocolError};
use crate::ns;
use crate::xmlstream::QName;

/// The first step of the SASL process, selecting the mechanism and
/// sending the first part of the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auth {
    /// The mechanism used.
    pub mechanism: String,

    /// The content of the handshake, already base64-encoded. `None` sends
    /// an empty element.
    pub data: Option<String>,
}

impl AsXml for Auth {
    fn write_xml(&self, w: &mut Encoder) -> Result<(), Error> {
        w.start(ns::SASL, "auth")?;
        w.attr("mechanism", &self.mechanism);
        if let Some(data) = &self.data {
            w.text(data)?;
        }
        w.end()
    }
}

/// Sent by the server on SASL failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SaslFailure {
    /// One of the defined failure conditions.
    pub condition: Option<QName>,

    /// A human-readable explanation for the failure.
    pub text: Option<String>,
}

impl SaslFailure {
    /// Local name of the condition, `"undefined"` if there is none.
    pub fn reason(&self) -> &str {
        self.condition
            .as_ref()
            .map(|condition| condition.local.as_str())
            .unwrap_or("undefined")
    }
}

impl TryFrom<Element> for SaslFailure {
    type Error = ProtocolError;

    fn try_from(elem: Element) -> Result<SaslFailure, ProtocolError> {
        check_name(&elem, ns::SASL, "failure")?;
        let mut failure = SaslFailure::default();
        for child in elem.children {
            if child.is(ns::SASL, "text") {
                failure.text = Some(child.text);
            } else if failure.condition.is_none() {
                failure.condition = Some(child.name);
            }
        }
        Ok(failure)
    }
}
