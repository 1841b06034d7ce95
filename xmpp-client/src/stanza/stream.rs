// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;

use quick_xml::escape::escape;

use super::{check_name, Element};
use crate::error::ProtocolError;
use crate::ns;
use crate::xmlstream::{QName, StartTag};

/// The header of the client stream addressed to `domain`.
///
/// This is sent as-is both when the stream is first opened and when it is
/// restarted, including the XML declaration.
pub fn client_header(domain: &str) -> String {
    format!(
        "<?xml version='1.0'?>\n<stream:stream to='{}' xmlns='{}'\n xmlns:stream='{}' version='1.0'>\n",
        escape(domain),
        ns::JABBER_CLIENT,
        ns::STREAM,
    )
}

/// Attributes of a stream header sent by the peer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamHeader {
    /// The `from` attribute.
    pub from: Option<String>,

    /// The `to` attribute.
    pub to: Option<String>,

    /// The `id` attribute.
    pub id: Option<String>,

    /// The `version` attribute.
    pub version: Option<String>,

    /// The `xml:lang` attribute.
    pub lang: Option<String>,
}

impl From<&StartTag> for StreamHeader {
    fn from(tag: &StartTag) -> StreamHeader {
        let attr = |name: &str| tag.attr(name).map(str::to_owned);
        StreamHeader {
            from: attr("from"),
            to: attr("to"),
            id: attr("id"),
            version: attr("version"),
            lang: tag.attr_ns(ns::XML, "lang").map(str::to_owned),
        }
    }
}

/// The STARTTLS feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartTls {
    /// Whether the server refuses to continue without TLS.
    pub required: bool,
}

impl TryFrom<Element> for StartTls {
    type Error = ProtocolError;

    fn try_from(elem: Element) -> Result<StartTls, ProtocolError> {
        check_name(&elem, ns::TLS, "starttls")?;
        Ok(StartTls {
            required: elem.has_child(ns::TLS, "required"),
        })
    }
}

/// Features advertised by the server for the current stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamFeatures {
    /// STARTTLS offer, if any.
    pub starttls: Option<StartTls>,

    /// Offered SASL mechanisms, in the server's order.
    pub mechanisms: Vec<String>,

    /// Whether resource binding is offered.
    pub bind: bool,

    /// Whether session establishment is offered.
    pub session: bool,

    /// Any other feature.
    pub others: Vec<Element>,
}

impl StreamFeatures {
    /// Whether the server offers the SASL mechanism `name`.
    pub fn can_auth_with(&self, name: &str) -> bool {
        self.mechanisms.iter().any(|m| m == name)
    }
}

pub(crate) fn mechanism_names(elem: &Element) -> Vec<String> {
    elem.children
        .iter()
        .filter(|child| child.is(ns::SASL, "mechanism"))
        .map(|child| child.text.trim().to_owned())
        .collect()
}

impl TryFrom<Element> for StreamFeatures {
    type Error = ProtocolError;

    fn try_from(elem: Element) -> Result<StreamFeatures, ProtocolError> {
        check_name(&elem, ns::STREAM, "features")?;
        let mut features = StreamFeatures::default();
        for child in elem.children {
            match (child.name.ns.as_str(), child.name.local.as_str()) {
                (ns::TLS, "starttls") => features.starttls = Some(StartTls::try_from(child)?),
                (ns::SASL, "mechanisms") => features.mechanisms = mechanism_names(&child),
                (ns::BIND, "bind") => features.bind = true,
                (ns::SESSION, "session") => features.session = true,
                _ => features.others.push(child),
            }
        }
        Ok(features)
    }
}

/// A `<stream:error/>` sent by the peer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamError {
    /// The defined condition.
    pub condition: Option<QName>,

    /// Human-readable description.
    pub text: Option<String>,
}

impl fmt::Display for StreamError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match &self.condition {
            Some(condition) => fmt.write_str(&condition.local)?,
            None => fmt.write_str("undefined-condition")?,
        }
        if let Some(text) = &self.text {
            write!(fmt, " ({})", text)?;
        }
        Ok(())
    }
}

impl TryFrom<Element> for StreamError {
    type Error = ProtocolError;

    fn try_from(elem: Element) -> Result<StreamError, ProtocolError> {
        check_name(&elem, ns::STREAM, "error")?;
        let mut error = StreamError::default();
        for child in elem.children {
            if child.is(ns::XMPP_STREAMS, "text") {
                error.text = Some(child.text);
            } else if error.condition.is_none() {
                error.condition = Some(child.name);
            }
        }
        Ok(error)
    }
}
