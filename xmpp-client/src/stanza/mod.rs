// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Typed elements exchanged on a client stream.
//!
//! Decoding goes through [`Element`]: the dispatcher reads a complete
//! top-level element into a generic tree first, and the `TryFrom<Element>`
//! impls in this module turn it into a typed value. Anything a typed value
//! does not model is kept as [`Element`]s, raw markup included, so nothing
//! received is lost.
//!
//! Encoding goes through [`AsXml`] and an [`Encoder`], which writes
//! single-quoted attributes and tracks the namespaces in effect, so that
//! client stanzas leave out the `jabber:client` declaration the stream
//! already makes.

use rand::{thread_rng, Rng};

use crate::error::{Error, ProtocolError};
use crate::xmlstream::QName;

mod bind;
mod element;
mod encoder;
mod error;
mod iq;
mod message;
mod presence;
mod sasl;
mod stream;

pub use self::bind::Bind;
pub use self::element::Element;
pub use self::encoder::Encoder;
pub use self::error::StanzaError;
pub use self::iq::Iq;
pub use self::message::Message;
pub use self::presence::Presence;
pub use self::sasl::{Auth, SaslFailure};
pub(crate) use self::stream::mechanism_names;
pub use self::stream::{client_header, StartTls, StreamError, StreamFeatures, StreamHeader};

/// Serialisation to XML markup.
pub trait AsXml {
    /// Write `self` as the next element of `encoder`.
    fn write_xml(&self, encoder: &mut Encoder) -> Result<(), Error>;

    /// Serialise `self` as a top-level element of a client stream.
    fn to_xml(&self) -> Result<String, Error> {
        let mut encoder = Encoder::new();
        self.write_xml(&mut encoder)?;
        encoder.finish()
    }
}

pub(crate) fn check_name(elem: &Element, ns: &str, local: &str) -> Result<(), ProtocolError> {
    if elem.is(ns, local) {
        Ok(())
    } else {
        Err(unexpected(&elem.name))
    }
}

pub(crate) fn unexpected(name: &QName) -> ProtocolError {
    ProtocolError::UnexpectedElement {
        ns: name.ns.clone(),
        name: name.local.clone(),
    }
}

/// Any element the dispatcher can decode.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamElement {
    /// A stream header; the stream root stays open.
    StreamStart(StreamHeader),
    /// `<stream:features/>`
    Features(StreamFeatures),
    /// `<stream:error/>`
    StreamError(StreamError),
    /// STARTTLS offer or request.
    StartTls(StartTls),
    /// `<proceed xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>`
    TlsProceed,
    /// `<failure xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>`
    TlsFailure,
    /// Offered SASL mechanisms.
    Mechanisms(Vec<String>),
    /// SASL challenge with its base64 payload.
    Challenge(String),
    /// SASL response with its base64 payload.
    Response(String),
    /// SASL abort.
    Abort,
    /// SASL success, with the base64 additional data if any.
    Success(String),
    /// SASL failure.
    Failure(SaslFailure),
    /// Resource binding payload.
    Bind(Bind),
    /// `<message/>`
    Message(Message),
    /// `<presence/>`
    Presence(Presence),
    /// `<iq/>`
    Iq(Iq),
    /// A top-level `<error/>` in the client namespace.
    Error(StanzaError),
}

/// A stanza sent/received over the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Stanza {
    /// `<iq/>`
    Iq(Iq),
    /// `<message/>`
    Message(Message),
    /// `<presence/>`
    Presence(Presence),
}

impl Stanza {
    /// The `id` attribute, if any.
    pub fn id(&self) -> Option<&str> {
        match self {
            Stanza::Iq(st) => st.id.as_deref(),
            Stanza::Message(st) => st.id.as_deref(),
            Stanza::Presence(st) => st.id.as_deref(),
        }
    }

    fn id_mut(&mut self) -> &mut Option<String> {
        match self {
            Stanza::Iq(st) => &mut st.id,
            Stanza::Message(st) => &mut st.id,
            Stanza::Presence(st) => &mut st.id,
        }
    }

    /// Give the stanza a random 64-bit hexadecimal `id` unless it already
    /// has one, and return the `id`.
    pub fn ensure_id(&mut self) -> &str {
        self.id_mut()
            .get_or_insert_with(|| format!("{:016x}", thread_rng().gen::<u64>()))
    }
}

impl AsXml for Stanza {
    fn write_xml(&self, encoder: &mut Encoder) -> Result<(), Error> {
        match self {
            Stanza::Iq(st) => st.write_xml(encoder),
            Stanza::Message(st) => st.write_xml(encoder),
            Stanza::Presence(st) => st.write_xml(encoder),
        }
    }
}

macro_rules! stanza_variant {
    ($kind:ident) => {
        impl From<$kind> for Stanza {
            fn from(st: $kind) -> Stanza {
                Stanza::$kind(st)
            }
        }

        impl TryFrom<Stanza> for $kind {
            type Error = Stanza;

            fn try_from(stanza: Stanza) -> Result<$kind, Stanza> {
                match stanza {
                    Stanza::$kind(st) => Ok(st),
                    other => Err(other),
                }
            }
        }
    };
}

stanza_variant!(Iq);
stanza_variant!(Message);
stanza_variant!(Presence);
