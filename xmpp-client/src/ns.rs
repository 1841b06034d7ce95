// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Namespaces of the RFC 3920/3921 vocabulary understood by this crate.

/// RFC 3920: XML Streams
pub const STREAM: &str = "http://etherx.jabber.org/streams";

/// RFC 3920: STARTTLS negotiation
pub const TLS: &str = "urn:ietf:params:xml:ns:xmpp-tls";

/// RFC 3920: SASL negotiation
pub const SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";

/// RFC 3920: Resource binding
pub const BIND: &str = "urn:ietf:params:xml:ns:xmpp-bind";

/// RFC 3921: Session establishment
pub const SESSION: &str = "urn:ietf:params:xml:ns:xmpp-session";

/// RFC 3921: Default namespace of client streams
pub const JABBER_CLIENT: &str = "jabber:client";

/// RFC 3920: Stanza error conditions
pub const XMPP_STANZAS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";

/// RFC 3920: Stream error conditions
pub const XMPP_STREAMS: &str = "urn:ietf:params:xml:ns:xmpp-streams";

/// The namespace bound to the reserved `xml` prefix.
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
