// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Qualified-name dispatch of top-level stream elements.

use core::fmt;
use std::io;

use tokio::io::AsyncRead;

use crate::error::{Error, ProtocolError};
use crate::ns;
use crate::stanza::{mechanism_names, unexpected, Element, StreamElement, StreamHeader};
use crate::xmlstream::capture::{log_enabled, log_recv};
use crate::xmlstream::{Namespaces, QName, StartTag, Token, XmlReader};

/// Decode a complete top-level element according to its qualified name.
fn decode(elem: Element) -> Result<StreamElement, ProtocolError> {
    let name = elem.name.clone();
    Ok(match (name.ns.as_str(), name.local.as_str()) {
        (ns::STREAM, "features") => StreamElement::Features(elem.try_into()?),
        (ns::STREAM, "error") => StreamElement::StreamError(elem.try_into()?),
        (ns::TLS, "starttls") => StreamElement::StartTls(elem.try_into()?),
        (ns::TLS, "proceed") => StreamElement::TlsProceed,
        (ns::TLS, "failure") => StreamElement::TlsFailure,
        (ns::SASL, "mechanisms") => StreamElement::Mechanisms(mechanism_names(&elem)),
        (ns::SASL, "challenge") => StreamElement::Challenge(elem.text),
        (ns::SASL, "response") => StreamElement::Response(elem.text),
        (ns::SASL, "abort") => StreamElement::Abort,
        (ns::SASL, "success") => StreamElement::Success(elem.text),
        (ns::SASL, "failure") => StreamElement::Failure(elem.try_into()?),
        (ns::BIND, "bind") => StreamElement::Bind(elem.try_into()?),
        (ns::JABBER_CLIENT, "message") => StreamElement::Message(elem.try_into()?),
        (ns::JABBER_CLIENT, "presence") => StreamElement::Presence(elem.try_into()?),
        (ns::JABBER_CLIENT, "iq") => StreamElement::Iq(elem.try_into()?),
        (ns::JABBER_CLIENT, "error") => StreamElement::Error(elem.try_into()?),
        _ => return Err(unexpected(&name)),
    })
}

/// Reads whole elements off an [`XmlReader`] and decodes them.
#[derive(Debug)]
pub struct Dispatcher<R> {
    reader: XmlReader<R>,
}

impl<R> Dispatcher<R> {
    /// Create a dispatcher reading from `io`.
    pub fn new(io: R) -> Self {
        Self::from_reader(XmlReader::new(io))
    }

    /// Create a dispatcher on top of an existing token reader.
    pub fn from_reader(reader: XmlReader<R>) -> Self {
        Self { reader }
    }

    /// Access the token reader.
    pub fn reader(&self) -> &XmlReader<R> {
        &self.reader
    }

    /// Extract the token reader.
    pub fn into_reader(self) -> XmlReader<R> {
        self.reader
    }

    /// Swap the byte source, keeping all reader state.
    ///
    /// See [`XmlReader::replace_io`].
    pub fn replace_io<R2>(self, io: R2) -> (Dispatcher<R2>, R) {
        let (reader, old) = self.reader.replace_io(io);
        (Dispatcher::from_reader(reader), old)
    }
}

impl<R: AsyncRead + Unpin> Dispatcher<R> {
    /// Skip forward to the next start tag.
    ///
    /// Character data and end tags in between are dropped. Fails with
    /// [`Error::Disconnected`] if the byte source ends or the peer closes
    /// its stream root first.
    pub async fn next_start(&mut self) -> Result<StartTag, Error> {
        loop {
            match self.reader.next_token().await? {
                Some(Token::Start(start)) => return Ok(start),
                Some(Token::End(end)) if end.name.is(ns::STREAM, "stream") => {
                    log::debug!("Peer closed its stream");
                    return Err(Error::Disconnected);
                }
                Some(Token::End(_)) | Some(Token::Text(_)) => (),
                None => return Err(Error::Disconnected),
            }
        }
    }

    /// Read the rest of the element opened by `root` into a tree.
    ///
    /// The caller must keep the bytes of the element retained.
    async fn read_tree(&mut self, root: StartTag) -> Result<Element, Error> {
        // Called right after the start tag, while its scope is innermost.
        let open = |tag: StartTag, namespaces: Namespaces| {
            let elem = Element {
                name: tag.name,
                attrs: tag.attrs,
                namespaces,
                ..Default::default()
            };
            (elem, tag.span.end)
        };
        let mut stack = vec![open(root, self.reader.namespaces())];
        loop {
            let token = match self.reader.next_token().await? {
                Some(token) => token,
                None => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended inside an element",
                    )))
                }
            };
            match token {
                Token::Start(tag) => stack.push(open(tag, self.reader.namespaces())),
                Token::Text(text) => {
                    if let Some((elem, _)) = stack.last_mut() {
                        elem.text.push_str(&text);
                    }
                }
                Token::End(tag) => {
                    let (mut elem, content_start) = match stack.pop() {
                        Some(open) => open,
                        None => return Err(ProtocolError::UnbalancedEndTag.into()),
                    };
                    elem.inner_xml = self.reader.slice(content_start..tag.span.start)?.to_owned();
                    match stack.last_mut() {
                        Some((parent, _)) => parent.children.push(elem),
                        None => return Ok(elem),
                    }
                }
            }
        }
    }

    /// Read and decode the next top-level element.
    ///
    /// A stream header is returned as soon as its start tag has been read,
    /// as [`StreamElement::StreamStart`]. Any other element is read up to
    /// its end tag. If its qualified name is unknown, it is consumed
    /// entirely and the call fails with
    /// [`ProtocolError::UnexpectedElement`], so the following element can
    /// still be read.
    pub async fn next_element(&mut self) -> Result<(QName, StreamElement), Error> {
        let start = self.next_start().await?;
        let name = start.name.clone();

        if name.is(ns::STREAM, "stream") {
            if log_enabled() {
                if let Some(raw) = self.reader.slice_bytes(start.span.clone()) {
                    log_recv(None, raw);
                }
            }
            let header = StreamHeader::from(&start);
            return Ok((name, StreamElement::StreamStart(header)));
        }

        let from = start.span.start;
        self.reader.retain_from(from);
        let result = match self.read_tree(start).await {
            Ok(elem) => decode(elem).map_err(Error::from),
            Err(e) => Err(e),
        };
        if log_enabled() {
            let raw = self
                .reader
                .slice_bytes(from..self.reader.position())
                .unwrap_or_default();
            match &result {
                Ok(_) => log_recv(None, raw),
                Err(e) => log_recv(Some(e as &dyn fmt::Display), raw),
            }
        }
        self.reader.release();
        result.map(|elem| (name, elem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::stanza::{
        AsXml, Bind, Iq, Message, Presence, SaslFailure, StanzaError, StartTls,
    };

    const HEADER: &str = "<stream:stream xmlns='jabber:client' \
        xmlns:stream='http://etherx.jabber.org/streams' version='1.0' id='s1'>";

    fn dispatcher(data: &str) -> Dispatcher<&[u8]> {
        Dispatcher::new(data.as_bytes())
    }

    /// Read the header, then one element.
    async fn decode_after_header(body: &str) -> Result<(QName, StreamElement), Error> {
        let doc = format!("{}{}", HEADER, body);
        let mut dispatcher = dispatcher(&doc);
        match dispatcher.next_element().await? {
            (_, StreamElement::StreamStart(header)) => assert_eq!(header.id.as_deref(), Some("s1")),
            other => panic!("unexpected element: {:?}", other),
        }
        dispatcher.next_element().await
    }

    /// Drop what only a received element has, so it compares equal to
    /// the one it was encoded from.
    fn forget_raw(elem: &mut StreamElement) {
        let payloads = match elem {
            StreamElement::Message(message) => &mut message.other_elem,
            StreamElement::Presence(presence) => &mut presence.other_elem,
            StreamElement::Iq(iq) => &mut iq.other_elem,
            _ => return,
        };
        payloads.iter_mut().for_each(Element::forget_raw);
    }

    async fn round_trip(value: StreamElement, xml: String) {
        let (_, mut decoded) = decode_after_header(&xml).await.unwrap();
        forget_raw(&mut decoded);
        assert_eq!(decoded, value);
    }

    async fn decode_message(body: &str) -> Message {
        match decode_after_header(body).await.unwrap() {
            (_, StreamElement::Message(message)) => message,
            other => panic!("unexpected element: {:?}", other),
        }
    }

    const GCM_ERROR: &str = "<message xmlns=\"jabber:client\" id=\"3\" type=\"error\" to=\"123456789@gcm.googleapis.com/ABC\">
\t<gcm xmlns=\"google:mobile:data\">
\t\t{\"random\": \"&lt;text&gt;\"}
\t</gcm>
\t<error code=\"400\" type=\"modify\">
\t\t<bad-request xmlns=\"urn:ietf:params:xml:ns:xmpp-stanzas\"/>
\t\t<text xmlns=\"urn:ietf:params:xml:ns:xmpp-stanzas\">
\t\t\tInvalidJson: JSON_PARSING_ERROR : Missing Required Field: message_id\\n
\t\t</text>
\t</error>
</message>";

    #[tokio::test]
    async fn test_message_error_keeps_raw_children() {
        let mut dispatcher = dispatcher(GCM_ERROR);
        let (name, elem) = dispatcher.next_element().await.unwrap();
        assert_eq!(name, QName::new(ns::JABBER_CLIENT, "message"));
        let message = match elem {
            StreamElement::Message(message) => message,
            other => panic!("unexpected element: {:?}", other),
        };
        assert_eq!(message.type_.as_deref(), Some("error"));
        assert_eq!(message.id.as_deref(), Some("3"));
        assert_eq!(message.to.as_deref(), Some("123456789@gcm.googleapis.com/ABC"));
        assert_eq!(
            message.other_texts(),
            vec![
                "\n\t\t{\"random\": \"<text>\"}\n\t",
                "\n\t\t\n\t\t\n\t",
            ]
        );

        assert_eq!(message.other_elem.len(), 2);
        let gcm = &message.other_elem[0];
        assert_eq!(gcm.name, QName::new("google:mobile:data", "gcm"));
        assert!(gcm.attrs.is_empty());
        assert_eq!(gcm.inner_xml, "\n\t\t{\"random\": \"&lt;text&gt;\"}\n\t");

        let error = &message.other_elem[1];
        assert_eq!(error.name, QName::new(ns::JABBER_CLIENT, "error"));
        assert_eq!(error.attr("code"), Some("400"));
        assert_eq!(error.attr("type"), Some("modify"));
        assert_eq!(
            error.inner_xml,
            "
\t\t<bad-request xmlns=\"urn:ietf:params:xml:ns:xmpp-stanzas\"/>
\t\t<text xmlns=\"urn:ietf:params:xml:ns:xmpp-stanzas\">
\t\t\tInvalidJson: JSON_PARSING_ERROR : Missing Required Field: message_id\\n
\t\t</text>
\t"
        );
        assert_eq!(error.children.len(), 2);
        assert!(error.children[0].is(ns::XMPP_STANZAS, "bad-request"));
        assert_eq!(error.children[0].inner_xml, "");

        let parsed = StanzaError::try_from(error.clone()).unwrap();
        assert_eq!(
            parsed.condition,
            Some(QName::new(ns::XMPP_STANZAS, "bad-request"))
        );
    }

    #[tokio::test]
    async fn test_unknown_names_are_reported() {
        let cases = [
            ("<foo xmlns='jabber:client'/>", "jabber:client", "foo"),
            ("<message xmlns='urn:example'><body/></message>", "urn:example", "message"),
            ("<stream:features2/>", ns::STREAM, "features2"),
            ("<a:b xmlns:a='jabber:client:x'>text</a:b>", "jabber:client:x", "b"),
            ("<proceed xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>", ns::SASL, "proceed"),
        ];
        for (body, want_ns, want_name) in cases {
            match decode_after_header(body).await {
                Err(Error::Protocol(ProtocolError::UnexpectedElement { ns, name })) => {
                    assert_eq!(ns, want_ns);
                    assert_eq!(name, want_name);
                }
                other => panic!("unexpected result for {}: {:?}", body, other),
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_element_is_consumed() {
        let doc = format!(
            "{}<x xmlns='urn:x'><message xmlns='jabber:client'/></x><presence/>",
            HEADER
        );
        let mut dispatcher = dispatcher(&doc);
        dispatcher.next_element().await.unwrap();
        assert!(dispatcher.next_element().await.is_err());
        match dispatcher.next_element().await.unwrap() {
            (_, StreamElement::Presence(_)) => (),
            other => panic!("unexpected element: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_restart_without_closing_root() {
        let doc = format!(
            "<?xml version='1.0'?>{}\
             <stream:features><mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
             <mechanism>PLAIN</mechanism></mechanisms></stream:features>\
             <success xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>\
             <?xml version='1.0'?>{}\
             <stream:features><bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/></stream:features>",
            HEADER, HEADER
        );
        let mut dispatcher = dispatcher(&doc);
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(dispatcher.next_element().await.unwrap().1);
        }
        assert!(matches!(seen[0], StreamElement::StreamStart(_)));
        match &seen[1] {
            StreamElement::Features(f) => assert_eq!(f.mechanisms, vec!["PLAIN"]),
            other => panic!("unexpected element: {:?}", other),
        }
        assert_eq!(seen[2], StreamElement::Success(String::new()));
        assert!(matches!(seen[3], StreamElement::StreamStart(_)));
        match &seen[4] {
            StreamElement::Features(f) => assert!(f.bind),
            other => panic!("unexpected element: {:?}", other),
        }
        assert!(matches!(
            dispatcher.next_element().await,
            Err(Error::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_empty_input_is_disconnect() {
        assert!(matches!(
            dispatcher("").next_element().await,
            Err(Error::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_footer_is_disconnect() {
        let doc = format!("{}<presence/></stream:stream>", HEADER);
        let mut dispatcher = dispatcher(&doc);
        dispatcher.next_element().await.unwrap();
        dispatcher.next_element().await.unwrap();
        assert!(matches!(
            dispatcher.next_element().await,
            Err(Error::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_truncated_element() {
        match decode_after_header("<message><body>hel").await {
            Err(Error::Protocol(ProtocolError::Xml(_))) | Err(Error::Io(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
        match decode_after_header("<message><body>hello</body>").await {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sasl_and_tls_elements() {
        let cases = vec![
            (
                "<challenge xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>cmVhbG09</challenge>",
                StreamElement::Challenge("cmVhbG09".to_owned()),
            ),
            (
                "<abort xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>",
                StreamElement::Abort,
            ),
            (
                "<failure xmlns='urn:ietf:params:xml:ns:xmpp-sasl'><not-authorized/></failure>",
                StreamElement::Failure(SaslFailure {
                    condition: Some(QName::new(ns::SASL, "not-authorized")),
                    text: None,
                }),
            ),
            (
                "<proceed xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>",
                StreamElement::TlsProceed,
            ),
            (
                "<failure xmlns='urn:ietf:params:xml:ns:xmpp-tls'/>",
                StreamElement::TlsFailure,
            ),
            (
                "<starttls xmlns='urn:ietf:params:xml:ns:xmpp-tls'><required/></starttls>",
                StreamElement::StartTls(StartTls { required: true }),
            ),
            (
                "<mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
                 <mechanism>SCRAM-SHA-1</mechanism><mechanism>PLAIN</mechanism></mechanisms>",
                StreamElement::Mechanisms(vec!["SCRAM-SHA-1".to_owned(), "PLAIN".to_owned()]),
            ),
            (
                "<stream:error><conflict xmlns='urn:ietf:params:xml:ns:xmpp-streams'/></stream:error>",
                StreamElement::StreamError(crate::stanza::StreamError {
                    condition: Some(QName::new(ns::XMPP_STREAMS, "conflict")),
                    text: None,
                }),
            ),
        ];
        for (body, want) in cases {
            let (_, got) = decode_after_header(body).await.unwrap();
            assert_eq!(got, want, "decoding {}", body);
        }
    }

    #[tokio::test]
    async fn test_message_round_trip() {
        let mut message = Message::chat(
            "juliet@capulet.lit/balcony",
            "Art thou not Romeo, & a Montague?",
        );
        message.from = Some("romeo@montague.lit/orchard".to_owned());
        message.id = Some("m1".to_owned());
        message.lang = Some("en".to_owned());
        message.subject = Some("<question>".to_owned());
        message.thread = Some("e0ffe42b28561960c6b12b944a092794b9683a38".to_owned());
        message.other_elem.push(
            Element::new(QName::new("http://jabber.org/protocol/chatstates", "active")),
        );
        message.other_elem.push(
            Element::new(QName::new("urn:example:payload", "data"))
                .with_attr("kind", "a'b")
                .with_text("1 < 2")
                .with_child(Element::new(QName::new("urn:example:payload", "inner")).with_text("x")),
        );
        let xml = message.to_xml().unwrap();
        round_trip(StreamElement::Message(message), xml).await;
    }

    #[tokio::test]
    async fn test_presence_round_trip() {
        let presence = Presence {
            from: Some("romeo@montague.lit/orchard".to_owned()),
            to: Some("juliet@capulet.lit".to_owned()),
            id: Some("p1".to_owned()),
            type_: Some("error".to_owned()),
            lang: Some("en".to_owned()),
            show: Some("dnd".to_owned()),
            status: Some("Wooing Juliet".to_owned()),
            priority: Some("5".to_owned()),
            error: Some(StanzaError {
                code: Some("404".to_owned()),
                type_: Some("cancel".to_owned()),
                condition: Some(QName::new(ns::XMPP_STANZAS, "item-not-found")),
                text: Some("Gone".to_owned()),
            }),
            other_elem: vec![Element::new(QName::new("vcard-temp:x:update", "x"))],
        };
        let xml = presence.to_xml().unwrap();
        round_trip(StreamElement::Presence(presence), xml).await;
    }

    #[tokio::test]
    async fn test_iq_round_trip() {
        let iq = Iq {
            from: Some("capulet.lit".to_owned()),
            to: Some("juliet@capulet.lit/balcony".to_owned()),
            id: Some("b1".to_owned()),
            type_: Some("result".to_owned()),
            bind: Some(Bind {
                resource: None,
                jid: Some("juliet@capulet.lit/balcony".to_owned()),
            }),
            error: None,
            other_elem: vec![],
        };
        let xml = iq.to_xml().unwrap();
        round_trip(StreamElement::Iq(iq), xml).await;
    }

    #[tokio::test]
    async fn test_client_child_of_foreign_payload_round_trip() {
        let message = Message {
            id: Some("w1".to_owned()),
            other_elem: vec![Element::new(QName::new("urn:x", "wrap"))
                .with_child(Element::new(QName::new(ns::JABBER_CLIENT, "body")).with_text("hi"))],
            ..Default::default()
        };
        let xml = message.to_xml().unwrap();
        let decoded = decode_message(&xml).await;
        let wrap = &decoded.other_elem[0];
        assert!(wrap.is("urn:x", "wrap"));
        assert!(wrap.has_child(ns::JABBER_CLIENT, "body"));
        round_trip(StreamElement::Message(message), xml).await;
    }

    #[tokio::test]
    async fn test_received_payload_keeps_outer_prefixes() {
        let received = decode_message(
            "<message xmlns:e='urn:e'><x xmlns='urn:x'><e:y/></x>\
             <e:z><body>hi</body></e:z></message>",
        )
        .await;
        assert_eq!(received.other_elem[0].inner_xml, "<e:y/>");

        let xml = received.to_xml().unwrap();
        assert_eq!(
            xml,
            "<message><x xmlns='urn:x' xmlns:e='urn:e'><e:y/></x>\
             <e:z xmlns:e='urn:e'><body>hi</body></e:z></message>"
        );
        let again = decode_message(&xml).await;
        let x = &again.other_elem[0];
        assert!(x.is("urn:x", "x"));
        assert!(x.has_child("urn:e", "y"));
        let z = &again.other_elem[1];
        assert!(z.is("urn:e", "z"));
        assert!(z.has_child(ns::JABBER_CLIENT, "body"));
    }

    #[tokio::test]
    async fn test_bad_markup_is_an_error() {
        match decode_after_header("<!foo><presence/>").await {
            Err(Error::Protocol(ProtocolError::Xml(_))) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_replace_io_continues() {
        let doc = format!("{}<presence", HEADER);
        let mut dispatcher = dispatcher(&doc);
        dispatcher.next_element().await.unwrap();
        let (mut dispatcher, _) = dispatcher.replace_io(&b" type='unavailable'/>"[..]);
        match dispatcher.next_element().await.unwrap() {
            (_, StreamElement::Presence(p)) => assert_eq!(p.type_.as_deref(), Some("unavailable")),
            other => panic!("unexpected element: {:?}", other),
        }
    }
}
