// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::ops::ControlFlow;

use jid::FullJid;
use tokio::io::{AsyncRead, AsyncWrite};

use super::auth::{auth_request, select_mechanism};
use super::bind;
use super::config::{Config, Credentials};
use crate::dispatch::Dispatcher;
use crate::error::{AuthError, Error, ProtocolError, SecurityError};
use crate::ns;
use crate::stanza::{client_header, unexpected, StreamElement, StreamFeatures};
use crate::xmlstream::{QName, StanzaWriter};

/// Turn an element received where something else was required into the
/// matching error.
pub(super) fn unexpected_reply(name: &QName, elem: StreamElement) -> Error {
    match elem {
        StreamElement::StreamError(e) => Error::Stream(e),
        _ => unexpected(name).into(),
    }
}

#[derive(Debug)]
enum NegotiationState {
    /// Write the stream header; `authenticated` is set for the restart.
    SendHeader { authenticated: bool },
    AwaitStreamRoot { authenticated: bool },
    AwaitFeatures,
    Authenticate,
    AwaitAuthResult,
    AwaitFeaturesAfterAuth,
    SendBind,
    AwaitBindResult,
    SendPresence { jid: FullJid },
}

/// Outcome of a successful negotiation.
#[derive(Debug)]
pub(crate) struct Negotiated {
    pub jid: FullJid,
    pub features: StreamFeatures,
}

struct Negotiation<'a, R, W> {
    dispatcher: &'a mut Dispatcher<R>,
    writer: &'a mut StanzaWriter<W>,
    credentials: &'a Credentials,
    config: &'a Config,
    local: &'a str,
    domain: &'a str,
    secure: bool,
    features: StreamFeatures,
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Negotiation<'_, R, W> {
    async fn advance(
        &mut self,
        state: NegotiationState,
    ) -> Result<ControlFlow<FullJid, NegotiationState>, Error> {
        use NegotiationState::*;

        let next = match state {
            SendHeader { authenticated } => {
                self.writer.send_raw(&client_header(self.domain)).await?;
                AwaitStreamRoot { authenticated }
            }
            AwaitStreamRoot { authenticated } => {
                let start = self.dispatcher.next_start().await?;
                if !start.name.is(ns::STREAM, "stream") {
                    return Err(ProtocolError::InvalidStreamStart {
                        ns: start.name.ns,
                        name: start.name.local,
                    }
                    .into());
                }
                if authenticated {
                    AwaitFeaturesAfterAuth
                } else {
                    AwaitFeatures
                }
            }
            AwaitFeatures => match self.dispatcher.next_element().await? {
                (_, StreamElement::Features(features)) => {
                    self.features = features;
                    Authenticate
                }
                (name, elem) => return Err(unexpected_reply(&name, elem)),
            },
            Authenticate => {
                let prefer_external = self.config.prefer_external || self.credentials.is_external();
                let mechanism = select_mechanism(&self.features.mechanisms, prefer_external)?;
                if !self.secure && !self.config.allow_insecure_auth {
                    return Err(SecurityError::UnencryptedAuth.into());
                }
                let auth = auth_request(mechanism, self.credentials, self.local)?;
                log::debug!("Authenticating with SASL {}", mechanism.name());
                self.writer.send_secret(&auth).await?;
                AwaitAuthResult
            }
            AwaitAuthResult => match self.dispatcher.next_element().await? {
                (_, StreamElement::Success(_)) => SendHeader {
                    authenticated: true,
                },
                (_, StreamElement::Failure(failure)) => {
                    return Err(AuthError::Fail(failure.reason().to_owned()).into())
                }
                (name, elem) => return Err(unexpected_reply(&name, elem)),
            },
            AwaitFeaturesAfterAuth => {
                self.features = match self.dispatcher.next_element().await {
                    Ok((_, StreamElement::Features(features))) => features,
                    Ok((_, StreamElement::StreamError(e))) => return Err(Error::Stream(e)),
                    Ok((name, _)) => {
                        log::warn!(
                            "Expected stream features after authentication but got {}, assuming none",
                            name
                        );
                        StreamFeatures::default()
                    }
                    Err(Error::Protocol(e)) => {
                        log::warn!(
                            "Ignoring unreadable stream features after authentication: {}",
                            e
                        );
                        StreamFeatures::default()
                    }
                    Err(e) => return Err(e),
                };
                SendBind
            }
            SendBind => {
                self.writer.send(&bind::request()).await?;
                AwaitBindResult
            }
            AwaitBindResult => {
                let (name, elem) = self.dispatcher.next_element().await?;
                let jid = bind::bound_jid(name, elem)?;
                SendPresence { jid }
            }
            SendPresence { jid } => {
                let presence = self.config.initial_presence.to_presence();
                self.writer.send(&presence).await?;
                return Ok(ControlFlow::Break(jid));
            }
        };
        Ok(ControlFlow::Continue(next))
    }
}

/// Run the whole client handshake over `dispatcher` and `writer`.
///
/// Nothing is written if the identity in `credentials` is malformed.
/// Any failure is final: the stream is left in an undefined state and must
/// be dropped.
pub(crate) async fn negotiate<R, W>(
    dispatcher: &mut Dispatcher<R>,
    writer: &mut StanzaWriter<W>,
    credentials: &Credentials,
    config: &Config,
    secure: bool,
) -> Result<Negotiated, Error>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (local, domain) = credentials.split_identity()?;
    let mut negotiation = Negotiation {
        dispatcher,
        writer,
        credentials,
        config,
        local,
        domain,
        secure,
        features: StreamFeatures::default(),
    };
    let mut state = NegotiationState::SendHeader {
        authenticated: false,
    };
    loop {
        log::debug!("Negotiation: {:?}", state);
        match negotiation.advance(state).await? {
            ControlFlow::Continue(next) => state = next,
            ControlFlow::Break(jid) => {
                log::debug!("Session bound to {}", jid);
                return Ok(Negotiated {
                    jid,
                    features: negotiation.features,
                });
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ConfigError;

    pub(crate) const SERVER_HEADER: &str = "<?xml version='1.0'?>\
        <stream:stream xmlns='jabber:client' xmlns:stream='http://etherx.jabber.org/streams' \
        id='s1' from='capulet.lit' version='1.0'>";
    pub(crate) const FEATURES: &str = "<stream:features>\
        <mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
        <mechanism>EXTERNAL</mechanism><mechanism>PLAIN</mechanism><mechanism>X-OAUTH2</mechanism>\
        </mechanisms></stream:features>";
    pub(crate) const SUCCESS: &str = "<success xmlns='urn:ietf:params:xml:ns:xmpp-sasl'/>";
    pub(crate) const FEATURES_AFTER_AUTH: &str = "<stream:features>\
        <bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/>\
        <session xmlns='urn:ietf:params:xml:ns:xmpp-session'/></stream:features>";
    pub(crate) const BOUND: &str = "<iq type='result' id='x'>\
        <bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'><jid>juliet@capulet.lit/balcony</jid></bind></iq>";

    pub(crate) const PLAIN_AUTH: &str =
        "<auth xmlns='urn:ietf:params:xml:ns:xmpp-sasl' mechanism='PLAIN'>AGp1bGlldAByMG0zMG15cjBtMzA=</auth>";
    pub(crate) const BIND_REQUEST: &str =
        "<iq type='set' id='x'><bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/></iq>";
    pub(crate) const PRESENCE: &str =
        "<presence xml:lang='en'><show>chat</show><status>Online</status></presence>";

    /// Everything a well-behaved server sends for a full handshake.
    pub(crate) fn server_script() -> String {
        [
            SERVER_HEADER,
            FEATURES,
            SUCCESS,
            SERVER_HEADER,
            FEATURES_AFTER_AUTH,
            BOUND,
        ]
        .concat()
    }

    pub(crate) fn juliet() -> Credentials {
        Credentials::password("juliet@capulet.lit", "r0m30myr0m30")
    }

    async fn run(
        script: &str,
        credentials: &Credentials,
        config: &Config,
        secure: bool,
    ) -> (Result<Negotiated, Error>, String) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut dispatcher = Dispatcher::new(script.as_bytes());
        let mut writer = StanzaWriter::new(Vec::new());
        let result = negotiate(&mut dispatcher, &mut writer, credentials, config, secure).await;
        let written = String::from_utf8(writer.get_ref().clone()).unwrap();
        (result, written)
    }

    #[tokio::test]
    async fn full_handshake() {
        let (result, written) = run(&server_script(), &juliet(), &Config::default(), true).await;
        let negotiated = result.unwrap();
        assert_eq!(negotiated.jid.to_string(), "juliet@capulet.lit/balcony");
        assert!(negotiated.features.bind);
        assert!(negotiated.features.session);
        assert!(negotiated.features.mechanisms.is_empty());

        let header = client_header("capulet.lit");
        assert_eq!(
            written,
            [
                header.as_str(),
                PLAIN_AUTH,
                header.as_str(),
                BIND_REQUEST,
                PRESENCE
            ]
            .concat()
        );
    }

    #[tokio::test]
    async fn external_when_preferred() {
        let config = Config::default().prefer_external(true);
        let (result, written) = run(&server_script(), &juliet(), &config, true).await;
        assert!(result.is_ok());
        assert!(written.contains(
            "<auth xmlns='urn:ietf:params:xml:ns:xmpp-sasl' mechanism='EXTERNAL'/>"
        ));
        assert!(!written.contains("PLAIN"));
    }

    #[tokio::test]
    async fn external_credentials_imply_preference() {
        let creds = Credentials::external("juliet@capulet.lit");
        let (result, written) = run(&server_script(), &creds, &Config::default(), true).await;
        assert!(result.is_ok());
        assert!(written.contains("mechanism='EXTERNAL'/>"));
    }

    #[tokio::test]
    async fn refuses_plaintext_auth() {
        let (result, written) = run(&server_script(), &juliet(), &Config::default(), false).await;
        match result {
            Err(Error::Security(SecurityError::UnencryptedAuth)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(written, client_header("capulet.lit"));
    }

    #[tokio::test]
    async fn plaintext_auth_when_allowed() {
        let config = Config::default().allow_insecure_auth(true);
        let (result, written) = run(&server_script(), &juliet(), &config, false).await;
        assert!(result.is_ok());
        assert!(written.contains(PLAIN_AUTH));
    }

    #[tokio::test]
    async fn no_usable_mechanism() {
        let script = [
            SERVER_HEADER,
            "<stream:features><mechanisms xmlns='urn:ietf:params:xml:ns:xmpp-sasl'>\
             <mechanism>X-OAUTH2</mechanism></mechanisms></stream:features>",
        ]
        .concat();
        let (result, written) = run(&script, &juliet(), &Config::default(), true).await;
        match result {
            Err(Error::Auth(AuthError::NoMechanism(offered))) => {
                assert_eq!(offered, vec!["X-OAUTH2".to_owned()])
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(written, client_header("capulet.lit"));
    }

    #[tokio::test]
    async fn auth_failure_reason() {
        let script = [
            SERVER_HEADER,
            FEATURES,
            "<failure xmlns='urn:ietf:params:xml:ns:xmpp-sasl'><not-authorized/>\
             <text>Wrong password</text></failure>",
        ]
        .concat();
        let (result, _) = run(&script, &juliet(), &Config::default(), true).await;
        match result {
            Err(Error::Auth(AuthError::Fail(reason))) => assert_eq!(reason, "not-authorized"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn identity_without_domain() {
        let creds = Credentials::password("juliet", "pw");
        let (result, written) = run(&server_script(), &creds, &Config::default(), true).await;
        match result {
            Err(Error::Config(ConfigError::InvalidIdentity(id))) => assert_eq!(id, "juliet"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(written.is_empty());
    }

    #[tokio::test]
    async fn wrong_stream_root() {
        let (result, _) = run("<html xmlns='urn:x'>", &juliet(), &Config::default(), true).await;
        match result {
            Err(Error::Protocol(ProtocolError::InvalidStreamStart { ns, name })) => {
                assert_eq!(ns, "urn:x");
                assert_eq!(name, "html");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn stream_error_instead_of_features() {
        let script = [
            SERVER_HEADER,
            "<stream:error><host-unknown xmlns='urn:ietf:params:xml:ns:xmpp-streams'/></stream:error>",
        ]
        .concat();
        let (result, _) = run(&script, &juliet(), &Config::default(), true).await;
        match result {
            Err(Error::Stream(e)) => {
                assert_eq!(e.condition.unwrap().local, "host-unknown")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn first_features_are_strict() {
        let script = [SERVER_HEADER, "<stream:nonsense/>"].concat();
        let (result, _) = run(&script, &juliet(), &Config::default(), true).await;
        match result {
            Err(Error::Protocol(ProtocolError::UnexpectedElement { ns, name })) => {
                assert_eq!(ns, "http://etherx.jabber.org/streams");
                assert_eq!(name, "nonsense");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreadable_features_after_auth_tolerated() {
        let script = [
            SERVER_HEADER,
            FEATURES,
            SUCCESS,
            SERVER_HEADER,
            "<stream:nonsense><bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/></stream:nonsense>",
            BOUND,
        ]
        .concat();
        let (result, written) = run(&script, &juliet(), &Config::default(), true).await;
        let negotiated = result.unwrap();
        assert_eq!(negotiated.features, StreamFeatures::default());
        assert!(written.ends_with(&[BIND_REQUEST, PRESENCE].concat()));
    }

    #[tokio::test]
    async fn bind_result_without_jid() {
        let script = [
            SERVER_HEADER,
            FEATURES,
            SUCCESS,
            SERVER_HEADER,
            FEATURES_AFTER_AUTH,
            "<iq type='result' id='x'><bind xmlns='urn:ietf:params:xml:ns:xmpp-bind'/></iq>",
        ]
        .concat();
        let (result, written) = run(&script, &juliet(), &Config::default(), true).await;
        match result {
            Err(Error::Protocol(ProtocolError::InvalidBindResponse)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!written.contains("<presence"));
    }

    #[tokio::test]
    async fn server_hangs_up_during_auth() {
        let script = [SERVER_HEADER, FEATURES].concat();
        let (result, _) = run(&script, &juliet(), &Config::default(), true).await;
        assert!(matches!(result, Err(Error::Disconnected)));
    }
}
