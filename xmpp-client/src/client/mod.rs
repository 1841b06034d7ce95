// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An authenticated, bound client session.

use futures::Stream;
use jid::FullJid;
use tokio::io::{split, ReadHalf, WriteHalf};

use crate::connect::Transport;
use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::stanza::{AsXml, Stanza, StreamElement, StreamFeatures};
use crate::xmlstream::{QName, StanzaWriter};

pub mod auth;
mod bind;
mod config;
mod login;

pub use config::{Config, Credentials, InitialPresence, Secret};

/// A client session which is past negotiation.
///
/// Reading and writing happen on independent halves of the transport. Use
/// [`Session::split`] to drive them from separate tasks.
#[derive(Debug)]
pub struct Session<T> {
    reader: SessionReader<T>,
    writer: SessionWriter<T>,
    jid: FullJid,
    features: StreamFeatures,
    secure: bool,
}

impl<T: Transport> Session<T> {
    /// Negotiate a session over `transport`.
    ///
    /// This opens the stream, authenticates, restarts the stream, binds a
    /// resource and announces the initial presence. If any of it fails, the
    /// transport is dropped and the error returned.
    pub async fn connect(
        transport: T,
        credentials: &Credentials,
        config: &Config,
    ) -> Result<Self, Error> {
        let secure = transport.is_secure();
        let (read_half, write_half) = split(transport);
        let mut dispatcher = Dispatcher::new(read_half);
        let mut writer = StanzaWriter::new(write_half);
        let negotiated =
            login::negotiate(&mut dispatcher, &mut writer, credentials, config, secure).await?;
        Ok(Session {
            reader: SessionReader { dispatcher },
            writer: SessionWriter { writer },
            jid: negotiated.jid,
            features: negotiated.features,
            secure,
        })
    }

    /// The full JID the server bound this session to.
    pub fn jid(&self) -> &FullJid {
        &self.jid
    }

    /// The stream features received after authentication.
    pub fn features(&self) -> &StreamFeatures {
        &self.features
    }

    /// Whether the transport is encrypted.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Wait for the next message or presence. See [`SessionReader::recv`].
    pub async fn recv(&mut self) -> Result<Stanza, Error> {
        self.reader.recv().await
    }

    /// Read the next top-level element, whatever it is.
    pub async fn next_element(&mut self) -> Result<(QName, StreamElement), Error> {
        self.reader.next_element().await
    }

    /// Send a stanza. See [`SessionWriter::send`].
    pub async fn send<S: AsXml + ?Sized>(&mut self, stanza: &S) -> Result<(), Error> {
        self.writer.send(stanza).await
    }

    /// Close the stream. See [`SessionWriter::close`].
    pub async fn close(&mut self) -> Result<(), Error> {
        self.writer.close().await
    }

    /// Split into independent reading and writing halves.
    pub fn split(self) -> (SessionReader<T>, SessionWriter<T>) {
        (self.reader, self.writer)
    }
}

/// Reading half of a [`Session`].
#[derive(Debug)]
pub struct SessionReader<T> {
    dispatcher: Dispatcher<ReadHalf<T>>,
}

impl<T: Transport> SessionReader<T> {
    /// Wait for the next message or presence.
    ///
    /// Other elements are dropped. A `<stream:error/>` from the server is
    /// reported as [`Error::Stream`], and the server closing the stream as
    /// [`Error::Disconnected`]. After any error, the session must be closed.
    pub async fn recv(&mut self) -> Result<Stanza, Error> {
        loop {
            match self.dispatcher.next_element().await? {
                (_, StreamElement::Message(message)) => return Ok(message.into()),
                (_, StreamElement::Presence(presence)) => return Ok(presence.into()),
                (_, StreamElement::StreamError(e)) => return Err(Error::Stream(e)),
                (name, _) => log::debug!("Dropping {} received outside negotiation", name),
            }
        }
    }

    /// Read the next top-level element, whatever it is.
    pub async fn next_element(&mut self) -> Result<(QName, StreamElement), Error> {
        self.dispatcher.next_element().await
    }

    /// Turn into a stream of received messages and presences.
    ///
    /// The stream ends when the server closes its stream, and after yielding
    /// any other error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Stanza, Error>> {
        futures::stream::unfold(Some(self), |reader| async move {
            let mut reader = reader?;
            match reader.recv().await {
                Ok(stanza) => Some((Ok(stanza), Some(reader))),
                Err(Error::Disconnected) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

/// Writing half of a [`Session`].
#[derive(Debug)]
pub struct SessionWriter<T> {
    writer: StanzaWriter<WriteHalf<T>>,
}

impl<T: Transport> SessionWriter<T> {
    /// Send a stanza.
    ///
    /// The stanza is written and flushed as one unit. If that fails, the
    /// writer refuses any further use.
    pub async fn send<S: AsXml + ?Sized>(&mut self, stanza: &S) -> Result<(), Error> {
        self.writer.send(stanza).await
    }

    /// Send the stream footer and shut the transport down.
    pub async fn close(&mut self) -> Result<(), Error> {
        self.writer.close().await
    }
}
