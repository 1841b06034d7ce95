// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::capture::{log_send, log_send_redacted};
use crate::error::Error;
use crate::stanza::AsXml;

/// The closing tag of the stream root.
pub(crate) const STREAM_FOOTER: &str = "</stream:stream>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteState {
    Open,
    FooterSent,
    Failed,
}

impl WriteState {
    fn check_ok(&self) -> io::Result<()> {
        match self {
            WriteState::Failed => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "XML stream sink unusable because of previous write error",
            )),
            WriteState::Open | WriteState::FooterSent => Ok(()),
        }
    }

    fn check_writable(&self) -> io::Result<()> {
        match self {
            WriteState::FooterSent => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "stream footer already sent",
            )),
            WriteState::Failed | WriteState::Open => self.check_ok(),
        }
    }
}

/// Writing half of an XML stream.
///
/// Each unit is serialised completely before the first byte of it is
/// written, then written and flushed in one go. If that fails, nothing is
/// known about how much of the unit reached the peer, so the writer refuses
/// any further use.
#[derive(Debug)]
pub struct StanzaWriter<W> {
    io: W,
    state: WriteState,
}

impl<W> StanzaWriter<W> {
    /// Wrap a byte sink.
    pub fn new(io: W) -> Self {
        Self {
            io,
            state: WriteState::Open,
        }
    }

    /// Obtain a reference to the byte sink.
    pub fn get_ref(&self) -> &W {
        &self.io
    }

    /// Whether a previous write failed.
    pub fn is_failed(&self) -> bool {
        self.state == WriteState::Failed
    }
}

impl<W: AsyncWrite + Unpin> StanzaWriter<W> {
    async fn write_unit(&mut self, data: &[u8]) -> io::Result<()> {
        self.io.write_all(data).await?;
        self.io.flush().await
    }

    async fn write_logged(&mut self, data: &str, secret: bool) -> Result<(), Error> {
        self.state.check_writable()?;
        if secret {
            log_send_redacted(data);
        } else {
            log_send(data.as_bytes());
        }
        if let Err(e) = self.write_unit(data.as_bytes()).await {
            self.state = WriteState::Failed;
            return Err(e.into());
        }
        Ok(())
    }

    /// Write a pre-serialised unit of markup.
    pub async fn send_raw(&mut self, data: &str) -> Result<(), Error> {
        self.write_logged(data, false).await
    }

    /// Serialise `item` and write it as a single unit.
    pub async fn send<T: AsXml + ?Sized>(&mut self, item: &T) -> Result<(), Error> {
        let data = item.to_xml()?;
        self.write_logged(&data, false).await
    }

    /// Like [`Self::send`], for elements carrying credentials: the trace
    /// log only shows the tags of `item`, never its content.
    pub async fn send_secret<T: AsXml + ?Sized>(&mut self, item: &T) -> Result<(), Error> {
        let data = item.to_xml()?;
        self.write_logged(&data, true).await
    }

    /// Send the stream footer, then shut the byte sink down.
    ///
    /// Calling this again after it succeeded only repeats the shutdown.
    pub async fn close(&mut self) -> Result<(), Error> {
        self.state.check_ok()?;
        if self.state == WriteState::Open {
            self.send_raw(STREAM_FOOTER).await?;
            self.state = WriteState::FooterSent;
        }
        self.io.shutdown().await?;
        Ok(())
    }
}
