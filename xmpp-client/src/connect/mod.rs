// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Transports a [`Session`][`crate::Session`] can run over.
//!
//! Establishing the byte stream (TCP dial, proxy tunnel, TLS handshake and
//! hostname verification) happens outside of this crate. All the session
//! needs is a connected duplex stream which knows whether it is encrypted.

use core::pin::Pin;
use core::task::{Context, Poll};
use std::io::{self, IoSlice};

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio::net::TcpStream;

mod deadline;
pub use deadline::DeadlineStream;

/// A connected, optionally secured duplex byte stream.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {
    /// Whether the stream is encrypted.
    ///
    /// This decides whether credentials may be sent without the caller
    /// explicitly allowing unencrypted authentication.
    fn is_secure(&self) -> bool;
}

impl Transport for TcpStream {
    fn is_secure(&self) -> bool {
        false
    }
}

impl Transport for DuplexStream {
    fn is_secure(&self) -> bool {
        false
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn is_secure(&self) -> bool {
        (**self).is_secure()
    }
}

#[cfg(feature = "tls-rust")]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> Transport for tokio_rustls::client::TlsStream<S> {
    fn is_secure(&self) -> bool {
        true
    }
}

/// Marks a stream as secured by something outside of this crate.
///
/// Use this for streams which are encrypted by a TLS implementation that
/// has no [`Transport`] impl of its own, or which run over a link that is
/// otherwise protected.
#[derive(Debug)]
pub struct Secured<S>(S);

impl<S> Secured<S> {
    /// Wrap a stream which is already encrypted.
    pub fn new(inner: S) -> Self {
        Self(inner)
    }

    /// Obtain a reference to the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.0
    }

    /// Extract the wrapped stream.
    pub fn into_inner(self) -> S {
        self.0
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> Transport for Secured<S> {
    fn is_secure(&self) -> bool {
        true
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for Secured<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().0).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for Secured<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().0).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().0).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().0).poll_shutdown(cx)
    }

    fn is_write_vectored(&self) -> bool {
        self.0.is_write_vectored()
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().0).poll_write_vectored(cx, bufs)
    }
}
