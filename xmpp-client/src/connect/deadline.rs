// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::io;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Instant, Sleep};

use super::Transport;

/// One direction's deadline.
#[derive(Debug, Default)]
struct Deadline {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Deadline {
    fn set(&mut self, at: Option<Instant>) {
        self.sleep = at.map(|at| Box::pin(tokio::time::sleep_until(at)));
    }

    fn at(&self) -> Option<Instant> {
        self.sleep.as_ref().map(|sleep| sleep.deadline())
    }

    fn poll_elapsed(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().poll(cx),
            None => Poll::Pending,
        }
    }
}

fn timed_out(what: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, what)
}

/// Duplex stream with absolute read and write deadlines.
///
/// Once a deadline has passed, every pending and future operation in that
/// direction fails with [`io::ErrorKind::TimedOut`] until the deadline is
/// moved or cleared. Data which is already available does not rescue an
/// operation after its deadline.
#[derive(Debug)]
pub struct DeadlineStream<S> {
    inner: S,
    read: Deadline,
    write: Deadline,
}

impl<S> DeadlineStream<S> {
    /// Wrap a stream, without any deadline set.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            read: Deadline::default(),
            write: Deadline::default(),
        }
    }

    /// Set both the read and the write deadline. `None` clears them.
    pub fn set_deadline(&mut self, at: Option<Instant>) {
        self.read.set(at);
        self.write.set(at);
    }

    /// Set the read deadline. `None` clears it.
    pub fn set_read_deadline(&mut self, at: Option<Instant>) {
        self.read.set(at);
    }

    /// Set the write deadline. `None` clears it.
    pub fn set_write_deadline(&mut self, at: Option<Instant>) {
        self.write.set(at);
    }

    /// The current read deadline.
    pub fn read_deadline(&self) -> Option<Instant> {
        self.read.at()
    }

    /// The current write deadline.
    pub fn write_deadline(&self) -> Option<Instant> {
        self.write.at()
    }

    /// Obtain a reference to the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Extract the wrapped stream, dropping the deadlines.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Transport> Transport for DeadlineStream<S> {
    fn is_secure(&self) -> bool {
        self.inner.is_secure()
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for DeadlineStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.read.poll_elapsed(cx).is_ready() {
            return Poll::Ready(Err(timed_out("read deadline exceeded")));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for DeadlineStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.write.poll_elapsed(cx).is_ready() {
            return Poll::Ready(Err(timed_out("write deadline exceeded")));
        }
        Pin::new(&mut this.inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.write.poll_elapsed(cx).is_ready() {
            return Poll::Ready(Err(timed_out("write deadline exceeded")));
        }
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
