// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Trace logging of raw stream traffic.

use core::fmt;

/// Displays raw stream bytes, replacing invalid UTF-8.
pub(crate) struct LogBuf<'x>(pub &'x [u8]);

impl fmt::Display for LogBuf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.0))
    }
}

/// Return true if logging via [`log_recv`] or [`log_send`] might be visible
/// to the user.
pub(crate) fn log_enabled() -> bool {
    log::log_enabled!(log::Level::Trace)
}

/// Log a complete top-level element as it was received.
///
/// `err` is a decoding error which may be logged alongside the data.
pub(crate) fn log_recv(err: Option<&dyn fmt::Display>, data: &[u8]) {
    match err {
        Some(err) => log::trace!("RECV (error: {}) {}", err, LogBuf(data)),
        None => log::trace!("RECV (ok) {}", LogBuf(data)),
    }
}

/// Displays a serialised element with its content replaced, keeping the
/// start and end tags.
pub(crate) struct Redacted<'x>(pub &'x str);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0;
        let (Some(open), Some(close)) = (data.find('>'), data.rfind("</")) else {
            return f.write_str(data);
        };
        if close <= open {
            return f.write_str(data);
        }
        write!(f, "{}[redacted]{}", &data[..=open], &data[close..])
    }
}

/// Log sent data.
pub(crate) fn log_send(data: &[u8]) {
    log::trace!("SEND {}", LogBuf(data));
}

/// Log sent data which carries credentials, without its content.
pub(crate) fn log_send_redacted(data: &str) {
    log::trace!("SEND {}", Redacted(data));
}
