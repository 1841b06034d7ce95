// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::error::Error as StdError;
use std::fmt;
use std::io::{self, Error as IoError};
use std::str::Utf8Error;

use crate::stanza::StreamError;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(IoError),
    /// A deadline on the transport elapsed
    Timeout,
    /// The peer closed the stream cleanly
    ///
    /// This is reported when the transport reaches end of file between
    /// two top-level elements, or when the peer sends its stream footer.
    Disconnected,
    /// Local configuration is unusable
    Config(ConfigError),
    /// Protocol-level error
    Protocol(ProtocolError),
    /// Authentication error
    Auth(AuthError),
    /// Policy refused an operation
    Security(SecurityError),
    /// The peer sent a `<stream:error/>`
    Stream(StreamError),
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(fmt, "IO error: {}", e),
            Error::Timeout => write!(fmt, "transport deadline exceeded"),
            Error::Disconnected => write!(fmt, "disconnected"),
            Error::Config(e) => write!(fmt, "configuration error: {}", e),
            Error::Protocol(e) => write!(fmt, "protocol error: {}", e),
            Error::Auth(e) => write!(fmt, "authentication error: {}", e),
            Error::Security(e) => write!(fmt, "security error: {}", e),
            Error::Stream(e) => write!(fmt, "stream error from peer: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Protocol(e) => Some(e),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut => Error::Timeout,
            _ => Error::Io(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

impl From<AuthError> for Error {
    fn from(e: AuthError) -> Self {
        Error::Auth(e)
    }
}

impl From<SecurityError> for Error {
    fn from(e: SecurityError) -> Self {
        Error::Security(e)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        ProtocolError::Xml(e).into()
    }
}

impl From<Utf8Error> for Error {
    fn from(e: Utf8Error) -> Self {
        ProtocolError::Utf8(e).into()
    }
}

/// Local configuration error
#[derive(Debug)]
pub enum ConfigError {
    /// The identity is not of the form `local@domain`
    InvalidIdentity(String),
}

impl StdError for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::InvalidIdentity(id) => {
                write!(fmt, "invalid identity (want user@domain): {}", id)
            }
        }
    }
}

/// XMPP protocol-level error
#[derive(Debug)]
pub enum ProtocolError {
    /// XML tokenizer error
    Xml(quick_xml::Error),
    /// Markup was not valid UTF-8
    Utf8(Utf8Error),
    /// An element prefix is not bound to any namespace
    UnboundPrefix(String),
    /// An end tag did not close any open element
    UnbalancedEndTag,
    /// An end tag did not match the innermost open element
    MismatchedEndTag {
        /// Name of the open element
        expected: String,
        /// Name in the end tag
        found: String,
    },
    /// An element not expected at this point was received
    UnexpectedElement {
        /// Namespace of the element
        ns: String,
        /// Local name of the element
        name: String,
    },
    /// The peer opened its stream with something else than `<stream:stream>`
    InvalidStreamStart {
        /// Namespace of the element
        ns: String,
        /// Local name of the element
        name: String,
    },
    /// Invalid response to resource binding
    InvalidBindResponse,
    /// The bound JID reported by the server is not a full JID
    InvalidJid(jid::Error),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProtocolError::Xml(e) => write!(fmt, "XML parser error: {}", e),
            ProtocolError::Utf8(e) => write!(fmt, "invalid UTF-8 in markup: {}", e),
            ProtocolError::UnboundPrefix(p) => write!(fmt, "unbound namespace prefix: {}", p),
            ProtocolError::UnbalancedEndTag => write!(fmt, "end tag without open element"),
            ProtocolError::MismatchedEndTag { expected, found } => {
                write!(fmt, "expected end tag of {} but got {}", expected, found)
            }
            ProtocolError::UnexpectedElement { ns, name } => {
                write!(fmt, "unexpected XMPP message {} <{}/>", ns, name)
            }
            ProtocolError::InvalidStreamStart { ns, name } => {
                write!(fmt, "expected <stream> but got <{}> in {}", name, ns)
            }
            ProtocolError::InvalidBindResponse => {
                write!(fmt, "invalid response to resource binding")
            }
            ProtocolError::InvalidJid(e) => write!(fmt, "invalid bound JID: {}", e),
        }
    }
}

impl StdError for ProtocolError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ProtocolError::Xml(e) => Some(e),
            ProtocolError::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for ProtocolError {
    fn from(e: quick_xml::Error) -> Self {
        ProtocolError::Xml(e)
    }
}

/// Authentication error
#[derive(Debug)]
pub enum AuthError {
    /// No mutually acceptable SASL mechanism; holds what the server offered
    NoMechanism(Vec<String>),
    /// The selected mechanism needs a password but none was supplied
    MissingSecret,
    /// Failure from server, with the local name of the defined condition
    Fail(String),
}

impl StdError for AuthError {}

impl fmt::Display for AuthError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::NoMechanism(offered) => write!(
                fmt,
                "no matching SASL mechanism available (offered: {:?})",
                offered
            ),
            AuthError::MissingSecret => write!(fmt, "mechanism requires a password"),
            AuthError::Fail(c) => write!(fmt, "failure from the server: {}", c),
        }
    }
}

/// Policy error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityError {
    /// Refusing to send credentials over an unencrypted transport
    UnencryptedAuth,
}

impl StdError for SecurityError {}

impl fmt::Display for SecurityError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SecurityError::UnencryptedAuth => write!(
                fmt,
                "refusing to authenticate over an unencrypted transport"
            ),
        }
    }
}
