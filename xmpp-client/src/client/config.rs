// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;

use crate::error::ConfigError;
use crate::stanza::Presence;

/// The presence announced once the session is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialPresence {
    /// Content of `<show/>`; omitted if `None`.
    pub show: Option<String>,

    /// Content of `<status/>`; omitted if `None`.
    pub status: Option<String>,

    /// The `xml:lang` of the presence.
    pub lang: String,
}

impl Default for InitialPresence {
    fn default() -> Self {
        InitialPresence {
            show: Some(String::from("chat")),
            status: Some(String::from("Online")),
            lang: String::from("en"),
        }
    }
}

impl InitialPresence {
    pub(crate) fn to_presence(&self) -> Presence {
        Presence {
            lang: Some(self.lang.clone()),
            show: self.show.clone(),
            status: self.status.clone(),
            ..Default::default()
        }
    }
}

/// Per-session settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    /// Send credentials even if the transport is not encrypted.
    pub allow_insecure_auth: bool,

    /// Use SASL EXTERNAL whenever the server offers it.
    pub prefer_external: bool,

    /// Presence to announce when the session is ready.
    pub initial_presence: InitialPresence,
}

impl Config {
    /// Allow or forbid authenticating over an unencrypted transport.
    pub fn allow_insecure_auth(mut self, allow: bool) -> Self {
        self.allow_insecure_auth = allow;
        self
    }

    /// Prefer SASL EXTERNAL over PLAIN.
    pub fn prefer_external(mut self, prefer: bool) -> Self {
        self.prefer_external = prefer;
        self
    }

    /// Set the `<show/>` and `<status/>` of the initial presence.
    pub fn presence(mut self, show: Option<&str>, status: Option<&str>) -> Self {
        self.initial_presence.show = show.map(str::to_owned);
        self.initial_presence.status = status.map(str::to_owned);
        self
    }
}

/// What proves the identity.
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    /// A password, for SASL PLAIN.
    Password(String),

    /// An identity the transport already established, for instance with a
    /// client certificate, for SASL EXTERNAL.
    External,
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Secret::Password(_) => f.write_str("Password(..)"),
            Secret::External => f.write_str("External"),
        }
    }
}

/// Who to log in as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The bare identity, `local@domain`.
    pub identity: String,

    /// The secret proving it.
    pub secret: Secret,
}

impl Credentials {
    /// Log in as `identity` with a password.
    pub fn password<I: Into<String>, P: Into<String>>(identity: I, password: P) -> Self {
        Credentials {
            identity: identity.into(),
            secret: Secret::Password(password.into()),
        }
    }

    /// Log in as `identity`, relying on the transport for proof.
    pub fn external<I: Into<String>>(identity: I) -> Self {
        Credentials {
            identity: identity.into(),
            secret: Secret::External,
        }
    }

    /// Whether the secret is established by the transport.
    pub fn is_external(&self) -> bool {
        self.secret == Secret::External
    }

    /// The password, if any.
    pub fn password_str(&self) -> Option<&str> {
        match &self.secret {
            Secret::Password(password) => Some(password),
            Secret::External => None,
        }
    }

    /// Split the identity at its first `@` into local part and domain.
    pub fn split_identity(&self) -> Result<(&str, &str), ConfigError> {
        self.identity
            .split_once('@')
            .ok_or_else(|| ConfigError::InvalidIdentity(self.identity.clone()))
    }
}
