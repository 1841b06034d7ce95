// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! SASL mechanism selection.

use base64::{engine::general_purpose::STANDARD as Base64, Engine};
use sasl::client::mechanisms::Plain;
use sasl::client::Mechanism as _;

use super::config::Credentials;
use crate::error::AuthError;
use crate::stanza::Auth;

/// SASL mechanisms this client can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// The transport established the identity.
    External,
    /// Identity and password in the clear.
    Plain,
}

impl Mechanism {
    /// The IANA name of the mechanism.
    pub fn name(self) -> &'static str {
        match self {
            Mechanism::External => "EXTERNAL",
            Mechanism::Plain => "PLAIN",
        }
    }
}

/// Pick a mechanism out of those the server advertised.
///
/// EXTERNAL wins if `prefer_external` is set and it is offered, then PLAIN
/// if offered. Anything else the server lists is ignored.
pub fn select_mechanism(advertised: &[String], prefer_external: bool) -> Result<Mechanism, AuthError> {
    let offered = |name: &str| advertised.iter().any(|m| m == name);
    if prefer_external && offered("EXTERNAL") {
        Ok(Mechanism::External)
    } else if offered("PLAIN") {
        Ok(Mechanism::Plain)
    } else {
        Err(AuthError::NoMechanism(advertised.to_vec()))
    }
}

/// Build the `<auth/>` element for `mechanism`.
pub(crate) fn auth_request(
    mechanism: Mechanism,
    credentials: &Credentials,
    local: &str,
) -> Result<Auth, AuthError> {
    let data = match mechanism {
        Mechanism::External => None,
        Mechanism::Plain => {
            let password = credentials.password_str().ok_or(AuthError::MissingSecret)?;
            let mut plain = Plain::new(local, password);
            Some(Base64.encode(plain.initial()))
        }
    };
    Ok(Auth {
        mechanism: mechanism.name().to_owned(),
        data,
    })
}
