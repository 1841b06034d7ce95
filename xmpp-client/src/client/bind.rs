// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::FullJid;

use super::login::unexpected_reply;
use crate::error::{Error, ProtocolError};
use crate::stanza::{Bind, Iq, StreamElement};
use crate::xmlstream::QName;

const BIND_REQ_ID: &str = "x";

/// The resource binding query, leaving the choice of resource to the server.
pub(super) fn request() -> Iq {
    Iq::bind_request(BIND_REQ_ID, Bind::default())
}

/// Extract the bound JID from the element answering [`request`].
pub(super) fn bound_jid(name: QName, elem: StreamElement) -> Result<FullJid, Error> {
    let iq = match elem {
        StreamElement::Iq(iq) => iq,
        elem => return Err(unexpected_reply(&name, elem)),
    };
    if !iq.is_result() {
        return Err(ProtocolError::InvalidBindResponse.into());
    }
    let jid = iq
        .bind
        .and_then(|bind| bind.jid)
        .ok_or(ProtocolError::InvalidBindResponse)?;
    jid.parse::<FullJid>()
        .map_err(|e| ProtocolError::InvalidJid(e).into())
}
