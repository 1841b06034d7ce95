// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use super::{check_name, AsXml, Element, Encoder};
use crate::error::{Error, ProtocolError};
use crate::ns;

/// The resource binding payload.
///
/// In a request, `resource` optionally names the wanted resource; in the
/// result, `jid` is the full JID the server bound the session to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bind {
    /// Requested resource.
    pub resource: Option<String>,

    /// Bound full JID, as a string.
    pub jid: Option<String>,
}

impl TryFrom<Element> for Bind {
    type Error = ProtocolError;

    fn try_from(elem: Element) -> Result<Bind, ProtocolError> {
        check_name(&elem, ns::BIND, "bind")?;
        let text = |local: &str| {
            elem.get_child(ns::BIND, local)
                .map(|child| child.text.trim().to_owned())
        };
        Ok(Bind {
            resource: text("resource"),
            jid: text("jid"),
        })
    }
}

impl AsXml for Bind {
    fn write_xml(&self, w: &mut Encoder) -> Result<(), Error> {
        w.start(ns::BIND, "bind")?;
        if let Some(resource) = &self.resource {
            w.text_child(ns::BIND, "resource", resource)?;
        }
        if let Some(jid) = &self.jid {
            w.text_child(ns::BIND, "jid", jid)?;
        }
        w.end()
    }
}
