// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Client core of [XMPP](https://xmpp.org/) over asynchronous I/O using
//! [tokio](https://tokio.rs/).
//!
//! # Getting started
//!
//! Establish a transport yourself (any [`connect::Transport`], for instance
//! a TLS stream), then hand it to [`Session::connect`] together with the
//! [`Credentials`] to log in with. Once that returns, the session is
//! authenticated, bound to a resource and has announced its presence:
//!
//! ```no_run
//! # async fn run() -> Result<(), xmpp_client::Error> {
//! use tokio::net::TcpStream;
//! use xmpp_client::connect::Secured;
//! use xmpp_client::{Config, Credentials, Session};
//!
//! // Stands in for a TLS tunnel, e.g. through a local stunnel.
//! let tcp = TcpStream::connect("127.0.0.1:5222").await?;
//! let credentials = Credentials::password("juliet@capulet.lit", "r0m30myr0m30");
//! let mut session = Session::connect(Secured::new(tcp), &credentials, &Config::default()).await?;
//! while let Ok(stanza) = session.recv().await {
//!     println!("{:?}", stanza);
//! }
//! session.close().await
//! # }
//! ```
//!
//! # Layers
//!
//! - [`xmlstream::XmlReader`] turns bytes into namespace-resolved tokens and
//!   survives stream restarts.
//! - [`dispatch::Dispatcher`] reads whole top-level elements and decodes them
//!   according to their qualified name.
//! - [`Session`] drives negotiation and then exposes the reading and writing
//!   paths.
//!
//! STARTTLS, SCRAM and connection establishment are not part of this crate.

#![deny(unsafe_code, missing_docs, bare_trait_objects)]

pub mod client;
pub mod connect;
pub mod dispatch;
pub mod ns;
pub mod stanza;
pub mod xmlstream;

/// Detailed error types
pub mod error;

pub use crate::client::{Config, Credentials, Session};
#[doc(inline)]
pub use crate::error::Error;

// Re-exports
pub use jid;
