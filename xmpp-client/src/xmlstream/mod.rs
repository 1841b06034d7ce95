// Copyright (c) 2026 xmpp-client contributors
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # RFC 3920 XML Streams
//!
//! **Note:** The XML stream is a low-level API which you should probably not
//! use directly.
//!
//! [`XmlReader`] turns the bytes of a transport into [`Token`]s with
//! namespace-resolved names. Unlike a document parser, it never expects the
//! root element to be closed: the `<stream:stream>` root stays open for the
//! whole session, and when the peer sends a new stream header (after
//! authentication, for instance) that header simply becomes the new root.
//! Bytes which were already buffered are kept across such a restart, and
//! across [`XmlReader::replace_io`].
//!
//! Every start and end tag carries its absolute byte span in the stream.
//! Together with [`XmlReader::retain_from`] this lets callers slice out the
//! markup of an element exactly as it was received.
//!
//! [`StanzaWriter`] is the writing half: it sends pre-serialised units in
//! one go and refuses to be used again once a write failed.

use core::fmt;
use core::ops::Range;
use std::io;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, ProtocolError};
use crate::ns;

pub(crate) mod capture;
mod lexer;
mod writer;

use self::lexer::{Lexed, Step};
pub use self::writer::StanzaWriter;

/// Amount of spare room made in the read buffer before each read.
const READ_CHUNK: usize = 4096;

/// A namespace-qualified name.
///
/// Two qualified names are equal if and only if both their namespace and
/// their local name are equal. Unqualified names (most attributes, for
/// instance) have an empty namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct QName {
    /// Namespace URI, empty if the name is unqualified.
    pub ns: String,
    /// Local part of the name.
    pub local: String,
}

impl QName {
    /// Construct a qualified name.
    pub fn new<N: Into<String>, L: Into<String>>(ns: N, local: L) -> Self {
        Self {
            ns: ns.into(),
            local: local.into(),
        }
    }

    /// Return true if this name has namespace `ns` and local name `local`.
    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.ns == ns && self.local == local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ns.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.ns, self.local)
        }
    }
}

/// An attribute with its value unescaped.
///
/// Namespace declarations are never reported as attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified attribute name.
    pub name: QName,
    /// Attribute value.
    pub value: String,
}

/// An element start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    /// Qualified element name.
    pub name: QName,
    /// Attributes in document order.
    pub attrs: Vec<Attribute>,
    /// Absolute position of the tag in the stream.
    pub span: Range<u64>,
    /// True for `<empty/>` tags; the matching [`EndTag`] follows
    /// immediately and has an empty span.
    pub empty: bool,
}

impl StartTag {
    /// Value of the unqualified attribute `local`.
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attr_ns("", local)
    }

    /// Value of the attribute `{ns}local`.
    pub fn attr_ns(&self, ns: &str, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name.is(ns, local))
            .map(|attr| attr.value.as_str())
    }
}

/// An element end tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndTag {
    /// Qualified element name.
    pub name: QName,
    /// Absolute position of the tag in the stream.
    pub span: Range<u64>,
}

/// A single XML token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An element was opened.
    Start(StartTag),
    /// An element was closed.
    End(EndTag),
    /// Character data, with entity references resolved.
    Text(String),
}

/// Namespace bindings in effect at some point of a document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Namespaces {
    /// The default namespace, empty if there is none.
    pub default: String,
    /// Prefixed bindings as `(prefix, uri)`, each prefix at most once. The
    /// `xml` prefix is always bound and never listed.
    pub prefixes: Vec<(String, String)>,
}

impl Namespaces {
    /// Whether nothing at all is bound.
    pub fn is_empty(&self) -> bool {
        self.default.is_empty() && self.prefixes.is_empty()
    }

    /// The namespace `prefix` is bound to.
    pub fn prefix_uri(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// A prefix bound to `uri`.
    pub fn prefix_of(&self, uri: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Bind `prefix` to `uri`, replacing an existing binding of `prefix`.
    pub fn bind(&mut self, prefix: &str, uri: &str) {
        match self.prefixes.iter_mut().find(|(p, _)| p == prefix) {
            Some(binding) => binding.1 = uri.to_owned(),
            None => self.prefixes.push((prefix.to_owned(), uri.to_owned())),
        }
    }
}

/// Namespace declarations: `(prefix, uri)`, where the default namespace has
/// no prefix.
type Decls = Vec<(Option<String>, String)>;

/// An open element.
#[derive(Debug)]
struct Scope {
    name: QName,
    decls: Decls,
}

fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn resolve(
    own: &[(Option<String>, String)],
    open: &[Scope],
    prefix: Option<&str>,
) -> Result<String, ProtocolError> {
    if prefix == Some("xml") {
        return Ok(ns::XML.to_owned());
    }
    let scopes = core::iter::once(own).chain(open.iter().rev().map(|s| s.decls.as_slice()));
    for scope in scopes {
        if let Some((_, uri)) = scope.iter().find(|(p, _)| p.as_deref() == prefix) {
            return Ok(uri.clone());
        }
    }
    match prefix {
        None => Ok(String::new()),
        Some(prefix) => Err(ProtocolError::UnboundPrefix(prefix.to_owned())),
    }
}

/// Incremental, restart-tolerant XML tokenizer.
#[derive(Debug)]
pub struct XmlReader<R> {
    io: R,
    buf: BytesMut,
    /// Absolute stream offset of `buf[0]`.
    base: u64,
    /// Start of the unparsed part of `buf`.
    cursor: usize,
    /// Absolute offset before which buffered bytes may not be discarded.
    retain: Option<u64>,
    scopes: Vec<Scope>,
    pending_end: Option<EndTag>,
    eof: bool,
}

impl<R> XmlReader<R> {
    /// Create a reader with an empty buffer and no open elements.
    pub fn new(io: R) -> Self {
        Self {
            io,
            buf: BytesMut::new(),
            base: 0,
            cursor: 0,
            retain: None,
            scopes: Vec::new(),
            pending_end: None,
            eof: false,
        }
    }

    /// Obtain a reference to the byte source.
    pub fn get_ref(&self) -> &R {
        &self.io
    }

    /// Swap the byte source beneath the reader.
    ///
    /// Buffered but unparsed bytes, the open element scopes and the capture
    /// window are all kept, so tokenization continues exactly where it
    /// stopped. Returns the new reader and the previous byte source.
    pub fn replace_io<R2>(self, io: R2) -> (XmlReader<R2>, R) {
        let XmlReader {
            io: old,
            buf,
            base,
            cursor,
            retain,
            scopes,
            pending_end,
            eof: _,
        } = self;
        let reader = XmlReader {
            io,
            buf,
            base,
            cursor,
            retain,
            scopes,
            pending_end,
            eof: false,
        };
        (reader, old)
    }

    /// Number of currently open elements, including the stream root.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// The bindings in effect inside the innermost open element.
    pub fn namespaces(&self) -> Namespaces {
        let mut namespaces = Namespaces::default();
        for (prefix, uri) in self.scopes.iter().flat_map(|scope| scope.decls.iter()) {
            match prefix {
                Some(prefix) => namespaces.bind(prefix, uri),
                None => namespaces.default = uri.clone(),
            }
        }
        namespaces
    }

    /// Absolute offset of the first byte not yet consumed by a token.
    pub fn position(&self) -> u64 {
        self.base + self.cursor as u64
    }

    /// Keep every byte from absolute offset `offset` onwards available to
    /// [`Self::slice`] until [`Self::release`] is called.
    ///
    /// `offset` must not be smaller than the start of the last token.
    pub fn retain_from(&mut self, offset: u64) {
        self.retain = Some(offset.max(self.base));
    }

    /// Allow retained bytes to be discarded again.
    pub fn release(&mut self) {
        self.retain = None;
    }

    /// The raw bytes between the absolute offsets of `range`.
    ///
    /// Returns `None` if any part of the range has been discarded or not
    /// been consumed yet.
    pub fn slice_bytes(&self, range: Range<u64>) -> Option<&[u8]> {
        if range.start < self.base || range.end > self.position() || range.start > range.end {
            return None;
        }
        let start = (range.start - self.base) as usize;
        let end = (range.end - self.base) as usize;
        Some(&self.buf[start..end])
    }

    /// The raw markup between the absolute offsets of `range`.
    pub fn slice(&self, range: Range<u64>) -> Result<&str, Error> {
        let bytes = self.slice_bytes(range).ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "requested bytes are no longer buffered",
            ))
        })?;
        Ok(core::str::from_utf8(bytes)?)
    }

    /// Drop consumed bytes which are not retained.
    fn compact(&mut self) {
        let keep_from = match self.retain {
            Some(retain) => ((retain - self.base) as usize).min(self.cursor),
            None => self.cursor,
        };
        if keep_from > 0 {
            self.buf.advance(keep_from);
            self.base += keep_from as u64;
            self.cursor -= keep_from;
        }
    }

    fn open(
        &mut self,
        raw: String,
        raw_attrs: Vec<(String, String)>,
        empty: bool,
        span: Range<u64>,
    ) -> Result<Token, Error> {
        let mut decls = Decls::new();
        let mut plain = Vec::with_capacity(raw_attrs.len());
        for (key, value) in raw_attrs {
            if key == "xmlns" {
                decls.push((None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                decls.push((Some(prefix.to_owned()), value));
            } else {
                plain.push((key, value));
            }
        }

        let (prefix, local) = split_name(&raw);
        let name = QName::new(resolve(&decls, &self.scopes, prefix)?, local);

        let mut attrs = Vec::with_capacity(plain.len());
        for (key, value) in plain {
            let (prefix, local) = split_name(&key);
            // Unprefixed attributes are not in the default namespace.
            let ns = match prefix {
                None => String::new(),
                Some(_) => resolve(&decls, &self.scopes, prefix)?,
            };
            attrs.push(Attribute {
                name: QName::new(ns, local),
                value,
            });
        }

        if name.is(ns::STREAM, "stream") {
            // A stream header opens a new document, whether or not the
            // previous root was closed.
            self.scopes.clear();
        }
        self.scopes.push(Scope {
            name: name.clone(),
            decls,
        });
        if empty {
            self.pending_end = Some(EndTag {
                name: name.clone(),
                span: span.end..span.end,
            });
        }
        Ok(Token::Start(StartTag {
            name,
            attrs,
            span,
            empty,
        }))
    }

    fn close(&mut self, raw: String, span: Range<u64>) -> Result<Token, Error> {
        if self.scopes.is_empty() {
            return Err(ProtocolError::UnbalancedEndTag.into());
        }
        let (prefix, local) = split_name(&raw);
        let name = QName::new(resolve(&[], &self.scopes, prefix)?, local);
        match self.scopes.pop() {
            Some(open) if open.name == name => Ok(Token::End(EndTag { name, span })),
            Some(open) => Err(ProtocolError::MismatchedEndTag {
                expected: open.name.to_string(),
                found: name.to_string(),
            }
            .into()),
            None => Err(ProtocolError::UnbalancedEndTag.into()),
        }
    }
}

impl<R: AsyncRead + Unpin> XmlReader<R> {
    async fn fill(&mut self) -> io::Result<()> {
        self.compact();
        self.buf.reserve(READ_CHUNK);
        if self.io.read_buf(&mut self.buf).await? == 0 {
            self.eof = true;
        }
        Ok(())
    }

    /// Read the next token.
    ///
    /// Returns `Ok(None)` once the byte source has been exhausted at a token
    /// boundary. Running out of data in the middle of a tag is an error.
    /// XML declarations, comments and processing instructions are skipped.
    pub async fn next_token(&mut self) -> Result<Option<Token>, Error> {
        if let Some(end) = self.pending_end.take() {
            self.scopes.pop();
            return Ok(Some(Token::End(end)));
        }
        loop {
            let (lexed, len) = match lexer::lex(&self.buf[self.cursor..], self.eof)? {
                Step::Event { lexed, len } => (lexed, len),
                Step::NeedMore => {
                    self.fill().await?;
                    continue;
                }
                Step::Eof => return Ok(None),
            };
            let start = self.position();
            self.cursor += len;
            let span = start..self.position();
            return match lexed {
                Lexed::Skip => continue,
                Lexed::Text(text) => Ok(Some(Token::Text(text))),
                Lexed::Start { name, attrs, empty } => {
                    self.open(name, attrs, empty, span).map(Some)
                }
                Lexed::End { name } => self.close(name, span).map(Some),
            };
        }
    }
}
