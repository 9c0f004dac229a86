//! Forward-only token cursor over an XML stream.
//!
//! Wraps `quick_xml::Reader` and reduces its event vocabulary to the three
//! kinds the changeset state machine cares about. Self-closing elements are
//! expanded into a start token followed by an end token so that callers see
//! `<tag k="a" v="b"/>` and `<tag k="a" v="b"></tag>` identically.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::BufRead;

use crate::error::ParseError;

/// Attributes carried by a start token, keyed by local name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Attributes(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Start { name: String, attributes: Attributes },
    End { name: String },
    /// Text, comments, declarations and anything else without structure.
    Other,
}

impl Token {
    pub fn start<I, K, V>(name: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Token::Start {
            name: name.to_string(),
            attributes: attributes.into_iter().collect(),
        }
    }

    pub fn end(name: &str) -> Self {
        Token::End {
            name: name.to_string(),
        }
    }
}

pub struct EventCursor<R> {
    reader: Option<Reader<R>>,
    buf: Vec<u8>,
    peeked: Option<Token>,
    pending_end: Option<String>,
    exhausted: bool,
}

impl<R: BufRead> EventCursor<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: Some(Reader::from_reader(source)),
            buf: Vec::new(),
            peeked: None,
            pending_end: None,
            exhausted: false,
        }
    }

    /// Returns true while at least one more token can be read.
    pub fn has_next(&mut self) -> Result<bool, ParseError> {
        if self.peeked.is_none() {
            self.peeked = self.read_token()?;
        }
        Ok(self.peeked.is_some())
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.read_token(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Releases the underlying source. Returns false if it was already released.
    pub fn close(&mut self) -> bool {
        self.peeked = None;
        self.pending_end = None;
        self.exhausted = true;
        self.buf = Vec::new();
        self.reader.take().is_some()
    }

    fn read_token(&mut self) -> Result<Option<Token>, ParseError> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(Token::End { name }));
        }
        if self.exhausted {
            return Ok(None);
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        self.buf.clear();
        let event = reader
            .read_event_into(&mut self.buf)
            .map_err(|source| ParseError::Stream {
                position: reader.buffer_position(),
                source,
            })?;

        let token = match event {
            Event::Start(ref e) => Token::Start {
                name: local_name(e),
                attributes: read_attributes(e, reader)?,
            },
            Event::Empty(ref e) => {
                let name = local_name(e);
                let attributes = read_attributes(e, reader)?;
                self.pending_end = Some(name.clone());
                Token::Start { name, attributes }
            }
            Event::End(ref e) => Token::End {
                name: String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
            },
            Event::Eof => {
                self.exhausted = true;
                return Ok(None);
            }
            _ => Token::Other,
        };
        Ok(Some(token))
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn read_attributes<R>(e: &BytesStart<'_>, reader: &Reader<R>) -> Result<Attributes, ParseError> {
    let to_stream_error = |source: quick_xml::Error| ParseError::Stream {
        position: reader.buffer_position(),
        source,
    };

    let mut pairs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| to_stream_error(err.into()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(to_stream_error)?;
        pairs.push((key, value.into_owned()));
    }
    Ok(Attributes(pairs))
}
