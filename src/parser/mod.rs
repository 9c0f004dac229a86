//! Changeset state machine and the parser that drives it.
//!
//! The document is walked as a flat token stream. [`transition`] is a pure
//! function from `(state, token)` to the next state, optionally handing back
//! a node whose end token was just consumed. [`ChangesetParser`] pulls
//! tokens from the cursor, feeds them through the state machine and passes
//! completed nodes to the classifier.

pub mod node;
pub mod section;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::classify::{Buckets, Classifier};
use crate::config::ParserOptions;
use crate::cursor::{EventCursor, Token};
use crate::error::ParseError;
use crate::poi::{AmenityFilter, PointOfInterest};

use node::{CompletedNode, NODE, NodeFrame, TAG};
use section::SectionGate;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParserState {
    /// Outside any section.
    #[default]
    Scanning,
    /// Inside a section, holding the element name that opened it.
    InSection(String),
    InNode(NodeFrame),
}

pub fn transition(
    state: ParserState,
    token: Token,
    gate: &SectionGate,
) -> (ParserState, Option<CompletedNode>) {
    match (state, token) {
        (ParserState::Scanning, Token::Start { name, .. }) if gate.opens(&name) => {
            (ParserState::InSection(name), None)
        }
        (ParserState::Scanning, _) => (ParserState::Scanning, None),

        (ParserState::InSection(section), Token::End { name }) if name == section => {
            (ParserState::Scanning, None)
        }
        (ParserState::InSection(section), Token::Start { name, attributes }) if name == NODE => {
            (ParserState::InNode(NodeFrame::open(section, &attributes)), None)
        }
        (state @ ParserState::InSection(_), _) => (state, None),

        (ParserState::InNode(mut frame), Token::Start { name, attributes }) => {
            if name == TAG {
                frame.absorb_tag(&attributes);
            }
            frame.descend();
            (ParserState::InNode(frame), None)
        }
        (ParserState::InNode(frame), Token::End { name }) if frame.depth() == 0 && name == NODE => {
            let section = frame.section().to_string();
            (ParserState::InSection(section), Some(frame.finish()))
        }
        (ParserState::InNode(mut frame), Token::End { .. }) => {
            frame.ascend();
            (ParserState::InNode(frame), None)
        }
        (state @ ParserState::InNode(_), Token::Other) => (state, None),
    }
}

/// Flushes a node left open when the stream ends.
pub fn finish_stream(state: ParserState) -> Option<CompletedNode> {
    match state {
        ParserState::InNode(frame) => Some(frame.truncate()),
        ParserState::Scanning | ParserState::InSection(_) => None,
    }
}

/// Single-pass parser over one changeset document.
///
/// Owns its input, state and buckets exclusively. The input is released when
/// the stream is exhausted, when a stream error occurs, on [`clear`], or on
/// drop, whichever comes first.
///
/// [`clear`]: ChangesetParser::clear
pub struct ChangesetParser<R> {
    cursor: EventCursor<R>,
    state: ParserState,
    gate: SectionGate,
    classifier: Classifier,
    buckets: Buckets,
}

impl ChangesetParser<BufReader<File>> {
    pub fn open(path: &Path, options: ParserOptions) -> Result<Self, ParseError> {
        let file = File::open(path).map_err(|source| ParseError::Open {
            source,
            path: path.to_path_buf(),
        })?;
        Ok(Self::new(BufReader::new(file), options))
    }
}

impl<'a> ChangesetParser<&'a [u8]> {
    pub fn from_xml(xml: &'a str, options: ParserOptions) -> Self {
        Self::new(xml.as_bytes(), options)
    }
}

impl<R: BufRead> ChangesetParser<R> {
    pub fn new(source: R, options: ParserOptions) -> Self {
        let ParserOptions {
            accepted_amenities,
            extra_sections,
            date_offset,
        } = options;
        Self {
            cursor: EventCursor::new(source),
            state: ParserState::Scanning,
            gate: SectionGate::new(extra_sections),
            classifier: Classifier::new(AmenityFilter::new(accepted_amenities), date_offset),
            buckets: Buckets::default(),
        }
    }

    /// Scans the whole stream once. Calling again after the stream has been
    /// consumed or released does no work.
    pub fn run(&mut self) -> Result<&Buckets, ParseError> {
        if !self.cursor.is_open() {
            tracing::debug!("Parser: stream already released, nothing to do");
            return Ok(&self.buckets);
        }

        if let Err(err) = self.drive() {
            self.state = ParserState::Scanning;
            self.cursor.close();
            return Err(err);
        }

        self.cursor.close();
        let buckets = &self.buckets;
        tracing::info!(
            "Parser: done ({} created, {} updated, {} deleted, {} malformed, {} faults)",
            buckets.created().len(),
            buckets.updated().len(),
            buckets.deleted().len(),
            buckets.malformed().len(),
            buckets.faults().len()
        );
        Ok(buckets)
    }

    fn drive(&mut self) -> Result<(), ParseError> {
        while self.cursor.has_next()? {
            let Some(token) = self.cursor.next_token()? else {
                break;
            };
            let previous = std::mem::take(&mut self.state);
            let was_scanning = previous == ParserState::Scanning;
            let (next, completed) = transition(previous, token, &self.gate);

            match (&next, was_scanning) {
                (ParserState::InSection(name), true) => {
                    tracing::info!("Parser: entering <{}>", name)
                }
                (ParserState::Scanning, false) => tracing::info!("Parser: section closed"),
                _ => {}
            }

            self.state = next;
            if let Some(node) = completed {
                self.classifier.classify(node, &mut self.buckets);
            }
        }

        if let Some(node) = finish_stream(std::mem::take(&mut self.state)) {
            self.classifier.classify(node, &mut self.buckets);
        }
        Ok(())
    }

    /// Empties all buckets and releases the input. The stream is not rewound.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.state = ParserState::Scanning;
        if self.cursor.close() {
            tracing::debug!("Parser: released changeset stream");
        }
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn into_buckets(self) -> Buckets {
        self.buckets
    }

    pub fn created(&self) -> &[PointOfInterest] {
        self.buckets.created()
    }

    pub fn updated(&self) -> &[PointOfInterest] {
        self.buckets.updated()
    }

    pub fn deleted(&self) -> &[PointOfInterest] {
        self.buckets.deleted()
    }

    pub fn malformed(&self) -> &[PointOfInterest] {
        self.buckets.malformed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_start(id: &str) -> Token {
        Token::start(
            "node",
            [
                ("id", id),
                ("version", "1"),
                ("changeset", "10"),
                ("timestamp", "2021-01-01T00:00:00Z"),
                ("lon", "13.4"),
                ("lat", "52.5"),
            ],
        )
    }

    fn tag(k: &str, v: &str) -> [Token; 2] {
        [Token::start("tag", [("k", k), ("v", v)]), Token::end("tag")]
    }

    fn feed(tokens: Vec<Token>, gate: &SectionGate) -> (ParserState, Vec<CompletedNode>) {
        let mut state = ParserState::Scanning;
        let mut completed = Vec::new();
        for token in tokens {
            let (next, node) = transition(state, token, gate);
            state = next;
            completed.extend(node);
        }
        (state, completed)
    }

    #[test]
    fn nodes_outside_sections_are_ignored() {
        let mut tokens = vec![Token::start("osmChange", Vec::<(String, String)>::new()), node_start("1")];
        tokens.extend(tag("shop", "bakery"));
        tokens.push(Token::end("node"));
        tokens.push(Token::end("osmChange"));
        let (state, completed) = feed(tokens, &SectionGate::default());
        assert_eq!(state, ParserState::Scanning);
        assert!(completed.is_empty());
    }

    #[test]
    fn completes_node_inside_section() {
        let mut tokens = vec![Token::start("create", Vec::<(String, String)>::new()), node_start("1")];
        tokens.extend(tag("amenity", "bank"));
        tokens.extend(tag("name", "Spree"));
        tokens.push(Token::end("node"));
        let (state, completed) = feed(tokens, &SectionGate::default());
        assert_eq!(state, ParserState::InSection("create".to_string()));
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].section, "create");
        assert_eq!(completed[0].tags.len(), 2);
    }

    #[test]
    fn section_closes_only_on_its_own_end_token() {
        let tokens = vec![
            Token::start("modify", Vec::<(String, String)>::new()),
            Token::end("create"),
        ];
        let (state, _) = feed(tokens.clone(), &SectionGate::default());
        assert_eq!(state, ParserState::InSection("modify".to_string()));

        let mut tokens = tokens;
        tokens.push(Token::end("modify"));
        let (state, _) = feed(tokens, &SectionGate::default());
        assert_eq!(state, ParserState::Scanning);
    }

    #[test]
    fn unrelated_children_do_not_end_the_node() {
        let mut tokens = vec![
            Token::start("delete", Vec::<(String, String)>::new()),
            node_start("5"),
            Token::start("extra", Vec::<(String, String)>::new()),
            Token::Other,
            Token::end("extra"),
        ];
        tokens.extend(tag("shop", "florist"));
        let (state, completed) = feed(tokens.clone(), &SectionGate::default());
        assert!(matches!(state, ParserState::InNode(_)));
        assert!(completed.is_empty());

        let mut tokens = tokens;
        tokens.push(Token::end("node"));
        let (_, completed) = feed(tokens, &SectionGate::default());
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].tags.get("shop").map(String::as_str), Some("florist"));
    }

    #[test]
    fn tag_map_is_scoped_to_one_node() {
        let mut tokens = vec![Token::start("create", Vec::<(String, String)>::new()), node_start("1")];
        tokens.extend(tag("shop", "bakery"));
        tokens.push(Token::end("node"));
        tokens.push(node_start("2"));
        tokens.push(Token::end("node"));
        let (_, completed) = feed(tokens, &SectionGate::default());
        assert_eq!(completed.len(), 2);
        assert!(completed[1].tags.is_empty());
    }

    #[test]
    fn extra_sections_are_tracked_when_registered() {
        let tokens = vec![
            Token::start("renumber", Vec::<(String, String)>::new()),
            node_start("3"),
            Token::end("node"),
        ];
        let (_, completed) = feed(tokens.clone(), &SectionGate::default());
        assert!(completed.is_empty());

        let (_, completed) = feed(tokens, &SectionGate::new(["renumber"]));
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].section, "renumber");
    }

    #[test]
    fn open_node_is_truncated_at_end_of_stream() {
        let tokens = vec![Token::start("create", Vec::<(String, String)>::new()), node_start("9")];
        let (state, _) = feed(tokens, &SectionGate::default());
        let node = finish_stream(state).unwrap();
        assert_eq!(node.attributes, Err(crate::error::FaultReason::Truncated));
        assert!(finish_stream(ParserState::Scanning).is_none());
    }

    #[test]
    fn run_twice_does_no_extra_work() {
        let xml = r#"<osmChange><create><node id="1" version="1" changeset="1" timestamp="2021-01-01T00:00:00Z" lon="1.0" lat="2.0"><tag k="shop" v="kiosk"/></node></create></osmChange>"#;
        let mut parser = ChangesetParser::from_xml(xml, ParserOptions::default());
        assert_eq!(parser.run().unwrap().created().len(), 1);
        assert_eq!(parser.run().unwrap().created().len(), 1);
    }

    #[test]
    fn clear_empties_buckets_and_releases_stream() {
        let xml = r#"<osmChange><create><node id="1" version="1" changeset="1" timestamp="2021-01-01T00:00:00Z" lon="1.0" lat="2.0"><tag k="shop" v="kiosk"/></node></create></osmChange>"#;
        let mut parser = ChangesetParser::from_xml(xml, ParserOptions::default());
        parser.run().unwrap();
        parser.clear();
        assert!(parser.created().is_empty());
        assert_eq!(parser.run().unwrap().total(), 0);
    }

    #[test]
    fn clear_before_run_means_nothing_is_parsed() {
        let xml = r#"<osmChange><create><node id="1" version="1" changeset="1" timestamp="2021-01-01T00:00:00Z" lon="1.0" lat="2.0"><tag k="shop" v="kiosk"/></node></create></osmChange>"#;
        let mut parser = ChangesetParser::from_xml(xml, ParserOptions::default());
        parser.clear();
        assert_eq!(parser.run().unwrap().total(), 0);
    }
}
