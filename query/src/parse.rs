use std::fmt;

use crate::Error;

/// Prefix that marks a pass-spec string as a path query rather than a literal.
pub const QUERY_MARKER: &str = ">>";
/// Separates segments in a path query, e.g. ">>ionic_steps.-1.stress".
pub const SEGMENT_DELIM: char = '.';

/// One step of a path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Sequence index; negative values count from the end.
    Index(i64),
    /// Named field lookup.
    Attr(String),
}

impl Segment {
    /// Digits with an optional leading `-` are an index; everything else is a field name.
    fn from_text(text: &str) -> Self {
        let digits = text.strip_prefix('-').unwrap_or(text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = text.parse::<i64>() {
                return Self::Index(i);
            }
        }
        Self::Attr(text.to_owned())
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Attr(name) => f.write_str(name),
        }
    }
}

/// A parsed path query, along with the text it came from (used in error messages).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathQuery {
    pub text: String,
    pub segments: Vec<Segment>,
}

/// True if `text` should be treated as a path query.
pub fn is_query(text: &str) -> bool {
    text.starts_with(QUERY_MARKER)
}

/// Parse a full path query, including the leading marker.
pub fn parse(text: &str) -> Result<PathQuery, Error> {
    use combine::EasyParser;
    grammar::query()
        .easy_parse(text)
        .map(|(segments, _remainder)| PathQuery {
            text: text.to_owned(),
            segments,
        })
        .map_err(|e| {
            let pos = e.position.translate_position(text);
            // combine's errors borrow the input, so stringify here.
            Error::InvalidQuery {
                query: text.to_owned(),
                pos,
                msg: format!("{}", e).replace('\n', " "),
            }
        })
}

mod grammar {
    use super::{Segment, QUERY_MARKER, SEGMENT_DELIM};
    use combine::parser::char::{char, string};
    use combine::parser::range::recognize;
    use combine::{eof, satisfy, sep_by1, skip_many1, Parser};

    p! {
        segment() -> Segment, {
            recognize(skip_many1(satisfy(|c: char| c != SEGMENT_DELIM)))
                .map(|text: &'a str| Segment::from_text(text))
        }
    }

    p! {
        query() -> Vec<Segment>, {
            string(QUERY_MARKER)
                .with(sep_by1(segment(), char(SEGMENT_DELIM)))
                .skip(eof())
        }
    }
}
