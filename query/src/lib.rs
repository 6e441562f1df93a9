#[macro_use]
mod macros;

/// Path-query grammar
mod parse;
pub use parse::{is_query, parse, PathQuery, Segment, QUERY_MARKER, SEGMENT_DELIM};

/// Capability interface for objects that path queries can walk
mod queryable;
pub use queryable::Queryable;

/// Evaluate parsed queries against a `Queryable`
mod eval;

/// Turn a pass spec into a mapping of extracted values
mod extract;
pub use extract::{extract, extract_all};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid path query \"{query}\" at position {pos}: {msg}")]
    InvalidQuery {
        query: String,
        pos: usize,
        msg: String,
    },
    #[error("Unable to resolve segment \"{segment}\" of \"{query}\": {reason}")]
    Lookup {
        segment: String,
        query: String,
        reason: String,
    },
}
