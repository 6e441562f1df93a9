use crate::{Error, PathQuery, Queryable, Segment};

impl PathQuery {
    /// Walk `root` one segment at a time, returning the node the query points to.
    pub fn evaluate<'q>(&self, root: &'q dyn Queryable) -> Result<&'q dyn Queryable, Error> {
        let mut current = root;
        for segment in &self.segments {
            current = match segment {
                Segment::Index(i) => {
                    let len = current
                        .seq_len()
                        .ok_or_else(|| self.lookup_error(segment, "value is not a sequence"))?;
                    let index = resolve_index(*i, len).ok_or_else(|| {
                        self.lookup_error(
                            segment,
                            &format!("index out of range for sequence of length {len}"),
                        )
                    })?;
                    current
                        .item(index)
                        .ok_or_else(|| self.lookup_error(segment, "item not found"))?
                }
                Segment::Attr(name) => {
                    if !current.has_attrs() {
                        return Err(self.lookup_error(segment, "value has no named fields"));
                    }
                    current
                        .attr(name)
                        .ok_or_else(|| self.lookup_error(segment, "no such field"))?
                }
            };
        }
        Ok(current)
    }

    fn lookup_error(&self, segment: &Segment, reason: &str) -> Error {
        log::trace!("lookup of {segment} in {} failed: {reason}", self.text);
        Error::Lookup {
            segment: segment.to_string(),
            query: self.text.clone(),
            reason: reason.to_owned(),
        }
    }
}

/// Map a possibly-negative index onto `0..len`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    if index < 0 {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        len.checked_sub(back)
    } else {
        let index = usize::try_from(index).ok()?;
        (index < len).then_some(index)
    }
}
