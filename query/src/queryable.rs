use serde_json::Value;

/// Anything a path query can walk through.
///
/// Implementors expose named fields, indexed items, or neither (leaves).
/// Every node must be able to render itself as JSON, which is what ends up
/// in the extracted mapping.
pub trait Queryable {
    /// Look up a named field. `None` if the field is missing.
    fn attr(&self, _name: &str) -> Option<&dyn Queryable> {
        None
    }

    /// Whether this value has named fields at all.
    fn has_attrs(&self) -> bool {
        false
    }

    /// Number of items, if this value is sequence-like.
    fn seq_len(&self) -> Option<usize> {
        None
    }

    /// Item at a (non-negative) position.
    fn item(&self, _index: usize) -> Option<&dyn Queryable> {
        None
    }

    fn to_value(&self) -> Value;
}

impl Queryable for Value {
    fn attr(&self, name: &str) -> Option<&dyn Queryable> {
        match self {
            Value::Object(map) => map.get(name).map(|v| v as &dyn Queryable),
            _ => None,
        }
    }

    fn has_attrs(&self) -> bool {
        self.is_object()
    }

    fn seq_len(&self) -> Option<usize> {
        self.as_array().map(Vec::len)
    }

    fn item(&self, index: usize) -> Option<&dyn Queryable> {
        match self {
            Value::Array(items) => items.get(index).map(|v| v as &dyn Queryable),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl<T: Queryable> Queryable for Vec<T> {
    fn seq_len(&self) -> Option<usize> {
        Some(self.len())
    }

    fn item(&self, index: usize) -> Option<&dyn Queryable> {
        self.get(index).map(|v| v as &dyn Queryable)
    }

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Queryable::to_value).collect())
    }
}

impl Queryable for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Queryable for f64 {
    fn to_value(&self) -> Value {
        serde_json::Number::from_f64(*self)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}
