/// Location records and the registry that resolves them
mod location;
pub use location::{LocationRecord, LocationRegistry, Target, CALC_LOCS_KEY};

/// Declarative namespace mutations
mod directive;
pub use directive::{publish, Directive, MergeMode, DEFAULT_RESULT_KEY};

/// The run-scoped namespace that directives are applied to
mod store;
pub use store::{Namespace, ENV_KEY};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Could not find a location named \"{0}\"")]
    LocationNotFound(String),
    #[error("No locations have been recorded in this run")]
    EmptyRegistry,
    #[error("Cannot push onto \"{0}\": existing value is not a list")]
    NotAList(String),
    #[error("Cannot push_all to \"{0}\": value is not a list")]
    PushAllNotList(String),
    #[error("Cannot descend into \"{0}\": existing value is not a mapping")]
    NotAMapping(String),
    #[error("Key \"{0}\" not found in the run environment")]
    EnvKeyNotFound(String),
    #[error("Malformed \"{0}\" entry in namespace")]
    MalformedEntry(String),
}
