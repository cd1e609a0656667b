use thiserror::Error;

/// Failures surfaced to the host's generation orchestration. None of these are
/// retried here; the host decides between aborting and rerolling the seed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// Bad static data. Fatal at load.
    #[error("malformed catalog: {0}")]
    MalformedCatalog(String),
    /// A region, location or portal names something that does not exist.
    #[error("dangling reference: {0}")]
    DanglingReference(String),
    /// A rule or option mentions an item that is neither in the catalog nor an event.
    #[error("unknown item reference: {0}")]
    UnknownItemReference(String),
    /// The entrance shuffle ran out of legal partners for this seed.
    #[error("unsatisfiable portal pairing: {0}")]
    UnsatisfiablePairing(String),
    #[error("not enough filler to make room for {0}")]
    InsufficientFiller(String),
    #[error("invalid option: {0}")]
    InvalidOption(String),
}
