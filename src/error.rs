use thiserror::Error;

/// Errors raised while configuring a container.
///
/// Container operations themselves never fail; duplicates and misses are
/// reported through their return values.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A cuckoo table needs at least one hash function to place anything
    #[error("hash family provides no hash functions")]
    EmptyHashFamily,
}
