//! Media module: image normalization and content fingerprints

mod fingerprint;
mod normalize;

pub use fingerprint::fingerprint;
pub use normalize::{normalize, NormalizedImage};
