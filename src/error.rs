use std::path::PathBuf;

use thiserror::Error;

/// Fatal pipeline failures. Every variant aborts the whole run; the only
/// recoverable "soft failure" is the NA cell, which travels as data.
#[derive(Debug, Error)]
pub enum Error {
    /// A network link has no commune mapping. Dropping it would silently
    /// corrupt the aggregate sums, so the run stops here.
    #[error("network link `{0}` has no commune mapping")]
    UnresolvedKey(String),

    /// An adapter needed a feature a prior adapter should have produced.
    #[error("`{feature}` for commune {code} needs `{requires}` aggregated first")]
    MissingUpstreamFeature {
        code: String,
        feature: &'static str,
        requires: &'static str,
    },

    /// A zone lists a commune the aggregation never saw.
    #[error("zone {zone} lists commune {member}, which was never aggregated")]
    InconsistentMembership { zone: String, member: String },

    /// A configured input path does not point at a file.
    #[error("missing input file: {}", .0.display())]
    MissingInput(PathBuf),

    /// An NA cell reached the numeric matrix boundary.
    #[error("`{feature}` for {code} is not available; cannot project it into a numeric matrix")]
    NotAvailable { code: String, feature: String },
}
