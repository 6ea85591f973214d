use thiserror::Error;

/// Errors surfaced by the episodic memory core.
///
/// Every variant is recoverable by the caller; the HTTP layer maps
/// `DuplicateEventId` to a conflict and everything else to a bad request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("event_id is required")]
    EventIdRequired,
    #[error("tenant_id is required")]
    TenantIdRequired,
    #[error("session_id is required")]
    SessionIdRequired,
    #[error("start_token must be non-negative")]
    StartTokenNegative,
    #[error("end_token_exclusive must be greater than start_token")]
    InvalidTokenRange,
    #[error("event_id already exists in tenant session")]
    DuplicateEventId,
    #[error("surprise threshold must be non-negative")]
    NegativeSurpriseThreshold,
    #[error("minimum boundary gap must be positive")]
    InvalidMinBoundaryGap,
    #[error("key_similarity is required")]
    SimilarityRequired,
    #[error("key_similarity must be a square matrix")]
    SimilarityNotSquare,
    #[error("key_similarity must be symmetric")]
    SimilarityAsymmetric,
    #[error("key_similarity must have non-negative weights")]
    SimilarityNegative,
    #[error("key_similarity must not contain NaN or Inf")]
    SimilarityNonFinite,
    #[error("key_similarity has non-positive total affinity")]
    NonPositiveTotalAffinity,
    #[error("key_similarity size must match surprise length")]
    SimilaritySizeMismatch,
    #[error("surprise must contain at least one value")]
    SurpriseRequired,
    #[error("boundary is outside valid token range")]
    BoundaryOutOfRange,
    #[error("boundaries must be strictly increasing")]
    BoundaryOrderInvalid,
    #[error("boundaries violate minimum boundary gap")]
    BoundaryGapInvalid,
    #[error("event id prefix is required")]
    EventIdPrefixRequired,
    #[error("top_k must be positive")]
    TopKNotPositive,
    #[error("retrieval buffers must be non-negative")]
    NegativeBuffer,
}
