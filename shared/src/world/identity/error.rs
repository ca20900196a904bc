use thiserror::Error;

/// Identity mapping failures.
///
/// Every variant is an invariant violation: the bidirectional map can never
/// hold two records for the same handle or the same reference, so reaching
/// one of these means the incoming protocol stream is corrupted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The local handle is already bound to a different global reference
    #[error("LocalId {local_id} is already mapped to {existing}, cannot map it to {requested}")]
    ConflictingLocalId {
        local_id: String,
        existing: String,
        requested: String,
    },

    /// The global reference is already bound to a different local handle
    #[error("GlobalRef {global_ref} is already mapped to {existing}, cannot map it to {requested}")]
    ConflictingGlobalRef {
        global_ref: String,
        existing: String,
        requested: String,
    },

    /// The entity id is not a valid fabric entity id
    #[error("Cannot assign identities for invalid entity id {entity_id}")]
    InvalidEntityId { entity_id: i64 },
}
