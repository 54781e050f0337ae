pub use contextd_vector_store::VectorStoreError as RemediationError;
pub type Result<T> = std::result::Result<T, RemediationError>;
