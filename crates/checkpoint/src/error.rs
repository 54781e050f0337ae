pub use contextd_vector_store::VectorStoreError as CheckpointError;
pub type Result<T> = std::result::Result<T, CheckpointError>;
