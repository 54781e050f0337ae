pub use contextd_vector_store::VectorStoreError as ReasoningBankError;
pub type Result<T> = std::result::Result<T, ReasoningBankError>;
