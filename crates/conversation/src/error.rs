pub use contextd_vector_store::VectorStoreError as ConversationError;
pub type Result<T> = std::result::Result<T, ConversationError>;
