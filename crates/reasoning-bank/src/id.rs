use ulid::Ulid;

pub const MEMORY_ID_PREFIX: &str = "mem_";

/// Time-sortable memory id, same scheme as checkpoint ids: lexicographic
/// order on the id tracks creation order.
pub fn new_memory_id() -> String {
    format!("{MEMORY_ID_PREFIX}{}", Ulid::new())
}

pub fn is_memory_id(id: &str) -> bool {
    id.strip_prefix(MEMORY_ID_PREFIX)
        .map(|rest| Ulid::from_string(rest).is_ok())
        .unwrap_or(false)
}
