use ulid::Ulid;

pub const CHECKPOINT_ID_PREFIX: &str = "ckpt_";

/// A time-sortable checkpoint id: lexicographic order matches creation
/// order, so checkpoints saved sequentially within a session list back out
/// in save order (spec's ordering guarantee) without needing a separate
/// sequence column.
pub fn new_checkpoint_id() -> String {
    format!("{CHECKPOINT_ID_PREFIX}{}", Ulid::new())
}

pub fn is_checkpoint_id(id: &str) -> bool {
    id.strip_prefix(CHECKPOINT_ID_PREFIX)
        .map(|rest| Ulid::from_string(rest).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_lexicographically_sortable_with_creation_order() {
        let first = new_checkpoint_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = new_checkpoint_id();
        assert!(first < second);
    }

    #[test]
    fn validates_prefix_and_ulid_body() {
        assert!(is_checkpoint_id(&new_checkpoint_id()));
        assert!(!is_checkpoint_id("not-a-checkpoint-id"));
        assert!(!is_checkpoint_id("ckpt_not-a-ulid"));
    }
}
