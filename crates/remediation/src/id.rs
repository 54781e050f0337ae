use ulid::Ulid;

pub const REMEDIATION_ID_PREFIX: &str = "rem_";

pub fn new_remediation_id() -> String {
    format!("{REMEDIATION_ID_PREFIX}{}", Ulid::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_carries_prefix_and_a_valid_ulid() {
        let id = new_remediation_id();
        let rest = id.strip_prefix(REMEDIATION_ID_PREFIX).unwrap();
        assert!(Ulid::from_string(rest).is_ok());
    }
}
