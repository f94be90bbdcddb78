//! Identifier utilities

use uuid::Uuid;

/// Generate a new row identifier (UUIDv4, hyphenated)
pub fn generate() -> String {
    Uuid::new_v4().to_string()
}

/// Parse UUID from string
pub fn parse(s: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_parseable_and_distinct() {
        let a = generate();
        let b = generate();
        assert_ne!(a, b);
        assert!(parse(&a).is_ok());
    }
}
