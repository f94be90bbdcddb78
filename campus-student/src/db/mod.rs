//! Table access for campus-student
//!
//! One module per table group, each a set of plain async functions over a
//! `SqlitePool`. Services depend on these functions only.

pub mod assessments;
pub mod attendance;
pub mod batches;
pub mod centers;
pub mod enrollments;
pub mod events;
pub mod lock_wait;
pub mod lsrw;
pub mod materials;
pub mod merge_groups;
pub mod notifications;
pub mod payment_locks;
pub mod payments;
pub mod students;

/// `?, ?, ?` for an `IN (...)` list of `n` bound values
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
        assert_eq!(placeholders(0), "");
    }
}
