//! Cross-faction visibility policy
//!
//! Single source of truth for who may see whom in directory results and
//! notification targeting. This is an information-isolation invariant,
//! not a presentation concern: every place directory entries are
//! filtered must go through [`visible`].
//!
//! | viewer | sees Red | sees Blue | sees White |
//! |--------|----------|-----------|------------|
//! | White  | yes      | yes       | yes        |
//! | Red    | yes      | no        | yes        |
//! | Blue   | no       | yes       | yes        |

use crate::identity::{DirectoryEntry, Role};

/// Decide whether a viewer with `viewer` role may see a directory entry
/// with `candidate` role.
pub fn visible(viewer: Role, candidate: Role) -> bool {
    match (viewer, candidate) {
        (Role::White, _) => true,
        (_, Role::White) => true,
        (Role::Red, Role::Red) => true,
        (Role::Blue, Role::Blue) => true,
        (Role::Red, Role::Blue) | (Role::Blue, Role::Red) => false,
    }
}

/// Filter a directory result set down to the entries the viewer may see.
pub fn filter_directory(viewer: Role, entries: Vec<DirectoryEntry>) -> Vec<DirectoryEntry> {
    entries
        .into_iter()
        .filter(|entry| visible(viewer, entry.role))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::UserId;

    fn entry(id: &str, role: Role) -> DirectoryEntry {
        DirectoryEntry {
            id: UserId::new(id),
            name: id.to_string(),
            department: "ops".to_string(),
            role,
        }
    }

    #[test]
    fn every_role_sees_itself() {
        for role in [Role::Red, Role::Blue, Role::White] {
            assert!(visible(role, role));
        }
    }

    #[test]
    fn red_and_blue_are_mutually_invisible() {
        assert!(!visible(Role::Red, Role::Blue));
        assert!(!visible(Role::Blue, Role::Red));
    }

    #[test]
    fn white_sees_and_is_seen_by_everyone() {
        for role in [Role::Red, Role::Blue, Role::White] {
            assert!(visible(Role::White, role));
            assert!(visible(role, Role::White));
        }
    }

    #[test]
    fn red_viewer_sees_red_union_white() {
        let entries = vec![
            entry("r1", Role::Red),
            entry("r2", Role::Red),
            entry("b1", Role::Blue),
            entry("b2", Role::Blue),
            entry("w1", Role::White),
            entry("w2", Role::White),
        ];

        let filtered = filter_directory(Role::Red, entries);
        assert_eq!(filtered.len(), 4);
        assert!(filtered.iter().all(|e| e.role != Role::Blue));
    }
}
