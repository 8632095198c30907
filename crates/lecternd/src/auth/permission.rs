//! The permission model: a total order over roles plus a public wildcard.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Role carried by a verified identity.
///
/// Roles form a strict hierarchy: `Guest < User < Admin`. The numeric ranks
/// are fixed; new roles must slot into the order explicitly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    /// Anonymous identity established from a guest token.
    Guest,
    /// Registered account.
    User,
    /// Administrative account.
    Admin,
}

impl Role {
    fn rank(self) -> u8 {
        match self {
            Self::Guest => 1,
            Self::User => 2,
            Self::Admin => 3,
        }
    }
}

/// Minimum privilege tier an operation demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Requirement {
    /// Satisfied by every role.
    Public,
    /// Satisfied by guest and above.
    Guest,
    /// Satisfied by user and admin.
    User,
    /// Satisfied by admin only.
    Admin,
}

/// Answers whether `role` satisfies `requirement`.
///
/// Guest and user tiers use the hierarchy comparison; the admin tier is an
/// exact match. The top tier is sealed: a hypothetical role above admin
/// would not satisfy it through the generic `>=` rule.
#[must_use]
pub fn has_permission(role: Role, requirement: Requirement) -> bool {
    match requirement {
        Requirement::Public => true,
        Requirement::Guest => role.rank() >= Role::Guest.rank(),
        Requirement::User => role.rank() >= Role::User.rank(),
        Requirement::Admin => role == Role::Admin,
    }
}

/// Answers whether `role` satisfies any of `requirements` (OR semantics).
///
/// An operation may be reachable by multiple independent privilege levels;
/// one satisfied requirement is enough. An empty list denies everyone.
#[must_use]
pub fn check_any(role: Role, requirements: &[Requirement]) -> bool {
    requirements
        .iter()
        .any(|requirement| has_permission(role, *requirement))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Role::Guest, Requirement::Public, true)]
    #[case(Role::Guest, Requirement::Guest, true)]
    #[case(Role::Guest, Requirement::User, false)]
    #[case(Role::Guest, Requirement::Admin, false)]
    #[case(Role::User, Requirement::Public, true)]
    #[case(Role::User, Requirement::Guest, true)]
    #[case(Role::User, Requirement::User, true)]
    #[case(Role::User, Requirement::Admin, false)]
    #[case(Role::Admin, Requirement::Public, true)]
    #[case(Role::Admin, Requirement::Guest, true)]
    #[case(Role::Admin, Requirement::User, true)]
    #[case(Role::Admin, Requirement::Admin, true)]
    fn permission_matrix(
        #[case] role: Role,
        #[case] requirement: Requirement,
        #[case] expected: bool,
    ) {
        assert_eq!(has_permission(role, requirement), expected);
    }

    #[test]
    fn check_any_uses_or_semantics() {
        assert!(check_any(
            Role::Guest,
            &[Requirement::Admin, Requirement::Guest]
        ));
        assert!(!check_any(Role::User, &[Requirement::Admin]));
    }

    #[test]
    fn empty_requirement_list_denies_everyone() {
        assert!(!check_any(Role::Admin, &[]));
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!("ADMIN".parse::<Role>().ok(), Some(Role::Admin));
        assert_eq!("guest".parse::<Role>().ok(), Some(Role::Guest));
        assert!("owner".parse::<Role>().is_err());
    }
}
