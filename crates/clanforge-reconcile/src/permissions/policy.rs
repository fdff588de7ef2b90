//! Permission policies
//!
//! A policy is a static table from [`SubjectClass`] to a base [`Grant`].
//! Classes group roles by what they mean for channel access rather than by
//! name, so the same table applies to every template.

use clanforge_catalog::{ClanPosition, RoleRank, RoleSpec};
use clanforge_graph::Permissions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named permission policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionPolicy {
    /// Everyone reads, members talk, leadership moderates
    #[default]
    PermissiveHierarchical,
    /// Hidden from everyone except clan roles
    RestrictiveHierarchical,
    /// Everyone reads and talks; leadership only moderates
    OpenAccess,
}

impl PermissionPolicy {
    /// All policies in display order
    pub const ALL: [PermissionPolicy; 3] = [
        Self::PermissiveHierarchical,
        Self::RestrictiveHierarchical,
        Self::OpenAccess,
    ];

    /// Stable option key
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::PermissiveHierarchical => "permissive-hierarchical",
            Self::RestrictiveHierarchical => "restrictive-hierarchical",
            Self::OpenAccess => "open-access",
        }
    }

    /// Parse an option key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Human-readable label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::PermissiveHierarchical => "Permissive (hierarchical)",
            Self::RestrictiveHierarchical => "Restrictive (hierarchical)",
            Self::OpenAccess => "Open access",
        }
    }
}

impl fmt::Display for PermissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Access class of an overwrite subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubjectClass {
    /// The implicit everyone role
    Everyone,
    /// Leader and Co-Leader
    Leadership,
    /// Elder
    Elder,
    /// Member
    Member,
    /// Purpose roles (War Ready, Recruiter, ...)
    Purpose,
    /// Tier roles
    Tier,
}

impl SubjectClass {
    /// Classes in evaluation order
    pub const ALL: [SubjectClass; 6] = [
        Self::Everyone,
        Self::Leadership,
        Self::Elder,
        Self::Member,
        Self::Purpose,
        Self::Tier,
    ];

    /// Class of a role spec
    #[must_use]
    pub fn of(spec: &RoleSpec) -> Self {
        match spec.rank {
            RoleRank::Position(ClanPosition::Leader | ClanPosition::CoLeader) => Self::Leadership,
            RoleRank::Position(ClanPosition::Elder) => Self::Elder,
            RoleRank::Position(ClanPosition::Member) => Self::Member,
            RoleRank::Purpose(_) => Self::Purpose,
            RoleRank::Tier(_) => Self::Tier,
        }
    }
}

impl fmt::Display for SubjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Everyone => "everyone",
            Self::Leadership => "leadership",
            Self::Elder => "elder",
            Self::Member => "member",
            Self::Purpose => "purpose",
            Self::Tier => "tier",
        };
        f.write_str(s)
    }
}

/// Allow/deny pair under construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Grant {
    /// Permissions granted
    pub allow: Permissions,
    /// Permissions denied
    pub deny: Permissions,
}

impl Grant {
    /// Grant allowing `bits`
    #[inline]
    #[must_use]
    pub const fn allow(bits: Permissions) -> Self {
        Self {
            allow: bits,
            deny: Permissions::empty(),
        }
    }

    /// Grant denying `bits`
    #[inline]
    #[must_use]
    pub const fn deny(bits: Permissions) -> Self {
        Self {
            allow: Permissions::empty(),
            deny: bits,
        }
    }

    /// Add denied bits
    #[inline]
    #[must_use]
    pub const fn and_deny(mut self, bits: Permissions) -> Self {
        self.deny = self.deny.union(bits);
        self
    }

    /// Overlay `patch`: its allow bits leave deny, its deny bits leave allow
    #[must_use]
    pub fn overlay(self, patch: Grant) -> Self {
        let allow = (self.allow | patch.allow) - patch.deny;
        let deny = (self.deny | patch.deny) - patch.allow;
        Self { allow, deny }
    }

    /// Whether the grant sets nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

/// Base grant for `class` under `policy`
#[must_use]
pub fn base_grant(policy: PermissionPolicy, class: SubjectClass) -> Grant {
    use PermissionPolicy as P;
    use SubjectClass as S;

    let talk = Permissions::CHAT | Permissions::VOICE;
    match (policy, class) {
        (P::PermissiveHierarchical, S::Everyone) => Grant::allow(Permissions::READ),
        (P::PermissiveHierarchical, S::Member) => Grant::allow(talk),
        (P::PermissiveHierarchical, S::Elder) => Grant::allow(talk | Permissions::MANAGE_THREADS),
        (P::PermissiveHierarchical, S::Leadership) => Grant::allow(talk | Permissions::MODERATE),
        (P::PermissiveHierarchical, S::Purpose) => Grant::allow(Permissions::CHAT),

        (P::RestrictiveHierarchical, S::Everyone) => {
            Grant::deny(Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES)
        }
        (P::RestrictiveHierarchical, S::Member) => Grant::allow(
            Permissions::READ
                | Permissions::SEND_MESSAGES
                | Permissions::ADD_REACTIONS
                | Permissions::VOICE,
        ),
        (P::RestrictiveHierarchical, S::Elder) => {
            Grant::allow(Permissions::READ | talk | Permissions::MANAGE_THREADS)
        }
        (P::RestrictiveHierarchical, S::Leadership) => {
            Grant::allow(Permissions::READ | talk | Permissions::MODERATE)
        }
        (P::RestrictiveHierarchical, S::Purpose) => Grant::allow(Permissions::READ),

        (P::OpenAccess, S::Everyone) => Grant::allow(Permissions::READ | talk),
        (P::OpenAccess, S::Leadership) => {
            Grant::allow(Permissions::MANAGE_MESSAGES | Permissions::MENTION_EVERYONE)
        }

        _ => Grant::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clanforge_catalog::{position_role, purpose_role, tier_role, Purpose};

    #[test]
    fn subject_classes() {
        assert_eq!(SubjectClass::of(&position_role(ClanPosition::Leader)), SubjectClass::Leadership);
        assert_eq!(SubjectClass::of(&position_role(ClanPosition::CoLeader)), SubjectClass::Leadership);
        assert_eq!(SubjectClass::of(&position_role(ClanPosition::Member)), SubjectClass::Member);
        assert_eq!(SubjectClass::of(&purpose_role(Purpose::Guest)), SubjectClass::Purpose);
        assert_eq!(SubjectClass::of(&tier_role(4).unwrap()), SubjectClass::Tier);
    }

    #[test]
    fn permissive_is_the_default_policy() {
        assert_eq!(PermissionPolicy::default(), PermissionPolicy::PermissiveHierarchical);
        assert_eq!(PermissionPolicy::ALL[0], PermissionPolicy::default());
    }

    #[test]
    fn overlay_moves_conflicting_bits() {
        let base = Grant::allow(Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES);
        let patched = base.overlay(Grant::deny(Permissions::SEND_MESSAGES));
        assert_eq!(patched.allow, Permissions::VIEW_CHANNEL);
        assert_eq!(patched.deny, Permissions::SEND_MESSAGES);

        let back = patched.overlay(Grant::allow(Permissions::SEND_MESSAGES));
        assert_eq!(back, base);
    }

    #[test]
    fn tiers_get_nothing_by_default() {
        for policy in PermissionPolicy::ALL {
            assert!(base_grant(policy, SubjectClass::Tier).is_empty());
        }
    }

    #[test]
    fn restrictive_hides_from_everyone() {
        let g = base_grant(PermissionPolicy::RestrictiveHierarchical, SubjectClass::Everyone);
        assert!(g.deny.contains(Permissions::VIEW_CHANNEL));
        assert!(g.allow.is_empty());
    }

    #[test]
    fn policy_keys_round_trip() {
        for policy in PermissionPolicy::ALL {
            assert_eq!(PermissionPolicy::from_key(policy.key()), Some(policy));
        }
    }
}
