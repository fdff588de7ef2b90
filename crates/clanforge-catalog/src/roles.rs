//! Role families
//!
//! Roles come in three families:
//! - **clan position** (`Leader`, `Co-Leader`, `Elder`, `Member`) mirror the
//!   in-game clan hierarchy
//! - **tier** roles (`Tier 1` … `Tier 20`) are parametrized by a level and
//!   carry no clan-position semantics
//! - **purpose** roles (`War Ready`, `Recruiter`, ...) tag members for a job
//!
//! A [`RoleSetRequest`] picks families (and a tier range) and expands to the
//! ordered list of [`RoleSpec`]s to reconcile.

use crate::error::CatalogError;
use clanforge_graph::{NewRole, Permissions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

/// Highest supported tier level
pub const MAX_TIER: u8 = 20;

/// Role family tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoleFamily {
    /// Leader, Co-Leader, Elder and Member
    ClanPosition,
    /// Numbered tier roles
    Tier,
    /// Job-tag roles
    Purpose,
}

impl RoleFamily {
    /// All families in hierarchy order
    pub const ALL: [RoleFamily; 3] = [Self::ClanPosition, Self::Purpose, Self::Tier];

    /// Stable option key
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::ClanPosition => "clan-position",
            Self::Tier => "tier",
            Self::Purpose => "purpose",
        }
    }

    /// Parse an option key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for RoleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// In-game clan position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClanPosition {
    /// Clan leader
    Leader,
    /// Co-leader
    CoLeader,
    /// Elder
    Elder,
    /// Member
    Member,
}

/// Job-tag roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Purpose {
    /// Opted in to wars
    WarReady,
    /// Recruits new members
    Recruiter,
    /// Runs clan events
    EventHost,
    /// Visitor from another clan
    Guest,
}

/// What a role stands for inside its family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "family", content = "value")]
pub enum RoleRank {
    /// Clan position
    Position(ClanPosition),
    /// Tier level, 1 is lowest
    Tier(u8),
    /// Purpose tag
    Purpose(Purpose),
}

/// Desired role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    /// Display name
    pub name: String,
    /// RGB packed as `0xRRGGBB`
    pub color: u32,
    /// Role-level permissions
    pub permissions: Permissions,
    /// Family and rank
    pub rank: RoleRank,
    /// Shown separately in the member list
    #[serde(default)]
    pub hoist: bool,
    /// Anyone may mention the role
    #[serde(default)]
    pub mentionable: bool,
    /// Alternative names that count as this role being present
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl RoleSpec {
    /// Family this role belongs to
    #[inline]
    #[must_use]
    pub fn family(&self) -> RoleFamily {
        match self.rank {
            RoleRank::Position(_) => RoleFamily::ClanPosition,
            RoleRank::Tier(_) => RoleFamily::Tier,
            RoleRank::Purpose(_) => RoleFamily::Purpose,
        }
    }

    /// Color as `#RRGGBB`
    #[must_use]
    pub fn color_hex(&self) -> String {
        format!("#{:06X}", self.color & 0x00FF_FFFF)
    }

    /// Creation request for the platform
    #[must_use]
    pub fn to_new_role(&self) -> NewRole {
        NewRole {
            name: self.name.clone(),
            color: self.color,
            permissions: self.permissions,
            hoist: self.hoist,
            mentionable: self.mentionable,
        }
    }
}

/// Spec for a clan-position role
#[must_use]
pub fn position_role(position: ClanPosition) -> RoleSpec {
    let (name, color, permissions, aliases): (&str, u32, Permissions, &[&str]) = match position {
        ClanPosition::Leader => (
            "Leader",
            0x00E7_4C3C,
            Permissions::MEMBER_BASE
                | Permissions::MODERATE
                | Permissions::MANAGE_CHANNELS
                | Permissions::MANAGE_ROLES
                | Permissions::KICK_MEMBERS
                | Permissions::BAN_MEMBERS,
            &["clan-leader", "leaders"],
        ),
        ClanPosition::CoLeader => (
            "Co-Leader",
            0x00E6_7E22,
            Permissions::MEMBER_BASE
                | Permissions::MODERATE
                | Permissions::MANAGE_CHANNELS
                | Permissions::KICK_MEMBERS,
            &["coleader", "co-leaders", "vice-leader"],
        ),
        ClanPosition::Elder => (
            "Elder",
            0x00F1_C40F,
            Permissions::MEMBER_BASE | Permissions::MANAGE_THREADS,
            &["elders"],
        ),
        ClanPosition::Member => (
            "Member",
            0x002E_CC71,
            Permissions::MEMBER_BASE,
            &["members", "clan-member"],
        ),
    };
    RoleSpec {
        name: name.to_string(),
        color,
        permissions,
        rank: RoleRank::Position(position),
        hoist: true,
        mentionable: matches!(position, ClanPosition::Leader | ClanPosition::CoLeader),
        aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
    }
}

/// Spec for a purpose role
#[must_use]
pub fn purpose_role(purpose: Purpose) -> RoleSpec {
    let (name, color, aliases): (&str, u32, &[&str]) = match purpose {
        Purpose::WarReady => ("War Ready", 0x00C0_392B, &["war-ready", "warready"]),
        Purpose::Recruiter => ("Recruiter", 0x0034_98DB, &["recruiters"]),
        Purpose::EventHost => ("Event Host", 0x009B_59B6, &["events", "event-hosts"]),
        Purpose::Guest => ("Guest", 0x0095_A5A6, &["guests", "visitor"]),
    };
    let permissions = match purpose {
        Purpose::Guest => Permissions::READ | Permissions::ADD_REACTIONS,
        Purpose::EventHost => Permissions::MEMBER_BASE | Permissions::MENTION_EVERYONE,
        Purpose::WarReady | Purpose::Recruiter => Permissions::MEMBER_BASE,
    };
    RoleSpec {
        name: name.to_string(),
        color,
        permissions,
        rank: RoleRank::Purpose(purpose),
        hoist: false,
        mentionable: !matches!(purpose, Purpose::Guest),
        aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
    }
}

/// Spec for a tier role
///
/// # Errors
/// `CatalogError::InvalidTierLevel` if `level` is outside `1..=MAX_TIER`.
pub fn tier_role(level: u8) -> Result<RoleSpec, CatalogError> {
    if level == 0 || level > MAX_TIER {
        return Err(CatalogError::InvalidTierLevel {
            level,
            max: MAX_TIER,
        });
    }
    Ok(RoleSpec {
        name: format!("Tier {level}"),
        color: tier_color(level),
        permissions: Permissions::empty(),
        rank: RoleRank::Tier(level),
        hoist: false,
        mentionable: false,
        aliases: vec![format!("T{level}"), format!("Level {level}")],
    })
}

/// Interpolate from slate (tier 1) to gold (top tier)
fn tier_color(level: u8) -> u32 {
    const LOW: [u32; 3] = [0x95, 0xA5, 0xA6];
    const HIGH: [u32; 3] = [0xF1, 0xC4, 0x0F];
    let t = u32::from(level.saturating_sub(1));
    let span = u32::from(MAX_TIER - 1);
    let mix = |lo: u32, hi: u32| {
        if hi >= lo {
            lo + (hi - lo) * t / span
        } else {
            lo - (lo - hi) * t / span
        }
    };
    (mix(LOW[0], HIGH[0]) << 16) | (mix(LOW[1], HIGH[1]) << 8) | mix(LOW[2], HIGH[2])
}

/// Which role families to provision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSetRequest {
    /// Families to include
    pub families: BTreeSet<RoleFamily>,
    /// Tier levels, inclusive
    pub tier_levels: RangeInclusive<u8>,
}

impl RoleSetRequest {
    /// Request with no families
    #[must_use]
    pub fn empty() -> Self {
        Self {
            families: BTreeSet::new(),
            tier_levels: 1..=MAX_TIER,
        }
    }

    /// Request with one family added
    #[must_use]
    pub fn with_family(mut self, family: RoleFamily) -> Self {
        self.families.insert(family);
        self
    }

    /// With tier level range
    #[must_use]
    pub fn with_tiers(mut self, levels: RangeInclusive<u8>) -> Self {
        self.tier_levels = levels;
        self
    }

    /// Expand into role specs in hierarchy order (highest first)
    ///
    /// Order: clan positions (Leader down to Member), purposes, then tiers
    /// from the highest level down.
    ///
    /// # Errors
    /// `CatalogError::InvalidTierLevel` if the tier range leaves `1..=MAX_TIER`.
    pub fn expand(&self) -> Result<Vec<RoleSpec>, CatalogError> {
        let mut roles = Vec::new();
        if self.families.contains(&RoleFamily::ClanPosition) {
            roles.extend(
                [
                    ClanPosition::Leader,
                    ClanPosition::CoLeader,
                    ClanPosition::Elder,
                    ClanPosition::Member,
                ]
                .into_iter()
                .map(position_role),
            );
        }
        if self.families.contains(&RoleFamily::Purpose) {
            roles.extend(
                [
                    Purpose::WarReady,
                    Purpose::Recruiter,
                    Purpose::EventHost,
                    Purpose::Guest,
                ]
                .into_iter()
                .map(purpose_role),
            );
        }
        if self.families.contains(&RoleFamily::Tier) {
            for level in self.tier_levels.clone().rev() {
                roles.push(tier_role(level)?);
            }
        }
        Ok(roles)
    }
}

impl Default for RoleSetRequest {
    fn default() -> Self {
        Self::empty().with_family(RoleFamily::ClanPosition)
    }
}
