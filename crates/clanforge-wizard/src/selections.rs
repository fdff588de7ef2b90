//! Accumulated wizard choices

use crate::error::SessionError;
use clanforge_catalog::{RoleFamily, RoleSetRequest, MAX_TIER};
use clanforge_reconcile::PermissionPolicy;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

/// Bot feature bound to a channel after provisioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Post war results
    WarLog,
    /// Remind members before war ends
    WarReminders,
    /// Report member activity
    MemberActivity,
    /// Relay clan announcements
    Announcements,
}

impl Feature {
    /// Every feature
    pub const ALL: [Feature; 4] = [
        Self::WarLog,
        Self::WarReminders,
        Self::MemberActivity,
        Self::Announcements,
    ];

    /// Stable key used in actions and storage
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::WarLog => "war-log",
            Self::WarReminders => "war-reminders",
            Self::MemberActivity => "member-activity",
            Self::Announcements => "announcements",
        }
    }

    /// Feature with this key
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Display label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::WarLog => "War log feed",
            Self::WarReminders => "War reminders",
            Self::MemberActivity => "Member activity log",
            Self::Announcements => "Clan announcements",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

static CLAN_TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^#[0289PYLQGRJCUV]{3,12}$").ok());

/// Normalize and validate a clan tag (`#` plus 3-12 tag characters)
///
/// Accepts lowercase input and a missing `#`; the letter `O` is read as
/// zero.
///
/// # Errors
/// `SessionError::InvalidInput` if the tag does not match.
pub fn parse_clan_tag(raw: &str) -> Result<String, SessionError> {
    let trimmed = raw.trim().to_uppercase().replace('O', "0");
    let tag = if trimmed.starts_with('#') {
        trimmed
    } else {
        format!("#{trimmed}")
    };
    match CLAN_TAG.as_ref() {
        Some(pattern) if pattern.is_match(&tag) => Ok(tag),
        _ => Err(SessionError::invalid_input(format!(
            "`{}` is not a valid clan tag",
            raw.trim()
        ))),
    }
}

/// Parse a tier range option: `tiers:LO-HI` or `tiers:HI` (meaning `1-HI`)
///
/// # Errors
/// `SessionError::InvalidInput` for malformed or out-of-range input.
pub fn parse_tier_range(option: &str) -> Result<RangeInclusive<u8>, SessionError> {
    let invalid = || SessionError::invalid_input(format!("`{option}` is not a tier range"));
    let spec = option.strip_prefix("tiers:").ok_or_else(invalid)?;
    let (lo, hi) = match spec.split_once('-') {
        Some((lo, hi)) => (lo.parse::<u8>(), hi.parse::<u8>()),
        None => (Ok(1), spec.parse::<u8>()),
    };
    let (lo, hi) = (lo.map_err(|_| invalid())?, hi.map_err(|_| invalid())?);
    if lo == 0 || lo > hi || hi > MAX_TIER {
        return Err(SessionError::invalid_input(format!(
            "tier range must lie within 1-{MAX_TIER}"
        )));
    }
    Ok(lo..=hi)
}

/// Everything chosen so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    /// Linked clan tag
    pub clan_tag: Option<String>,
    /// Structure template name
    pub template: String,
    /// Role families to create
    pub role_families: BTreeSet<RoleFamily>,
    /// Tier levels, inclusive
    pub tier_levels: RangeInclusive<u8>,
    /// Overwrite policy
    pub policy: PermissionPolicy,
    /// Features to bind
    pub features: BTreeSet<Feature>,
}

impl Selections {
    /// Defaults with `template` preselected
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            clan_tag: None,
            template: template.into(),
            role_families: BTreeSet::from([RoleFamily::ClanPosition]),
            tier_levels: 1..=10,
            policy: PermissionPolicy::default(),
            features: BTreeSet::from([Feature::WarLog, Feature::Announcements]),
        }
    }

    /// Role set described by the family and tier choices
    #[must_use]
    pub fn role_request(&self) -> RoleSetRequest {
        self.role_families
            .iter()
            .fold(RoleSetRequest::empty(), |req, family| req.with_family(*family))
            .with_tiers(self.tier_levels.clone())
    }

    /// Flip a family; returns whether it is now selected
    pub fn toggle_family(&mut self, family: RoleFamily) -> bool {
        toggle(&mut self.role_families, family)
    }

    /// Flip a feature; returns whether it is now selected
    pub fn toggle_feature(&mut self, feature: Feature) -> bool {
        toggle(&mut self.features, feature)
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, item: T) -> bool {
    if set.remove(&item) {
        false
    } else {
        set.insert(item);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clan_tags_normalize() {
        assert_eq!(parse_clan_tag("#2pp").unwrap(), "#2PP");
        assert_eq!(parse_clan_tag(" 8qu8j9lp ").unwrap(), "#8QU8J9LP");
        assert_eq!(parse_clan_tag("#pOq").unwrap(), "#P0Q");
    }

    #[test]
    fn bad_clan_tags_rejected() {
        for raw in ["", "#", "#AB", "#2P", "#2PPPPPPPPPPPP", "#2PX", "hello world"] {
            assert!(parse_clan_tag(raw).is_err(), "{raw}");
        }
    }

    #[test]
    fn tier_ranges() {
        assert_eq!(parse_tier_range("tiers:5").unwrap(), 1..=5);
        assert_eq!(parse_tier_range("tiers:3-8").unwrap(), 3..=8);
        assert!(parse_tier_range("tiers:0-3").is_err());
        assert!(parse_tier_range("tiers:8-3").is_err());
        assert!(parse_tier_range("tiers:1-21").is_err());
        assert!(parse_tier_range("levels:3").is_err());
    }

    #[test]
    fn toggling_twice_restores() {
        let mut sel = Selections::new("standard");
        let before = sel.clone();
        assert!(sel.toggle_family(RoleFamily::Tier));
        assert!(!sel.toggle_family(RoleFamily::Tier));
        assert_eq!(sel, before);
    }

    #[test]
    fn role_request_follows_selection() {
        let mut sel = Selections::new("standard");
        sel.toggle_family(RoleFamily::Tier);
        sel.tier_levels = 1..=3;
        let roles = sel.role_request().expand().unwrap();
        // 4 positions + 3 tiers
        assert_eq!(roles.len(), 7);
    }
}
