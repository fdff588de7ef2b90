//! Channel-name classifier cascade
//!
//! An ordered list of `(predicate, patch)` pairs. Each predicate is a
//! keyword pattern over the normalized channel name; each patch overlays
//! specific bits for specific subject classes on top of the policy's base
//! grants. Classifiers are evaluated in [`CASCADE`] order and a later match
//! wins any bit conflict with an earlier one.

use super::policy::{Grant, SubjectClass};
use clanforge_graph::{normalize_name, Permissions};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Keyword class of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelClass {
    /// Announcement channels
    Announcement,
    /// Rules channels
    Rules,
    /// War log feeds
    WarLog,
    /// War planning channels
    WarPlanning,
    /// Leadership-only channels
    Admin,
}

impl fmt::Display for ChannelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Announcement => "announcement",
            Self::Rules => "rules",
            Self::WarLog => "war-log",
            Self::WarPlanning => "war-planning",
            Self::Admin => "admin",
        };
        f.write_str(s)
    }
}

type Patch = &'static [(SubjectClass, Grant)];

/// One step of the cascade
pub struct Classifier {
    /// Class assigned on match
    pub class: ChannelClass,
    pattern: Regex,
    patches: Patch,
}

impl Classifier {
    fn new(class: ChannelClass, pattern: &str, patches: Patch) -> Option<Self> {
        match Regex::new(pattern) {
            Ok(pattern) => Some(Self {
                class,
                pattern,
                patches,
            }),
            Err(e) => {
                tracing::error!(%class, error = %e, "invalid classifier pattern");
                None
            }
        }
    }

    /// Whether this classifier matches a channel name
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(&keyword_form(name))
    }

    /// Patch for one subject class, if any
    #[must_use]
    pub fn patch_for(&self, subject: SubjectClass) -> Option<Grant> {
        self.patches
            .iter()
            .find(|(class, _)| *class == subject)
            .map(|(_, grant)| *grant)
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("class", &self.class)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Normalized name with separators as spaces so `\b` splits words
fn keyword_form(name: &str) -> String {
    normalize_name(name).replace('-', " ")
}

const SEND: Permissions = Permissions::SEND_MESSAGES;
const VIEW: Permissions = Permissions::VIEW_CHANNEL;

const ANNOUNCEMENT: Patch = &[
    (SubjectClass::Everyone, Grant::deny(SEND)),
    (SubjectClass::Member, Grant::deny(SEND)),
    (SubjectClass::Elder, Grant::deny(SEND)),
    (SubjectClass::Purpose, Grant::deny(SEND)),
    (
        SubjectClass::Leadership,
        Grant::allow(SEND.union(Permissions::MENTION_EVERYONE)),
    ),
];

const RULES: Patch = &[
    (
        SubjectClass::Everyone,
        Grant::allow(Permissions::READ).and_deny(SEND.union(Permissions::ADD_REACTIONS)),
    ),
    (SubjectClass::Member, Grant::deny(SEND)),
    (SubjectClass::Elder, Grant::deny(SEND)),
    (SubjectClass::Purpose, Grant::deny(SEND)),
    (SubjectClass::Leadership, Grant::allow(SEND)),
];

const WAR_LOG: Patch = &[
    (SubjectClass::Everyone, Grant::deny(SEND)),
    (SubjectClass::Member, Grant::deny(SEND)),
    (SubjectClass::Elder, Grant::deny(SEND)),
    (SubjectClass::Purpose, Grant::deny(SEND)),
    (SubjectClass::Leadership, Grant::allow(SEND)),
];

const WAR_PLANNING: Patch = &[
    (SubjectClass::Everyone, Grant::deny(VIEW)),
    (SubjectClass::Member, Grant::allow(VIEW.union(SEND))),
    (SubjectClass::Elder, Grant::allow(VIEW.union(SEND))),
    (SubjectClass::Purpose, Grant::allow(VIEW.union(SEND))),
    (
        SubjectClass::Leadership,
        Grant::allow(VIEW.union(SEND).union(Permissions::MANAGE_MESSAGES)),
    ),
];

const ADMIN: Patch = &[
    (SubjectClass::Everyone, Grant::deny(VIEW)),
    (SubjectClass::Member, Grant::deny(VIEW)),
    (SubjectClass::Elder, Grant::deny(VIEW)),
    (SubjectClass::Purpose, Grant::deny(VIEW)),
    (
        SubjectClass::Leadership,
        Grant::allow(VIEW.union(Permissions::READ_MESSAGE_HISTORY).union(SEND)),
    ),
];

/// The cascade, in evaluation order
pub static CASCADE: Lazy<Vec<Classifier>> = Lazy::new(|| {
    [
        Classifier::new(
            ChannelClass::Announcement,
            r"\b(announce\w*|news|updates?)\b",
            ANNOUNCEMENT,
        ),
        Classifier::new(
            ChannelClass::Rules,
            r"\b(rules?|welcome|faq|info|information|roles)\b",
            RULES,
        ),
        Classifier::new(
            ChannelClass::WarLog,
            r"\b(war ?logs?|war results?|attack logs?|warlog)\b",
            WAR_LOG,
        ),
        Classifier::new(
            ChannelClass::WarPlanning,
            r"\b(war plan\w*|war strateg\w*|cwl\w*|league planning|attack strat\w*|strateg\w*)\b",
            WAR_PLANNING,
        ),
        Classifier::new(
            ChannelClass::Admin,
            r"\b(admin\w*|staff|leader chat|leadership|mod log|moderators?|officers?)\b",
            ADMIN,
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
});

/// Every class matching `name`, in cascade order
#[must_use]
pub fn classify(name: &str) -> Vec<ChannelClass> {
    CASCADE
        .iter()
        .filter(|c| c.matches(name))
        .map(|c| c.class)
        .collect()
}

/// Whether `name` matches `class`
#[must_use]
pub fn is_class(name: &str, class: ChannelClass) -> bool {
    CASCADE
        .iter()
        .any(|c| c.class == class && c.matches(name))
}

/// Apply every matching classifier's patch for `subject` over `base`
#[must_use]
pub fn refine(base: Grant, name: &str, subject: SubjectClass) -> Grant {
    let keywords = keyword_form(name);
    CASCADE
        .iter()
        .filter(|c| c.pattern.is_match(&keywords))
        .filter_map(|c| c.patch_for(subject))
        .fold(base, Grant::overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn cascade_order_is_fixed() {
        let order: Vec<_> = CASCADE.iter().map(|c| c.class).collect();
        assert_eq!(
            order,
            vec![
                ChannelClass::Announcement,
                ChannelClass::Rules,
                ChannelClass::WarLog,
                ChannelClass::WarPlanning,
                ChannelClass::Admin,
            ]
        );
    }

    #[test]
    fn decorated_names_classify() {
        assert_eq!(classify("📢┃announcements"), vec![ChannelClass::Announcement]);
        assert_eq!(classify("war-log"), vec![ChannelClass::WarLog]);
        assert_eq!(classify("attack-strategies"), vec![ChannelClass::WarPlanning]);
        assert_eq!(classify("Leader Chat"), vec![ChannelClass::Admin]);
        assert!(classify("general").is_empty());
        assert!(classify("off-topic").is_empty());
    }

    #[test]
    fn words_not_substrings() {
        // "information" is a rules keyword, "misinformation" is not
        assert!(is_class("information", ChannelClass::Rules));
        assert!(!is_class("misinformation", ChannelClass::Rules));
    }

    #[test]
    fn later_classifier_wins() {
        // announcement denies SEND to members, war-planning (later) allows it
        let name = "war-planning-updates";
        assert_eq!(
            classify(name),
            vec![ChannelClass::Announcement, ChannelClass::WarPlanning]
        );
        let grant = refine(Grant::default(), name, SubjectClass::Member);
        assert!(grant.allow.contains(SEND));
        assert!(!grant.deny.contains(SEND));
    }

    #[test]
    fn admin_hides_from_members() {
        let base = Grant::allow(Permissions::CHAT | Permissions::VOICE);
        let grant = refine(base, "staff-log", SubjectClass::Member);
        assert!(grant.deny.contains(VIEW));
        assert!(!grant.allow.contains(VIEW));
    }

    #[test]
    fn unmatched_keeps_base() {
        let base = Grant::allow(Permissions::READ);
        assert_eq!(refine(base, "general", SubjectClass::Everyone), base);
    }

    fn arb_name() -> impl Strategy<Value = String> {
        let words = prop::sample::select(vec![
            "news", "rules", "war", "log", "plan", "planning", "staff", "general", "chat",
            "media", "cwl", "admin", "welcome", "updates",
        ]);
        prop::collection::vec(words, 1..5).prop_map(|w| w.join("-"))
    }

    proptest! {
        #[test]
        fn last_matching_patch_decides_each_bit(name in arb_name()) {
            for subject in SubjectClass::ALL {
                let grant = refine(Grant::default(), &name, subject);
                prop_assert!((grant.allow & grant.deny).is_empty());

                let last = CASCADE
                    .iter()
                    .filter(|c| c.matches(&name))
                    .filter_map(|c| c.patch_for(subject))
                    .last();
                if let Some(last) = last {
                    prop_assert!(grant.allow.contains(last.allow));
                    prop_assert!(grant.deny.contains(last.deny));
                }
            }
        }
    }
}
