//! Feature to channel binding
//!
//! Each selected feature is bound to the first provisioned text channel of
//! the matching keyword class, in template order.

use crate::association::FeatureBinding;
use crate::selections::Feature;
use clanforge_graph::{normalize_name, ChannelKind, EntityError, EntityKind};
use clanforge_reconcile::{is_class, ChannelClass, ResolvedChannel};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static MEMBER_ACTIVITY: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b(member ?logs?|members? activity|activity|join ?logs?|join leave)\b").ok()
});

fn activity_like(name: &str) -> bool {
    let words = normalize_name(name).replace('-', " ");
    MEMBER_ACTIVITY
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(&words))
}

fn find<'c>(
    channels: &'c [ResolvedChannel],
    pred: impl Fn(&ResolvedChannel) -> bool,
) -> Option<&'c ResolvedChannel> {
    channels
        .iter()
        .filter(|c| c.kind == ChannelKind::Text)
        .find(|c| pred(c))
}

/// Channel `feature` should post to
#[must_use]
pub fn channel_for(feature: Feature, channels: &[ResolvedChannel]) -> Option<&ResolvedChannel> {
    match feature {
        Feature::WarLog => find(channels, |c| is_class(&c.name, ChannelClass::WarLog)),
        Feature::WarReminders => find(channels, |c| is_class(&c.name, ChannelClass::WarPlanning)),
        Feature::Announcements => {
            find(channels, |c| is_class(&c.name, ChannelClass::Announcement))
        }
        Feature::MemberActivity => find(channels, |c| activity_like(&c.name))
            .or_else(|| find(channels, |c| normalize_name(&c.name) == "general")),
    }
}

/// Bind every selected feature; unmatched features become errors
#[must_use]
pub fn bind_features(
    features: &BTreeSet<Feature>,
    channels: &[ResolvedChannel],
) -> (Vec<FeatureBinding>, Vec<EntityError>) {
    let mut bindings = Vec::new();
    let mut errors = Vec::new();
    for &feature in features {
        match channel_for(feature, channels) {
            Some(channel) => bindings.push(FeatureBinding {
                feature,
                channel: channel.id,
                channel_name: channel.name.clone(),
            }),
            None => {
                tracing::warn!(%feature, "no channel for feature");
                errors.push(EntityError::unresolved(
                    EntityKind::Channel,
                    feature.key(),
                    "no provisioned channel suits this feature",
                ));
            }
        }
    }
    (bindings, errors)
}
