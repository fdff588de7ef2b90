//! Builtin templates

use crate::template::{CategorySpec, ChannelSpec, Template};

/// Name of the default template
pub const STANDARD: &str = "standard";

/// All builtin templates
#[must_use]
pub fn builtin_templates() -> Vec<Template> {
    vec![standard(), minimal(), competitive()]
}

fn information(extra: Vec<ChannelSpec>) -> CategorySpec {
    let mut channels = vec![
        ChannelSpec::text("welcome")
            .with_topic("Start here")
            .with_aliases(&["welcome-and-rules", "start-here"]),
        ChannelSpec::text("rules")
            .with_topic("Clan and server rules")
            .with_aliases(&["server-rules", "clan-rules"]),
        ChannelSpec::text("announcements")
            .with_topic("Leadership announcements")
            .with_aliases(&["announcement", "news", "updates"]),
    ];
    channels.extend(extra);
    CategorySpec::new("Information", channels).with_aliases(&["info", "server-info"])
}

/// 3 categories, 14 channels
#[must_use]
pub fn standard() -> Template {
    Template {
        name: STANDARD.to_string(),
        description: "Information, clan wars and community areas".to_string(),
        categories: vec![
            information(vec![
                ChannelSpec::text("clan-info")
                    .with_topic("Clan tag, requirements and war schedule")
                    .with_aliases(&["clan-information", "about-us"]),
                ChannelSpec::text("roles")
                    .with_topic("What each role means")
                    .with_aliases(&["role-info", "get-roles"]),
            ]),
            CategorySpec::new(
                "Clan Wars",
                vec![
                    ChannelSpec::text("war-log")
                        .with_topic("Automatic war results")
                        .with_aliases(&["war-results", "warlog"]),
                    ChannelSpec::text("war-planning")
                        .with_topic("Targets and base assignments")
                        .with_aliases(&["war-plan", "war-strategy"]),
                    ChannelSpec::text("war-chat").with_aliases(&["war-discussion"]),
                    ChannelSpec::text("attack-strategies")
                        .with_topic("Army compositions and replays")
                        .with_aliases(&["strategies", "attack-strats"]),
                ],
            )
            .with_aliases(&["wars", "war"]),
            CategorySpec::new(
                "Community",
                vec![
                    ChannelSpec::text("general").with_aliases(&["chat", "main-chat"]),
                    ChannelSpec::text("off-topic").with_aliases(&["random"]),
                    ChannelSpec::text("media").with_aliases(&["screenshots", "clips"]),
                    ChannelSpec::text("bot-commands").with_aliases(&["bots", "commands"]),
                    ChannelSpec::voice("Lounge").with_aliases(&["general-voice", "voice-chat"]),
                ],
            )
            .with_aliases(&["social"]),
        ],
    }
}

/// 1 category, 4 channels
#[must_use]
pub fn minimal() -> Template {
    Template {
        name: "minimal".to_string(),
        description: "A single clan category for small groups".to_string(),
        categories: vec![CategorySpec::new(
            "Clan",
            vec![
                ChannelSpec::text("announcements").with_aliases(&["announcement", "news"]),
                ChannelSpec::text("general").with_aliases(&["chat"]),
                ChannelSpec::text("war-log").with_aliases(&["war-results", "warlog"]),
                ChannelSpec::voice("Voice Chat").with_aliases(&["voice", "lounge"]),
            ],
        )],
    }
}

/// 4 categories, 16 channels
#[must_use]
pub fn competitive() -> Template {
    Template {
        name: "competitive".to_string(),
        description: "War-focused layout with a private leadership area".to_string(),
        categories: vec![
            information(Vec::new()),
            CategorySpec::new(
                "War Room",
                vec![
                    ChannelSpec::text("war-log").with_aliases(&["war-results", "warlog"]),
                    ChannelSpec::text("war-planning").with_aliases(&["war-plan"]),
                    ChannelSpec::text("cwl-planning")
                        .with_topic("Clan War League lineups")
                        .with_aliases(&["cwl", "league-planning"]),
                    ChannelSpec::text("attack-strategies").with_aliases(&["strategies"]),
                    ChannelSpec::text("war-chat"),
                ],
            )
            .with_aliases(&["clan-wars", "wars"]),
            CategorySpec::new(
                "Leadership",
                vec![
                    ChannelSpec::text("leader-chat").with_aliases(&["leadership-chat"]),
                    ChannelSpec::text("staff-log").with_aliases(&["admin-log", "mod-log"]),
                    ChannelSpec::text("recruitment").with_aliases(&["recruiting"]),
                ],
            )
            .with_aliases(&["staff", "admin"]),
            CategorySpec::new(
                "Community",
                vec![
                    ChannelSpec::text("general").with_aliases(&["chat"]),
                    ChannelSpec::text("off-topic"),
                    ChannelSpec::text("bot-commands").with_aliases(&["bots"]),
                    ChannelSpec::voice("War Comms"),
                    ChannelSpec::voice("Lounge").with_aliases(&["voice-chat"]),
                ],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_shape() {
        let t = standard();
        assert_eq!(t.categories.len(), 3);
        assert_eq!(t.channel_count(), 14);
        assert_eq!(t.entity_count(), 17);
    }

    #[test]
    fn minimal_shape() {
        let t = minimal();
        assert_eq!(t.categories.len(), 1);
        assert_eq!(t.channel_count(), 4);
    }

    #[test]
    fn competitive_shape() {
        let t = competitive();
        assert_eq!(t.categories.len(), 4);
        assert_eq!(t.channel_count(), 16);
    }

    #[test]
    fn all_builtins_validate() {
        for t in builtin_templates() {
            t.validate().unwrap_or_else(|e| panic!("{}: {e}", t.name));
        }
    }
}
