//! Permission bit set
//!
//! Mirrors the platform's 64-bit permission vector. Only the bits the
//! provisioning code reasons about are named; unknown bits are preserved
//! verbatim (`from_bits_retain`) so snapshots round-trip whatever the
//! platform reported.
//!
//! # Example
//!
//! ```
//! use clanforge_graph::Permissions;
//!
//! let talk = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
//! assert!(talk.contains(Permissions::SEND_MESSAGES));
//! assert_eq!(Permissions::from_bits_retain(talk.bits()), talk);
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Platform permission bits
    ///
    /// | Group | Bits |
    /// |-------|------|
    /// | Visibility | [`VIEW_CHANNEL`](Self::VIEW_CHANNEL), [`READ_MESSAGE_HISTORY`](Self::READ_MESSAGE_HISTORY) |
    /// | Text | [`SEND_MESSAGES`](Self::SEND_MESSAGES), [`ADD_REACTIONS`](Self::ADD_REACTIONS), [`ATTACH_FILES`](Self::ATTACH_FILES), [`EMBED_LINKS`](Self::EMBED_LINKS) |
    /// | Voice | [`CONNECT`](Self::CONNECT), [`SPEAK`](Self::SPEAK) |
    /// | Moderation | [`MANAGE_MESSAGES`](Self::MANAGE_MESSAGES), [`MANAGE_THREADS`](Self::MANAGE_THREADS), [`MENTION_EVERYONE`](Self::MENTION_EVERYONE) |
    /// | Administration | [`MANAGE_CHANNELS`](Self::MANAGE_CHANNELS), [`MANAGE_ROLES`](Self::MANAGE_ROLES), [`KICK_MEMBERS`](Self::KICK_MEMBERS), [`BAN_MEMBERS`](Self::BAN_MEMBERS), [`ADMINISTRATOR`](Self::ADMINISTRATOR) |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Permissions: u64 {
        const CREATE_INSTANT_INVITE = 1 << 0;
        const KICK_MEMBERS          = 1 << 1;
        const BAN_MEMBERS           = 1 << 2;
        const ADMINISTRATOR         = 1 << 3;
        const MANAGE_CHANNELS       = 1 << 4;
        const ADD_REACTIONS         = 1 << 6;
        const VIEW_CHANNEL          = 1 << 10;
        const SEND_MESSAGES         = 1 << 11;
        const MANAGE_MESSAGES       = 1 << 13;
        const EMBED_LINKS           = 1 << 14;
        const ATTACH_FILES          = 1 << 15;
        const READ_MESSAGE_HISTORY  = 1 << 16;
        const MENTION_EVERYONE      = 1 << 17;
        const CONNECT               = 1 << 20;
        const SPEAK                 = 1 << 21;
        const MANAGE_ROLES          = 1 << 28;
        const MANAGE_THREADS        = 1 << 34;
    }
}

impl Permissions {
    /// See and read a channel
    pub const READ: Self = Self::VIEW_CHANNEL.union(Self::READ_MESSAGE_HISTORY);

    /// Participate in a text channel
    pub const CHAT: Self = Self::SEND_MESSAGES
        .union(Self::ADD_REACTIONS)
        .union(Self::ATTACH_FILES)
        .union(Self::EMBED_LINKS);

    /// Participate in a voice channel
    pub const VOICE: Self = Self::CONNECT.union(Self::SPEAK);

    /// Channel moderation
    pub const MODERATE: Self = Self::MANAGE_MESSAGES
        .union(Self::MANAGE_THREADS)
        .union(Self::MENTION_EVERYONE);

    /// Baseline for an ordinary member role
    pub const MEMBER_BASE: Self = Self::READ
        .union(Self::CHAT)
        .union(Self::VOICE)
        .union(Self::CREATE_INSTANT_INVITE);
}
