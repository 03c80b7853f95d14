pub mod identity;
pub mod models;
pub mod stats;

pub use identity::IdentityMap;
pub use models::{GameMode, GameRecord, GroupPlayerId, SessionPlayerId, Side, Team};
pub use stats::{
    GroupOverview, LeaderboardEntry, OpponentStats, Outcome, PartnerStats, PlayerDetailedStats,
    PlayerHighlight, Trend,
};
