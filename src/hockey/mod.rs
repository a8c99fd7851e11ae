//! NHL data behind paginated menus.

pub mod api;
pub mod leaderboard;
pub mod roster;
pub mod schedule;
pub mod standings;
pub mod teams;

pub use api::HockeyApi;
pub use leaderboard::LeaderboardSource;
pub use roster::RosterSource;
pub use schedule::ScheduleSource;
pub use standings::{StandingsSource, StandingsStyle};
