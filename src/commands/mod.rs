pub(crate) mod leaderboard;
pub(crate) mod roster;
pub(crate) mod schedule;
pub(crate) mod standings;
pub(crate) mod twitch;
