pub mod api;
pub mod embeds;
pub mod models;
pub mod poller;

pub use api::TwitchApi;
pub use poller::{ChannelCapabilities, Notifier, Outgoing, TwitchPoller};
