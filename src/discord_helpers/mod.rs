pub mod multipage_embed;
pub mod notifier;

pub use multipage_embed::open_menu;
pub use notifier::DiscordNotifier;
