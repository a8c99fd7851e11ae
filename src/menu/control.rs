#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Previous,
    Next,
    First,
    Last,
    /// page 0 of the previous batch
    SkipBack,
    /// page 0 of the next batch
    SkipForward,
    Stop,
    ChooseDate,
}

#[derive(Debug, Clone)]
pub struct Control {
    pub id: &'static str,
    pub emoji: &'static str,
    pub label: &'static str,
    /// exclusive controls run one at a time under the session gate
    pub exclusive: bool,
    /// decides from the current page count whether the control is shown
    pub visible: fn(Option<usize>) -> bool,
    pub action: Action,
}

impl Control {
    pub fn is_visible(&self, page_count: Option<usize>) -> bool {
        (self.visible)(page_count)
    }
}

pub const FIRST_EMOJI: &str = "\u{23EE}\u{FE0F}";
pub const PREVIOUS_EMOJI: &str = "\u{25C0}\u{FE0F}";
pub const NEXT_EMOJI: &str = "\u{25B6}\u{FE0F}";
pub const LAST_EMOJI: &str = "\u{23ED}\u{FE0F}";
pub const STOP_EMOJI: &str = "\u{274C}";
pub const CALENDAR_EMOJI: &str = "\u{1F4C6}";

fn always(_: Option<usize>) -> bool {
    true
}

pub fn show_single_arrows(page_count: Option<usize>) -> bool {
    matches!(page_count, Some(n) if n != 1)
}

pub fn show_double_arrows(page_count: Option<usize>) -> bool {
    matches!(page_count, Some(n) if n > 2)
}

fn control(
    id: &'static str,
    emoji: &'static str,
    label: &'static str,
    exclusive: bool,
    visible: fn(Option<usize>) -> bool,
    action: Action,
) -> Control {
    Control {
        id,
        emoji,
        label,
        exclusive,
        visible,
        action,
    }
}

/// Controls for list-backed menus. Arrows disappear when they have nothing to do.
pub fn standard_controls() -> Vec<Control> {
    vec![
        control("first", FIRST_EMOJI, "First", true, show_double_arrows, Action::First),
        control("prev", PREVIOUS_EMOJI, "Previous", true, show_single_arrows, Action::Previous),
        control("next", NEXT_EMOJI, "Next", true, show_single_arrows, Action::Next),
        control("last", LAST_EMOJI, "Last", true, show_double_arrows, Action::Last),
        control("stop", STOP_EMOJI, "Stop", false, always, Action::Stop),
    ]
}

/// Controls for the schedule menu. First and last hop whole batches of games.
pub fn schedule_controls() -> Vec<Control> {
    vec![
        control("first", FIRST_EMOJI, "Earlier", true, always, Action::SkipBack),
        control("prev", PREVIOUS_EMOJI, "Previous", true, always, Action::Previous),
        control("next", NEXT_EMOJI, "Next", true, always, Action::Next),
        control("last", LAST_EMOJI, "Later", true, always, Action::SkipForward),
        control("stop", STOP_EMOJI, "Stop", false, always, Action::Stop),
        control("date", CALENDAR_EMOJI, "Choose date", false, always, Action::ChooseDate),
    ]
}
