//! Paginated menus: a page source, a set of controls, and a session that
//! moves between pages as the controls are pressed.

pub mod control;
pub mod session;
pub mod source;
pub mod surface;

pub use control::{schedule_controls, standard_controls, Action, Control};
pub use session::{ControlEvent, MenuSession};
pub use source::{checked_index, page_footer, Page, PageSource, Skip};
pub use surface::MenuSurface;
