mod models;
mod role;
mod views;

pub use models::*;
pub use role::{InvitationStatus, Role, SidebarIcon};
pub use views::*;
