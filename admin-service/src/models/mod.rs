pub mod game;
pub mod password;
pub mod right;
pub mod sorted_rights;
pub mod user;
pub mod user_right;

pub use game::Game;
pub use password::Password;
pub use right::Right;
pub use sorted_rights::SortedRights;
pub use user::User;
pub use user_right::UserRight;
