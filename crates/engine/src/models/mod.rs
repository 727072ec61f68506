//! Record types decoded from search results.

mod post;
mod stats;
mod user;

pub use post::Post;
pub use stats::{PostStats, UserWithStats};
pub use user::User;
