pub mod admin;
pub mod chat;
pub mod home;
pub mod router;
pub mod shell;

pub use admin::{AdminConsole, Authenticator, StaticPasswordAuthenticator};
pub use chat::ChatSession;
pub use home::{HomeFeed, HomeFeedLoader};
pub use router::{NavigationEvent, ViewRouter};
pub use shell::AppShell;

pub mod prelude {
    pub use super::{AdminConsole, AppShell, ChatSession, HomeFeedLoader, ViewRouter};
    pub use nk_core::{Article, Error, Result, View};
}
