pub mod cookies;
pub mod session;
pub mod token;

pub use session::{CookieSession, LayeredSession, LocalTokenStore, TokenProvider};
