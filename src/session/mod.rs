mod claims;
mod store;
mod token;

pub use claims::{Claims, Session, decode_unverified};
pub use store::SessionStore;
pub use token::{FileTokenStorage, MemoryTokenStorage, TokenStorage, TokenStore};
