pub mod builder;
pub mod cancel;
pub mod error;
pub mod session;
pub mod updates;

mod persister;

pub use builder::ChatSessionBuilder;
pub use cancel::CancelHandle;
pub use error::{Result, SessionError};
pub use session::{ChatSession, RunOutcome, CANCELLED_MESSAGE};
pub use updates::SessionUpdate;
