//! Dinex Runner
//!
//! Line-oriented terminal front end. Each stdin line is parsed into a
//! [`Command`], run against the engine by a [`Session`], and the result is
//! rendered back as text.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = Arc::new(MatchingEngine::bootstrap(config, repository, clock).await?);
//! let mut session = Session::new(engine);
//!
//! session.handle_line("login Josh").await?;
//! session.handle_line("start").await?;
//! session.handle_line("ipo 10 Beef Stew").await?;
//! ```

pub mod render;
pub mod session;
pub mod shell;

pub use session::{Outcome, Session};
pub use shell::{Command, ShellError};
