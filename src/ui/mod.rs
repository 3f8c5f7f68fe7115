//! Line-oriented terminal front-end.
//!
//! - [`chat_loop`]: reads input, dispatches it to [`crate::commands`] and
//!   applies background outcomes from the session controller.
//! - [`renderer`]: turns transcript messages and notices into printable text.
//!
//! This layer only presents state; [`crate::core`] owns it.

pub mod chat_loop;
pub mod renderer;
