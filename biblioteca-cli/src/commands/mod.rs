//! CLI command implementations.

pub mod authors;
pub mod books;
pub mod loans;
pub mod users;
pub mod watch;
