//! Command line ledger for budgeting the 24 hours of your day. Activities
//! are logged with a category and a duration against a calendar date; no
//! date can ever hold more than 24 hours of logged time. Everything is
//! stored locally, there is no server involved.
//!

pub mod cli;
pub mod ledger;
pub mod session;
pub mod storage;
pub mod utils;
