//! Newshound is the automation core of a feed reader: user-defined
//! conditions are matched against stored articles, named condition sets are
//! persisted as reorderable saved filters, and rules pair conditions with
//! bulk actions (mark read, star, delete, ...) applied to every match.
//!
//! Feed fetching, HTML sanitization, and the reading UI live elsewhere;
//! this crate exposes the HTTP surface they talk to.

pub mod api;
pub mod db;
pub mod filter;
pub mod models;
pub mod rules;
