//! Interactive approval console.
//!
//! `page` owns the behaviour (initial load, demo fallback, timers, actions),
//! `app` and `ui` put it on a terminal.

pub mod app;
pub mod demo;
pub mod page;
pub mod tasks;
pub mod theme;
pub mod ui;

pub use app::run;
pub use page::{Mode, Notice, Page, PageError, PageOptions};
