//! Triage simulator library root.

pub mod agent;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod error;
pub mod logging;

pub use agent::{Agent, ServiceObserver, SkillLevel, TracingObserver};
pub use cli::Commands;
pub use config::{load_settings_or_default, Settings};
pub use core::{Message, PriorityQueue, Scorer, SelectionPolicy};
pub use dispatch::{dispatch_all, dispatch_selection, enqueue, DispatchReport, Dispatcher};
pub use error::{Error, Result};
