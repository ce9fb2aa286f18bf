pub mod dao;
pub mod notify;

pub use dao::*;
pub use notify::{DispatchEngine, Notifier, Sweeper};
