pub mod base;
pub mod notification;
pub mod user;

pub use base::BaseDao;
