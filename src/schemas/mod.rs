pub mod auth;
pub mod company;
pub mod notification;
pub mod report;
pub mod role;

pub use auth::*;
pub use company::*;
pub use notification::*;
pub use report::*;
pub use role::*;
