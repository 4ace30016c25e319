pub mod check;
pub mod contract;
mod dispatch;
pub mod run;
pub mod scan;

pub use dispatch::dispatch;
