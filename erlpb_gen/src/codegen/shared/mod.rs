pub mod builder;
pub mod dispatch;
pub mod naming;
pub mod plan;
