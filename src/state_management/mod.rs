pub mod lifecycle;

pub use lifecycle::{join_task, join_with_grace, Lifecycle};
