pub mod health;
pub mod task;
