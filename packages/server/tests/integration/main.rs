mod common;
mod submission;
mod tasks;
