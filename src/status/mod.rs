pub mod format;
pub mod guard;
