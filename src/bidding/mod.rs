pub mod commands;
pub mod validate;
