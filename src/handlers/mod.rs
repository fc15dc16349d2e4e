pub mod callbacks;
pub mod commands;
pub mod generation;
pub mod messages;
pub mod templates;
