pub mod achievements;
pub mod analyzer;
pub mod avatar;
pub mod collaborators;
pub mod collision;
pub mod config;
pub mod entities;
pub mod field;
pub mod game;
pub mod render;
pub mod timers;
