pub mod completions;
pub mod config;
pub mod library;
pub mod normalize;
pub mod show;
pub mod validate;
