pub mod compare;
pub mod setup;
pub mod strategies;
pub mod ui;
