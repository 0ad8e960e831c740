pub mod property;
pub mod search;
