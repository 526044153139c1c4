pub mod apply;
pub mod search;
