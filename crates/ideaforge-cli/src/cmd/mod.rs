pub mod context;
pub mod list;
pub mod parse;
pub mod run;
