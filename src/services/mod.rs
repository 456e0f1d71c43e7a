pub mod completion;
pub mod recommendations;
