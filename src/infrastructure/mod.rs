pub mod completion;
pub mod narrative;
pub mod sqlite;
