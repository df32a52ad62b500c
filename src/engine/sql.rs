/// Runs compiled queries against a real database
pub mod querying;
pub mod structure;
