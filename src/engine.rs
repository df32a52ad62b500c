pub mod compiler;
mod rendering;
/// Runs compiled queries against a database
pub mod sql;
pub mod strategy;

#[cfg(test)]
mod tests;
