pub mod config;
pub mod credential;
pub mod deploy;
pub mod job;
pub mod table;

#[cfg(test)]
mod tests;
