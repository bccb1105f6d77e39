// Library exports for testing
// The binary (main.rs) imports these as well

pub mod error;
pub mod host_shell;
pub mod logger;
pub mod paths;
pub mod workload;

#[cfg(test)]
mod tests;
