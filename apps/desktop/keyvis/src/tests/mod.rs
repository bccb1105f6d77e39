mod error;
mod logger;
mod paths;
mod preferences;
