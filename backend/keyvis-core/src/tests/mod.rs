mod bridge;
mod config;
mod permission;
