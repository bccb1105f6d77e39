mod helpers;
mod monitor;
mod shell;
