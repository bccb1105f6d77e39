mod bridge;
mod ffi;
mod helpers;
