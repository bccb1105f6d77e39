mod callback;
mod state;
