mod lifecycle;
mod monitoring;
mod preferences;
