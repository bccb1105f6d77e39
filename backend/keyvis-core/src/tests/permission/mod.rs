mod cell;
mod oracle;
