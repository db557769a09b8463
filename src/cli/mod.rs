// CLI module - command-line interface

pub mod args;

pub use args::{Cli, Commands, ListArgs, RunArgs};
