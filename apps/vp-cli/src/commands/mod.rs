// Subcommand implementations for the vp CLI.

pub mod convert;
