// Shared between the `antgrid` binary and its integration tests
pub mod cli;
pub mod headless;
