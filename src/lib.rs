pub mod browser;
pub mod envsnap;
pub mod handoff;
pub mod migrate;
pub mod paths;
