pub(crate) mod bootstrap;
pub(crate) mod runner;
mod spawn;
