pub mod controller;
pub mod negotiator;
pub mod streaming;
