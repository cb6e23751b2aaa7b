//! Core primitives shared by both conversion directions

pub mod time;
