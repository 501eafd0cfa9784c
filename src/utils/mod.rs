//! Small text helpers shared by the handlers

pub mod text;
