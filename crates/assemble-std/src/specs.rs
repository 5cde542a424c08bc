//! Specs describe work that can be performed by a project

pub mod delete_spec;
pub mod exec_spec;
