//! Extensions to assemble core types

pub mod project_extensions;
