//! The JDK tool tasks

pub mod jlink;
pub mod jpackage;
