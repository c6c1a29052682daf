pub mod participants;
pub mod tables;
pub mod tournaments;
