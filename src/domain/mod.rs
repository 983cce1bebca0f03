// Domain layer - Pure types with no I/O
pub mod error;
pub mod status;
pub mod table;
pub mod user;
pub mod view;
