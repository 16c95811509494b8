pub mod cursor;
pub mod gesture;
pub mod grid;
pub mod ingestion;
pub mod interaction;
pub mod landmark;
