pub mod broadcaster;
pub mod handlers;
pub mod room;
pub mod task;

// Re-export the main types for easy access
pub use room::RoomId;
pub use task::RoomHandle;
