pub mod game_state;
pub mod message;
pub mod notification;
pub mod report;
pub mod turn_delta;
pub mod world;
