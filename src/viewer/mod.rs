pub mod app;
pub mod camera;
pub mod cli;
pub mod error;
pub mod frame_fit;
pub mod lighting;
pub mod model;
pub mod render_loop;
pub mod room;
pub mod session;
pub mod settings;
pub mod ui;

pub const CONFIG_PATH: &str = "config/roomview.ron";
pub const ROOM_PANEL_SUBDIVISIONS: u32 = 8;
