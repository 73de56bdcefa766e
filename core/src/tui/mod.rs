pub mod app;
pub mod input;
pub mod panes;

pub use app::App;
pub use input::InputAction;
