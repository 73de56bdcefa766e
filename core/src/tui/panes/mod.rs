pub mod console;
pub mod projects;

pub use console::ConsolePane;
pub use projects::ProjectsPane;
