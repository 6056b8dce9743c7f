mod backend;
mod events;
mod state;
mod step;

pub use backend::{RenderBackend, Transport};
pub use state::App;
