pub mod admin;
pub mod help;
pub mod navigate;
pub mod play;
pub mod stop;

pub use admin::{reload, status};
pub use help::help;
pub use navigate::{next, previous, shuffle};
pub use play::play;
pub use stop::stop;
