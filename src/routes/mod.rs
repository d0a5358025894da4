mod healthcheck;
mod home;
mod pages;
mod subscriptions;

pub use healthcheck::*;
pub use home::*;
pub use pages::*;
pub use subscriptions::*;
