mod alert_message;
mod email_address;
mod rate;
mod subscriber;

pub use alert_message::*;
pub use email_address::*;
pub use rate::*;
pub use subscriber::*;
