use crate::domain::EmailAddress;

/// Row of the subscribers table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscriber {
    pub email: EmailAddress,
}
