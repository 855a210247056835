mod health;
mod rate;
mod send_emails;
mod subscriptions;

use axum::http::Method;

use crate::Error;

pub(crate) use health::*;
pub(crate) use rate::*;
pub(crate) use send_emails::*;
pub(crate) use subscriptions::*;

fn require_method(method: Method, expected: Method) -> Result<(), Error> {
    if method == expected {
        Ok(())
    } else {
        Err(Error::MethodNotAllowed(method))
    }
}
