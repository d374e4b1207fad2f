//! Authenticated message relay: builds the send request, performs the single
//! outbound call, and turns the result into form state.

pub mod form;
pub mod outcome;
pub mod request;
pub mod sender;

pub use {
    form::{Composer, FormError, SUCCESS_MESSAGE, SendForm, Submission},
    outcome::SendOutcome,
    request::SendRequest,
    sender::{GENERIC_SEND_ERROR, NO_TOKEN, RelaySender, SendError, rejection_message},
};
