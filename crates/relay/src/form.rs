//! Headless state of the send form.
//!
//! The form owns the two input fields, the error and success banners, and a
//! pending flag. While an attempt is in flight the form refuses another
//! submission, so at most one attempt per form runs at a time.

use std::sync::Arc;

use tracing::debug;

use {
    crate::{outcome::SendOutcome, sender::RelaySender},
    textrelay_auth::SessionGate,
};

/// Success banner text.
pub const SUCCESS_MESSAGE: &str = "Message sent";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("a message is already being sent")]
    AlreadyPending,
}

/// Field values captured when a submission starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub to: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct SendForm {
    pub to: String,
    pub text: String,
    error: Option<String>,
    success: Option<String>,
    pending: bool,
}

impl SendForm {
    pub fn new(to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Start a submission: clears both banners and disables the form.
    pub fn begin(&mut self) -> Result<Submission, FormError> {
        if self.pending {
            return Err(FormError::AlreadyPending);
        }
        self.error = None;
        self.success = None;
        self.pending = true;
        Ok(Submission {
            to: self.to.clone(),
            text: self.text.clone(),
        })
    }

    /// Record the attempt's outcome. Exactly one banner is set.
    pub fn finish(&mut self, outcome: &SendOutcome) {
        self.pending = false;
        match outcome.error_message() {
            Some(msg) => {
                self.success = None;
                self.error = Some(msg.to_string());
            },
            None => {
                self.error = None;
                self.success = Some(SUCCESS_MESSAGE.to_string());
            },
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn dismiss_success(&mut self) {
        self.success = None;
    }
}

/// Sequences session gate, sender and form state for one submission.
#[derive(Clone)]
pub struct Composer {
    gate: Arc<dyn SessionGate>,
    sender: RelaySender,
}

impl Composer {
    pub fn new(gate: Arc<dyn SessionGate>, sender: RelaySender) -> Self {
        Self { gate, sender }
    }

    /// Whether the form should be offered at all.
    pub fn is_available(&self) -> bool {
        self.gate.is_authenticated()
    }

    /// Run one submission to completion and record its banner.
    ///
    /// The form stays pending until the attempt resolves. Dropping the
    /// returned future after it has started leaves the form disabled.
    pub async fn submit(&self, form: &mut SendForm) -> Result<SendOutcome, FormError> {
        let submission = form.begin()?;
        let outcome: SendOutcome = self
            .sender
            .send_with_session(self.gate.as_ref(), &submission.to, &submission.text)
            .await
            .into();
        debug!(success = outcome.is_success(), "send attempt finished");
        form.finish(&outcome);
        Ok(outcome)
    }
}
