use crate::{error::SubmitError, models::Payload};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestOutcome {
    #[default]
    Idle,
    Loading,
    Success(Payload),
    Failure(SubmitError),
}

impl RequestOutcome {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestOutcome::Loading)
    }

    pub fn status(&self) -> &'static str {
        match self {
            RequestOutcome::Idle => "idle",
            RequestOutcome::Loading => "loading",
            RequestOutcome::Success(_) => "success",
            RequestOutcome::Failure(_) => "failure",
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            RequestOutcome::Success(p) => Some(p),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SubmitError> {
        match self {
            RequestOutcome::Failure(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    /// Local checks passed; a request is about to go out.
    Submit,
    /// Local checks failed; nothing goes out.
    Reject(SubmitError),
    Complete(Result<Payload, SubmitError>),
}

/// Next outcome for `event`, or `None` when the event is ignored.
///
/// While Loading only a completion is accepted; outside Loading a completion
/// has no request to belong to.
pub fn transition(current: &RequestOutcome, event: Event) -> Option<RequestOutcome> {
    match (current.is_loading(), event) {
        (true, Event::Complete(Ok(payload))) => Some(RequestOutcome::Success(payload)),
        (true, Event::Complete(Err(e))) => Some(RequestOutcome::Failure(e)),
        (true, _) => None,
        (false, Event::Submit) => Some(RequestOutcome::Loading),
        (false, Event::Reject(e)) => Some(RequestOutcome::Failure(e)),
        (false, Event::Complete(_)) => None,
    }
}
