use campusdesk_application::SaveAcknowledgement;
use campusdesk_core::{AppError, AppResult};
use reqwest::StatusCode;

use super::wire::ApiEnvelope;

/// Accepts a read only when transport and payload both report success and
/// data is present.
pub(super) fn classify_fetch<T>(
    operation: &str,
    status: StatusCode,
    envelope: ApiEnvelope<T>,
) -> AppResult<T> {
    let message = envelope.message.unwrap_or_default();
    if !status.is_success() {
        return Err(AppError::Fetch(format!(
            "{operation} failed with status {status}: {message}"
        )));
    }

    if envelope.success != Some(true) {
        return Err(AppError::Fetch(format!(
            "{operation} was rejected by the backend: {message}"
        )));
    }

    envelope
        .data
        .ok_or_else(|| AppError::Fetch(format!("{operation} returned no data")))
}

/// Maps a write response onto a save acknowledgement.
///
/// `envelope` is `None` when the body could not be decoded. Transport status
/// and payload flag are trusted only when they agree; disagreement yields
/// [`SaveAcknowledgement::Unconfirmed`] and leaves the decision to the caller.
pub(super) fn classify_save<T>(
    operation: &str,
    status: StatusCode,
    envelope: Option<ApiEnvelope<T>>,
) -> AppResult<SaveAcknowledgement> {
    let (success, message) = envelope
        .map(|envelope| (envelope.success, envelope.message.unwrap_or_default()))
        .unwrap_or((None, String::new()));

    match (status.is_success(), success) {
        (true, Some(true)) => Ok(SaveAcknowledgement::Confirmed),
        (true, _) | (false, Some(true)) => Ok(SaveAcknowledgement::Unconfirmed { message }),
        (false, _) => Err(AppError::Save(format!(
            "{operation} failed with status {status}: {message}"
        ))),
    }
}
