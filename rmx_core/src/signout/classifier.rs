use crate::types::types::{Classification, RemoteFailure, M_UNKNOWN_TOKEN};

/// Classifies a failed remote sign-out.
///
/// Some homeservers invalidate the access token while still processing the
/// logout request and then reject that very request with
/// `401 M_UNKNOWN_TOKEN` (synapse#5755). That single case is `Ignorable`;
/// every other failure, including transport errors, is `Fatal`.
pub fn classify(failure: &RemoteFailure) -> Classification {
    match failure {
        RemoteFailure::Server {
            http_status: 401,
            errcode,
            ..
        } if errcode == M_UNKNOWN_TOKEN => Classification::Ignorable,
        _ => Classification::Fatal,
    }
}
