use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use color_eyre::Report;

/// A failed request: the full report is logged, the client gets `status` and
/// the report's context chain as a plain-text body.
#[derive(Debug)]
pub struct ServerError(pub(crate) Report, pub(crate) StatusCode);

pub type ServerResult<S> = Result<S, ServerError>;

impl ServerError {
    pub fn new(status: StatusCode, report: impl Into<Report>) -> Self {
        Self(report.into(), status)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(Report::msg(message.into()), StatusCode::BAD_REQUEST)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.1.is_server_error() {
            tracing::error!(error = ?self.0, status = %self.1, "Request Error");
        } else {
            tracing::warn!(error = %self.0, status = %self.1, "Request Rejected");
        }

        (self.1, format!("{:#}", self.0)).into_response()
    }
}

impl<E> From<E> for ServerError
where
    E: Into<Report>,
{
    fn from(err: E) -> Self {
        ServerError(err.into(), StatusCode::INTERNAL_SERVER_ERROR)
    }
}

pub(crate) trait WithStatus<T> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError>;
}

impl<T> WithStatus<T> for Result<T, Report> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError> {
        match self {
            Ok(val) => Ok(val),
            Err(err) => Err(ServerError(err, status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use color_eyre::eyre::{eyre, WrapErr};

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_context_chain_is_echoed_in_body() {
        let result: Result<(), Report> =
            Err(eyre!("token endpoint responded with 400")).wrap_err("Failed to exchange token");

        let response = result
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            .unwrap_err()
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_text(response).await,
            "Failed to exchange token: token endpoint responded with 400"
        );
    }

    #[tokio::test]
    async fn test_bad_request_keeps_message() {
        let response = ServerError::bad_request("Code not found").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Code not found");
    }

    #[test]
    fn test_question_mark_defaults_to_internal_error() {
        fn fails() -> ServerResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"))?;
            Ok(())
        }

        let response = fails().unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
