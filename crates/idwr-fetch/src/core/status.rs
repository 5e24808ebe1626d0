/// Coarse meaning of an HTTP status code for download purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    NotModified,
    NotFound,
    ClientError,
    ServerError,
    Other,
}

pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        304 => StatusClass::NotModified,
        404 => StatusClass::NotFound,
        400..=499 => StatusClass::ClientError,
        500..=599 => StatusClass::ServerError,
        _ => StatusClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(200), StatusClass::Success);
        assert_eq!(classify_status(206), StatusClass::Success);
        assert_eq!(classify_status(304), StatusClass::NotModified);
        assert_eq!(classify_status(404), StatusClass::NotFound);
        assert_eq!(classify_status(403), StatusClass::ClientError);
        assert_eq!(classify_status(502), StatusClass::ServerError);
        assert_eq!(classify_status(301), StatusClass::Other);
    }
}
