pub type TrifadeResult<T> = Result<T, TrifadeError>;

#[derive(thiserror::Error, Debug)]
pub enum TrifadeError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("degenerate triangulation: {0}")]
    DegenerateTriangulation(String),

    #[error("polygon parse error on line {line}: {reason}")]
    PolygonParse { line: usize, reason: String },

    #[error("export sink failure: {0}")]
    ExportSink(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrifadeError {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::DegenerateTriangulation(msg.into())
    }

    pub fn polygon_parse(line: usize, reason: impl Into<String>) -> Self {
        Self::PolygonParse {
            line,
            reason: reason.into(),
        }
    }

    pub fn export_sink(msg: impl Into<String>) -> Self {
        Self::ExportSink(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(TrifadeError::invalid_parameter("x")
            .to_string()
            .contains("invalid parameter:"));
        assert!(TrifadeError::degenerate("x")
            .to_string()
            .contains("degenerate triangulation:"));
        assert_eq!(
            TrifadeError::polygon_parse(3, "too few vertices").to_string(),
            "polygon parse error on line 3: too few vertices"
        );
        assert!(TrifadeError::export_sink("x")
            .to_string()
            .contains("export sink failure:"));
    }

    #[test]
    fn io_preserves_source() {
        let err = TrifadeError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(err.to_string().contains("boom"));
    }
}
