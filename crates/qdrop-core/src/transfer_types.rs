use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Artifact transfer backend types
///
/// Defined in core because configuration selects it before any transfer crate is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferBackend {
    /// Ask the authorization broker for a presigned URL, then PUT the bytes to it.
    Presigned,
    /// Write directly to an S3-compatible bucket with locally configured credentials.
    S3,
}

impl FromStr for TransferBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "presigned" | "broker" => Ok(TransferBackend::Presigned),
            "s3" => Ok(TransferBackend::S3),
            _ => Err(anyhow::anyhow!("Invalid transfer backend: {}", s)),
        }
    }
}

impl Display for TransferBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TransferBackend::Presigned => write!(f, "presigned"),
            TransferBackend::S3 => write!(f, "s3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!(
            "presigned".parse::<TransferBackend>().unwrap(),
            TransferBackend::Presigned
        );
        assert_eq!(" S3 ".parse::<TransferBackend>().unwrap(), TransferBackend::S3);
        assert!("ftp".parse::<TransferBackend>().is_err());
    }
}
