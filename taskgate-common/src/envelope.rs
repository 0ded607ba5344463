//! Dispatch envelope: the three-part wire payload shipped to a worker.
//!
//! Each part is serialized independently as JSON bytes. The transport never
//! looks inside them; only the worker opens the envelope.

use serde_json::Value;
use thiserror::Error;

use crate::task::{CallableRef, Kwargs};

/// Multipart field name for the callable blob.
pub const CODE_PART: &str = "code";
/// Multipart field name for the positional-args blob.
pub const ARGS_PART: &str = "args";
/// Multipart field name for the keyword-args blob.
pub const KWARGS_PART: &str = "kwargs";

/// Errors from sealing or opening an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Failed to encode {part} blob: {source}")]
    Encode {
        part: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to decode {part} blob: {source}")]
    Decode {
        part: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The three opaque blobs for one task dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEnvelope {
    pub code: Vec<u8>,
    pub args: Vec<u8>,
    pub kwargs: Vec<u8>,
}

/// Contents of an opened envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedEnvelope {
    pub callable: CallableRef,
    pub args: Vec<Value>,
    pub kwargs: Kwargs,
}

impl DispatchEnvelope {
    /// Serialize a callable and its merged arguments.
    pub fn seal(
        callable: &CallableRef,
        args: &[Value],
        kwargs: &Kwargs,
    ) -> Result<Self, EnvelopeError> {
        let code = serde_json::to_vec(callable).map_err(|source| EnvelopeError::Encode {
            part: CODE_PART,
            source,
        })?;
        let args = serde_json::to_vec(args).map_err(|source| EnvelopeError::Encode {
            part: ARGS_PART,
            source,
        })?;
        let kwargs = serde_json::to_vec(kwargs).map_err(|source| EnvelopeError::Encode {
            part: KWARGS_PART,
            source,
        })?;

        Ok(Self { code, args, kwargs })
    }

    /// Deserialize the three blobs.
    pub fn open(&self) -> Result<OpenedEnvelope, EnvelopeError> {
        let callable = serde_json::from_slice(&self.code).map_err(|source| EnvelopeError::Decode {
            part: CODE_PART,
            source,
        })?;
        let args = serde_json::from_slice(&self.args).map_err(|source| EnvelopeError::Decode {
            part: ARGS_PART,
            source,
        })?;
        let kwargs = serde_json::from_slice(&self.kwargs).map_err(|source| EnvelopeError::Decode {
            part: KWARGS_PART,
            source,
        })?;

        Ok(OpenedEnvelope {
            callable,
            args,
            kwargs,
        })
    }

    /// Total payload size in bytes.
    pub fn len(&self) -> usize {
        self.code.len() + self.args.len() + self.kwargs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
