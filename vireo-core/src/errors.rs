// Vireo
// Copyright (c) 2026 The Project Vireo Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `errors` module defines the common error type.

use std::error;
use std::fmt;
use std::result;

/// `Error` provides an enumeration of all possible errors reported by Vireo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The buffer handed to a reader could not be used to seed it.
    InvalidBuffer(&'static str),
    /// The stream contained malformed data and could not be decoded.
    DecodeError(&'static str),
    /// An internal invariant or a caller precondition was violated. This always indicates a bug
    /// in the caller or in Vireo itself, never a malformed stream.
    LogicError(&'static str),
    /// An unsupported codec feature was encounted.
    Unsupported(&'static str),
    /// A default or user-defined limit was reached while decoding the stream. Limits are used to
    /// prevent denial-of-service attacks from malicious streams.
    LimitError(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::InvalidBuffer(msg) => {
                write!(f, "invalid buffer: {}", msg)
            }
            Error::DecodeError(msg) => {
                write!(f, "malformed stream: {}", msg)
            }
            Error::LogicError(msg) => {
                write!(f, "logic error: {}", msg)
            }
            Error::Unsupported(feature) => {
                write!(f, "unsupported feature: {}", feature)
            }
            Error::LimitError(constraint) => {
                write!(f, "limit reached: {}", constraint)
            }
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// Convenience function to create an invalid buffer error.
pub fn invalid_buffer_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::InvalidBuffer(desc))
}

/// Convenience function to create a decode error.
pub fn decode_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::DecodeError(desc))
}

/// Convenience function to create a logic error.
pub fn logic_error<T>(desc: &'static str) -> Result<T> {
    Err(Error::LogicError(desc))
}

/// Convenience function to create an unsupport feature error.
pub fn unsupported_error<T>(feature: &'static str) -> Result<T> {
    Err(Error::Unsupported(feature))
}

/// Convenience function to create a limit error.
pub fn limit_error<T>(constraint: &'static str) -> Result<T> {
    Err(Error::LimitError(constraint))
}
