/*!
    Benign outcomes of draining and submitting.
*/

/**
    Why an encoder packet drain loop stopped.

    Neither variant is an error: hard encoder failures are returned as
    [`Error`](crate::Error) instead.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainStatus {
    /// The encoder wants more input before it can produce another packet.
    NeedsInput,
    /// The encoder was flushed and has produced its last packet.
    EndOfStream,
}

/**
    Outcome of a successful host submission.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitStatus {
    /// No stream of this kind is configured; the submission was ignored.
    NoStream,
    /// Input was consumed; the encoder needs more.
    NeedsInput,
    /// The stream has been flushed and fully drained.
    EndOfStream,
}

impl SubmitStatus {
    /**
        Host status code: 0 = ok, 1 = needs more input or end of stream.

        Fatal errors map to -1 at the host boundary.
    */
    pub const fn code(self) -> i32 {
        match self {
            Self::NoStream => 0,
            Self::NeedsInput | Self::EndOfStream => 1,
        }
    }
}

impl From<DrainStatus> for SubmitStatus {
    fn from(status: DrainStatus) -> Self {
        match status {
            DrainStatus::NeedsInput => Self::NeedsInput,
            DrainStatus::EndOfStream => Self::EndOfStream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(SubmitStatus::NoStream.code(), 0);
        assert_eq!(SubmitStatus::from(DrainStatus::NeedsInput).code(), 1);
        assert_eq!(SubmitStatus::from(DrainStatus::EndOfStream).code(), 1);
    }
}
