use std::io::{Read, Write};

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReadError {
    #[error("Cannot read data: {0}")]
    IO(#[from] std::io::Error),

    #[error("Overflow converting integer: {0}")]
    Overflow(#[from] std::num::TryFromIntError),

    #[error("Malformed data: {0}")]
    Malformed(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("Frame underflow: need {need} bytes but only {remain} remain")]
    Underflow { need: usize, remain: usize },
}

/// Decodes a value out of a frame.
///
/// `remain` is the number of bytes the enclosing frame still declares. Every implementation
/// consumes its bytes from that budget and hands the rest back, so a structure whose lengths
/// don't add up fails instead of reading into the next frame.
pub trait ReadType<R>: Sized
where
    R: Read,
{
    fn read(reader: &mut R, remain: usize) -> Result<(Self, usize), ReadError>;
}

/// Takes `need` bytes out of the `remain` budget.
pub fn consume(remain: usize, need: usize) -> Result<usize, ReadError> {
    remain
        .checked_sub(need)
        .ok_or(ReadError::Underflow { need, remain })
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WriteError {
    #[error("Cannot write data: {0}")]
    IO(#[from] std::io::Error),

    #[error("Overflow converting integer: {0}")]
    Overflow(#[from] std::num::TryFromIntError),

    #[error("Malformed data: {0}")]
    Malformed(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Exact number of bytes [`WriteType::write`] emits for a value.
///
/// Computing this never writes anything; frames need their length before the first payload byte.
pub trait EncodedSize {
    fn encoded_size(&self) -> usize;
}

pub trait WriteType<W>: EncodedSize
where
    W: Write,
{
    fn write(&self, writer: &mut W) -> Result<(), WriteError>;
}
