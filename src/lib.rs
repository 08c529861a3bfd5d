#![no_std]
extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod fri;
pub mod lpc;
pub mod marshalling;
pub mod merkle_tree;

pub use lpc::{
    CommitmentScheme, LpcCodec, LpcScheme, decode_commitment, decode_eval_proof,
    encode_commitment, encode_eval_proof,
};
pub use marshalling::{Endianness, WireConfig, WireForm, errors::MarshalError};
