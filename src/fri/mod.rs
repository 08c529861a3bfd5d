//! FRI proof objects and their wire codec.

pub mod codec;
pub mod params;
pub mod proof;

pub use codec::{decode_fri_proof, encode_fri_proof, expected_fri_len};
pub use params::{FriParams, FriParamsError};
pub use proof::{FriProof, InitialProof, QueryProof, RoundProof};
