//! Data structures and converter functions for dealing with RESP2 frames, the
//! wire format of Redis-compatible list stores.
//!
//! All the data types are in the `frame` module, the `codec` implements
//! the encoding and the decoding.
pub mod codec;
pub mod frame;
