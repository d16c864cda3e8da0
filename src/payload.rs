//! # Payload Slots
//!
//! Every endpoint declares three type positions: the request body, the bound
//! parameters and the response. Any of them may be intentionally empty. An
//! empty position is expressed with [`Void`] (or `()`), and the dispatcher
//! skips the matching decode, bind or encode stage entirely.
//!
//! Presence is decided through [`Payload::void`], which returns the value to
//! use for an absent slot or `None` for a slot that must be produced by a
//! codec. This keeps the check generic over the type parameter without
//! comparing type identities.
//!
//! ```rust
//! use handlr::{Payload, Void};
//!
//! #[derive(serde::Deserialize, handlr::Payload)]
//! struct Greet {
//!     name: String,
//! }
//!
//! assert!(Void::is_void());
//! assert!(!Greet::is_void());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A type that can occupy the Body, Params or Response position of an endpoint.
pub trait Payload: Sized + Send + 'static {
    /// The value handed to the business function when this position carries
    /// nothing. `None` means the value must be decoded, bound or encoded.
    fn void() -> Option<Self> {
        None
    }

    /// Whether this position is intentionally empty.
    fn is_void() -> bool {
        Self::void().is_some()
    }
}

/// Marker for an endpoint position that carries no value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Void;

impl Payload for Void {
    fn void() -> Option<Self> {
        Some(Void)
    }
}

impl Payload for () {
    fn void() -> Option<Self> {
        Some(())
    }
}

macro_rules! present {
    ($($ty:ty),* $(,)?) => {
        $(impl Payload for $ty {})*
    };
}

present!(
    String, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    serde_json::Value, serde_yaml::Value,
);

impl<T: Send + 'static> Payload for Vec<T> {}
impl<T: Send + 'static> Payload for Option<T> {}
impl<K: Send + 'static, V: Send + 'static, S: Send + 'static> Payload for HashMap<K, V, S> {}
impl<K: Send + 'static, V: Send + 'static> Payload for BTreeMap<K, V> {}
