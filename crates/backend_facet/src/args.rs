//! Positional call arguments.
//!
//! On the wire a call's arguments are an ordered list of JSON values. Facet
//! methods declare their parameters as a tuple type implementing
//! [`FacetArgs`]; the tuple's length is the method's arity and each element
//! is decoded from the value at the same position. Callers build the list
//! from any tuple of serialisable values through [`CallArgs`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::fault::FacetFault;

/// A parameter tuple a facet method accepts.
pub trait FacetArgs: Sized + Send + 'static {
    /// Number of positional parameters.
    const ARITY: usize;

    /// Bind positional values, checking arity and decoding each element.
    ///
    /// # Errors
    ///
    /// Returns an [`FaultCategory::Argument`](crate::FaultCategory::Argument)
    /// fault on a count or type mismatch.
    fn from_values(values: Vec<Value>) -> Result<Self, FacetFault>;
}

/// An argument tuple a caller can send.
pub trait CallArgs {
    /// Serialise each element into a positional value.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error of the first element that fails.
    fn into_values(self) -> Result<Vec<Value>, serde_json::Error>;
}

/// Fail with an argument fault unless `got == expected`.
///
/// # Errors
///
/// Returns an argument fault describing the mismatch.
pub fn check_arity(expected: usize, got: usize) -> Result<(), FacetFault> {
    if expected == got {
        Ok(())
    } else {
        Err(FacetFault::argument(format!(
            "expected {expected} argument(s), got {got}"
        )))
    }
}

fn decode_next<T: DeserializeOwned>(
    values: &mut impl Iterator<Item = (usize, Value)>,
) -> Result<T, FacetFault> {
    let (index, value) = values
        .next()
        .ok_or_else(|| FacetFault::argument("missing argument"))?;
    serde_json::from_value(value)
        .map_err(|e| FacetFault::argument(format!("argument {index}: {e}")))
}

macro_rules! impl_args {
    ($arity:expr; $($ty:ident . $idx:tt),*) => {
        impl<$($ty: DeserializeOwned + Send + 'static),*> FacetArgs for ($($ty,)*) {
            const ARITY: usize = $arity;

            #[allow(unused_variables, unused_mut)]
            fn from_values(values: Vec<Value>) -> Result<Self, FacetFault> {
                check_arity(Self::ARITY, values.len())?;
                let mut values = values.into_iter().enumerate();
                Ok(($(decode_next::<$ty>(&mut values)?,)*))
            }
        }

        impl<$($ty: Serialize),*> CallArgs for ($($ty,)*) {
            fn into_values(self) -> Result<Vec<Value>, serde_json::Error> {
                Ok(vec![$(serde_json::to_value(&self.$idx)?),*])
            }
        }
    };
}

impl_args!(0;);
impl_args!(1; A.0);
impl_args!(2; A.0, B.1);
impl_args!(3; A.0, B.1, C.2);
impl_args!(4; A.0, B.1, C.2, D.3);
impl_args!(5; A.0, B.1, C.2, D.3, E.4);
impl_args!(6; A.0, B.1, C.2, D.3, E.4, F.5);
