use crate::error::{ErrorKind, Result, RpcError};
use crate::packed::PackedCall;
use crate::types::RpcType;

/// The serialization capability of the crate.
///
/// An adapter owns a structured intermediate form ([`SerialObject`]) and
/// translates in both directions: `PackedCall` ↔ `SerialObject` ↔ bytes. All
/// operations are associated functions on a marker type; callers pick an
/// adapter statically and no trait objects are involved.
///
/// A decoded `SerialObject` returned by [`from_bytes`] has already passed
/// structural validation: either it records an exception (`except_type`
/// non-zero, with a message), or it carries a non-empty textual `func_name`
/// and an ordered `args` sequence.
///
/// [`SerialObject`]: SerialAdapter::SerialObject
/// [`from_bytes`]: SerialAdapter::from_bytes
pub trait SerialAdapter: Sized {
    type SerialObject: Clone;

    /// Encodes a serial object into wire bytes. Fails with
    /// [`ErrorKind::Serialization`].
    fn to_bytes(obj: Self::SerialObject) -> Result<Vec<u8>>;

    /// Decodes wire bytes. `None` covers both unparseable input and input
    /// that fails structural validation.
    fn from_bytes(bytes: &[u8]) -> Option<Self::SerialObject>;

    /// A blank record suitable for attaching an error when the incoming
    /// bytes did not parse at all.
    fn empty_object() -> Self::SerialObject;

    /// Encodes a single value. Used for argument elements and results.
    fn push_arg<T: RpcType>(value: &T) -> Result<Self::SerialObject>;

    /// Decodes a single value, validating its wire shape first. Shape
    /// violations fail with [`ErrorKind::SignatureMismatch`]; anything the
    /// deserializer rejects afterwards fails with
    /// [`ErrorKind::Deserialization`].
    fn parse_arg<T: RpcType>(obj: &Self::SerialObject) -> Result<T>;

    /// Writes `func_name`, the args sequence, and, depending on the pack's
    /// state, either the result or the error fields.
    fn serialize_pack<R, A>(pack: &PackedCall<R, A>) -> Result<Self::SerialObject>
    where
        R: RpcType,
        A: ArgList<Self>;

    /// Rebuilds a typed pack, parsing exactly `A::ARITY` argument elements.
    fn deserialize_pack<R, A>(obj: &Self::SerialObject) -> Result<PackedCall<R, A>>
    where
        R: RpcType,
        A: ArgList<Self>;

    fn get_func_name(obj: &Self::SerialObject) -> Result<String>;

    /// The error recorded in the object, or `None` when the object does not
    /// record one (absent or zero `except_type`).
    fn extract_exception(obj: &Self::SerialObject) -> Option<RpcError>;

    fn set_exception(obj: &mut Self::SerialObject, error: &RpcError);
}

/// An owned argument tuple that an adapter can encode element by element and
/// rebuild with exact arity checking.
pub trait ArgList<S: SerialAdapter>: Sized {
    const ARITY: usize;

    fn push_all(&self, out: &mut Vec<S::SerialObject>) -> Result<()>;
    fn parse_all(elements: &[S::SerialObject]) -> Result<Self>;
}

fn check_arity(expected: usize, got: usize) -> Result<()> {
    if expected == got {
        Ok(())
    } else {
        Err(RpcError::new(
            ErrorKind::SignatureMismatch,
            format!("argument count mismatch: expected {expected}, got {got}"),
        ))
    }
}

impl<S: SerialAdapter> ArgList<S> for () {
    const ARITY: usize = 0;

    fn push_all(&self, _out: &mut Vec<S::SerialObject>) -> Result<()> {
        Ok(())
    }

    fn parse_all(elements: &[S::SerialObject]) -> Result<Self> {
        check_arity(0, elements.len())
    }
}

macro_rules! impl_arg_list {
    ($len:expr; $($ty:ident . $idx:tt),+) => {
        impl<S: SerialAdapter, $($ty: RpcType),+> ArgList<S> for ($($ty,)+) {
            const ARITY: usize = $len;

            fn push_all(&self, out: &mut Vec<S::SerialObject>) -> Result<()> {
                $(out.push(S::push_arg(&self.$idx)?);)+
                Ok(())
            }

            fn parse_all(elements: &[S::SerialObject]) -> Result<Self> {
                check_arity($len, elements.len())?;
                Ok(($(S::parse_arg::<$ty>(&elements[$idx])?,)+))
            }
        }
    };
}

impl_arg_list!(1; A0.0);
impl_arg_list!(2; A0.0, A1.1);
impl_arg_list!(3; A0.0, A1.1, A2.2);
impl_arg_list!(4; A0.0, A1.1, A2.2, A3.3);
impl_arg_list!(5; A0.0, A1.1, A2.2, A3.3, A4.4);
impl_arg_list!(6; A0.0, A1.1, A2.2, A3.3, A4.4, A5.5);
impl_arg_list!(7; A0.0, A1.1, A2.2, A3.3, A4.4, A5.5, A6.6);
impl_arg_list!(8; A0.0, A1.1, A2.2, A3.3, A4.4, A5.5, A6.6, A7.7);
impl_arg_list!(9; A0.0, A1.1, A2.2, A3.3, A4.4, A5.5, A6.6, A7.7, A8.8);
impl_arg_list!(10; A0.0, A1.1, A2.2, A3.3, A4.4, A5.5, A6.6, A7.7, A8.8, A9.9);
