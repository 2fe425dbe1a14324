use serde::{de::DeserializeOwned, Serialize};
use std::collections::VecDeque;

/// Wire-level shape of an RPC value.
///
/// Adapters validate a decoded element against its expected shape before
/// handing it to the deserializer, so an integer is rejected where a float is
/// expected (and vice versa) instead of being silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Bool,
    Int,
    Float,
    Text,
    Unit,
    /// Ordered container; the element shape is checked recursively.
    Seq(&'static Shape),
    /// Fixed-arity sequence; one shape per position.
    Tuple(&'static [Shape]),
    /// User-defined type; the adapter delegates to its serde hooks.
    Object,
}

/// A Rust type that can travel as an RPC argument or result.
///
/// Scalars, `String`, ordered containers, and tuples are covered here. User
/// types opt in with serde derives plus the [`rpc_object!`](crate::rpc_object)
/// macro (or an explicit impl choosing a more precise [`Shape`]).
pub trait RpcType: Serialize + DeserializeOwned {
    const SHAPE: Shape;

    /// The single inhabitant of a unit-like type. Unit results are elided on
    /// the wire, so the client reconstructs them from this constant.
    const UNIT: Option<Self> = None;
}

macro_rules! impl_rpc_scalar {
    ($($ty:ty => $shape:expr),* $(,)?) => {$(
        impl RpcType for $ty {
            const SHAPE: Shape = $shape;
        }
    )*};
}

impl_rpc_scalar! {
    bool => Shape::Bool,
    i8 => Shape::Int,
    i16 => Shape::Int,
    i32 => Shape::Int,
    i64 => Shape::Int,
    isize => Shape::Int,
    u8 => Shape::Int,
    u16 => Shape::Int,
    u32 => Shape::Int,
    u64 => Shape::Int,
    usize => Shape::Int,
    f32 => Shape::Float,
    f64 => Shape::Float,
    char => Shape::Text,
    String => Shape::Text,
}

impl RpcType for () {
    const SHAPE: Shape = Shape::Unit;
    const UNIT: Option<()> = Some(());
}

impl<T: RpcType> RpcType for Vec<T> {
    const SHAPE: Shape = Shape::Seq(&T::SHAPE);
}

impl<T: RpcType> RpcType for VecDeque<T> {
    const SHAPE: Shape = Shape::Seq(&T::SHAPE);
}

macro_rules! impl_rpc_tuple {
    ($($ty:ident),+) => {
        impl<$($ty: RpcType),+> RpcType for ($($ty,)+) {
            const SHAPE: Shape = Shape::Tuple(&[$($ty::SHAPE),+]);
        }
    };
}

impl_rpc_tuple!(T0);
impl_rpc_tuple!(T0, T1);
impl_rpc_tuple!(T0, T1, T2);
impl_rpc_tuple!(T0, T1, T2, T3);
impl_rpc_tuple!(T0, T1, T2, T3, T4);
impl_rpc_tuple!(T0, T1, T2, T3, T4, T5);
impl_rpc_tuple!(T0, T1, T2, T3, T4, T5, T6);
impl_rpc_tuple!(T0, T1, T2, T3, T4, T5, T6, T7);
impl_rpc_tuple!(T0, T1, T2, T3, T4, T5, T6, T7, T8);
impl_rpc_tuple!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9);

/// One argument at a client call site.
///
/// Arguments are passed by reference and decay to an owned wire value:
/// `&T` and `&mut T` decay to `T`, `&str` to `String`, `&[T]` to `Vec<T>`.
/// After the reply is parsed, `&mut T` arguments receive the server-side
/// value; the other forms are not written back.
pub trait CallArg {
    type Owned;

    fn to_owned_arg(&self) -> Self::Owned;
    fn write_back(self, parsed: Self::Owned);
}

impl<'a, T: RpcType + Clone> CallArg for &'a T {
    type Owned = T;

    fn to_owned_arg(&self) -> T {
        (*self).clone()
    }

    fn write_back(self, _parsed: T) {}
}

impl<'a, T: RpcType + Clone> CallArg for &'a mut T {
    type Owned = T;

    fn to_owned_arg(&self) -> T {
        (**self).clone()
    }

    fn write_back(self, parsed: T) {
        *self = parsed;
    }
}

impl<'a> CallArg for &'a str {
    type Owned = String;

    fn to_owned_arg(&self) -> String {
        (*self).to_owned()
    }

    fn write_back(self, _parsed: String) {}
}

impl<'a, T: RpcType + Clone> CallArg for &'a [T] {
    type Owned = Vec<T>;

    fn to_owned_arg(&self) -> Vec<T> {
        (*self).to_vec()
    }

    fn write_back(self, _parsed: Vec<T>) {}
}

/// The full argument tuple at a client call site.
pub trait CallArgs {
    type Owned;

    fn to_owned_args(&self) -> Self::Owned;
    fn write_back(self, parsed: Self::Owned);
}

impl CallArgs for () {
    type Owned = ();

    fn to_owned_args(&self) -> Self::Owned {}

    fn write_back(self, _parsed: ()) {}
}

macro_rules! impl_call_args {
    ($($ty:ident . $idx:tt),+) => {
        impl<$($ty: CallArg),+> CallArgs for ($($ty,)+) {
            type Owned = ($($ty::Owned,)+);

            fn to_owned_args(&self) -> Self::Owned {
                ($(self.$idx.to_owned_arg(),)+)
            }

            fn write_back(self, parsed: Self::Owned) {
                $(self.$idx.write_back(parsed.$idx);)+
            }
        }
    };
}

impl_call_args!(A0.0);
impl_call_args!(A0.0, A1.1);
impl_call_args!(A0.0, A1.1, A2.2);
impl_call_args!(A0.0, A1.1, A2.2, A3.3);
impl_call_args!(A0.0, A1.1, A2.2, A3.3, A4.4);
impl_call_args!(A0.0, A1.1, A2.2, A3.3, A4.4, A5.5);
impl_call_args!(A0.0, A1.1, A2.2, A3.3, A4.4, A5.5, A6.6);
impl_call_args!(A0.0, A1.1, A2.2, A3.3, A4.4, A5.5, A6.6, A7.7);
impl_call_args!(A0.0, A1.1, A2.2, A3.3, A4.4, A5.5, A6.6, A7.7, A8.8);
impl_call_args!(A0.0, A1.1, A2.2, A3.3, A4.4, A5.5, A6.6, A7.7, A8.8, A9.9);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_shapes() {
        assert_eq!(i32::SHAPE, Shape::Int);
        assert_eq!(f64::SHAPE, Shape::Float);
        assert_eq!(String::SHAPE, Shape::Text);
        assert_eq!(<()>::SHAPE, Shape::Unit);
        assert!(<()>::UNIT.is_some());
        assert!(i32::UNIT.is_none());
    }

    #[test]
    fn nested_shapes() {
        match <Vec<Vec<u8>>>::SHAPE {
            Shape::Seq(inner) => assert_eq!(*inner, Shape::Seq(&Shape::Int)),
            other => panic!("unexpected shape: {other:?}"),
        }
        match <(i32, String)>::SHAPE {
            Shape::Tuple(elems) => assert_eq!(elems, &[Shape::Int, Shape::Text]),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn call_arg_decay_and_write_back() {
        let mut n = 1;
        let args = (&mut n, "hi", &true);
        assert_eq!(args.to_owned_args(), (1, String::from("hi"), true));
        args.write_back((5, String::from("ignored"), false));
        assert_eq!(n, 5);
    }
}
