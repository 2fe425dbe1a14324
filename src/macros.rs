/// Marks serde-capable user types as RPC values with [`Shape::Object`].
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct TestMessage {
///     id: u64,
///     body: String,
/// }
///
/// packrpc::rpc_object!(TestMessage);
/// ```
///
/// [`Shape::Object`]: crate::Shape::Object
#[macro_export]
macro_rules! rpc_object {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::RpcType for $ty {
            const SHAPE: $crate::Shape = $crate::Shape::Object;
        }
    )+};
}
