use crate::adapter::{ArgList, SerialAdapter};
use crate::error::{ErrorKind, Result, RpcError};
use crate::types::RpcType;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, trace, warn};

/// A bound callback, adapted from a plain function of up to 10 arguments.
///
/// Arguments are handed to the function as `&mut` borrows of the decoded
/// tuple; whatever the function leaves in them is serialized into the reply,
/// which is how out-parameters reach the caller. Errors returned by the
/// function surface to the client as [`ErrorKind::RemoteExecution`].
pub trait Handler<A, R, E> {
    fn invoke(&self, args: &mut A) -> std::result::Result<R, E>;
}

impl<F, R, E> Handler<(), R, E> for F
where
    F: Fn() -> std::result::Result<R, E>,
{
    fn invoke(&self, _args: &mut ()) -> std::result::Result<R, E> {
        self()
    }
}

macro_rules! impl_handler {
    ($($ty:ident),+) => {
        impl<F, R, E, $($ty),+> Handler<($($ty,)+), R, E> for F
        where
            F: Fn($(&mut $ty),+) -> std::result::Result<R, E>,
        {
            #[allow(non_snake_case)]
            fn invoke(&self, args: &mut ($($ty,)+)) -> std::result::Result<R, E> {
                let ($($ty,)+) = args;
                self($($ty),+)
            }
        }
    };
}

impl_handler!(A0);
impl_handler!(A0, A1);
impl_handler!(A0, A1, A2);
impl_handler!(A0, A1, A2, A3);
impl_handler!(A0, A1, A2, A3, A4);
impl_handler!(A0, A1, A2, A3, A4, A5);
impl_handler!(A0, A1, A2, A3, A4, A5, A6);
impl_handler!(A0, A1, A2, A3, A4, A5, A6, A7);
impl_handler!(A0, A1, A2, A3, A4, A5, A6, A7, A8);
impl_handler!(A0, A1, A2, A3, A4, A5, A6, A7, A8, A9);

type HandlerFn<S> = Box<dyn Fn(&mut <S as SerialAdapter>::SerialObject) + Send + Sync>;

type CacheEntries<R> = Mutex<HashMap<Vec<u8>, R>>;

trait CacheBucket: Send + Sync {
    fn clear_entries(&self);
    fn as_any(&self) -> &(dyn Any + Send + Sync);
}

struct Bucket<R>(CacheEntries<R>);

impl<R: Send + 'static> CacheBucket for Bucket<R> {
    fn clear_entries(&self) {
        lock(&self.0).clear();
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

fn lock<R>(entries: &CacheEntries<R>) -> std::sync::MutexGuard<'_, HashMap<Vec<u8>, R>> {
    // A poisoned bucket only means a panicking handler died mid-insert;
    // the map itself is still usable.
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Typed view over one function's result cache.
pub struct FuncCache<'a, R> {
    entries: &'a CacheEntries<R>,
}

impl<'a, R: Clone> FuncCache<'a, R> {
    pub fn get(&self, request: &[u8]) -> Option<R> {
        lock(self.entries).get(request).cloned()
    }

    pub fn insert(&self, request: Vec<u8>, result: R) {
        lock(self.entries).insert(request, result);
    }

    pub fn len(&self) -> usize {
        lock(self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(self.entries).is_empty()
    }

    pub fn clear(&self) {
        lock(self.entries).clear();
    }
}

/// Server-side dispatcher: a table of named callbacks plus optional
/// per-function result caches.
///
/// Registration takes `&mut self`, dispatch takes `&self`; once the server is
/// shared (frozen), any number of threads may dispatch concurrently.
pub struct RpcServer<S: SerialAdapter> {
    dispatch_table: HashMap<String, HandlerFn<S>>,
    caches: HashMap<String, Arc<dyn CacheBucket>>,
}

impl<S: SerialAdapter> Default for RpcServer<S> {
    fn default() -> Self {
        Self {
            dispatch_table: HashMap::new(),
            caches: HashMap::new(),
        }
    }
}

impl<S: SerialAdapter> RpcServer<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `func` under `func_name`. Re-binding a name replaces the
    /// previous callback (and drops its cache, if any).
    pub fn bind<A, R, E, F>(&mut self, func_name: impl Into<String>, func: F)
    where
        A: ArgList<S>,
        R: RpcType,
        E: fmt::Display,
        F: Handler<A, R, E> + Send + Sync + 'static,
    {
        let func_name = func_name.into();
        debug!(%func_name, "binding RPC function");
        self.caches.remove(&func_name);
        self.dispatch_table.insert(
            func_name,
            Box::new(move |obj| {
                if let Err(err) = run_func::<S, A, R, E, F>(&func, obj) {
                    S::set_exception(obj, &err);
                }
            }),
        );
    }

    /// Like [`bind`](RpcServer::bind), but memoizes results keyed by the
    /// encoded request, so byte-identical reissued requests skip the
    /// callback. Unit-returning callbacks are executed every time.
    pub fn bind_cached<A, R, E, F>(&mut self, func_name: impl Into<String>, func: F)
    where
        A: ArgList<S>,
        R: RpcType + Clone + Send + Sync + 'static,
        E: fmt::Display,
        F: Handler<A, R, E> + Send + Sync + 'static,
    {
        let func_name = func_name.into();
        debug!(%func_name, "binding cached RPC function");
        let bucket = Arc::new(Bucket::<R>(Mutex::new(HashMap::new())));
        self.caches.insert(func_name.clone(), bucket.clone());
        self.dispatch_table.insert(
            func_name,
            Box::new(move |obj| {
                if let Err(err) = run_cached_func::<S, A, R, E, F>(&func, &bucket.0, obj) {
                    S::set_exception(obj, &err);
                }
            }),
        );
    }

    /// Executes one encoded request and returns the encoded reply.
    ///
    /// Never panics and never returns an error: every failure is encoded
    /// into the reply bytes.
    pub fn dispatch(&self, bytes: &[u8]) -> Vec<u8> {
        let Some(mut obj) = S::from_bytes(bytes) else {
            warn!(len = bytes.len(), "received undecodable RPC request");
            return Self::error_reply(ErrorKind::ServerReceive, "Invalid RPC object received");
        };

        let Ok(func_name) = S::get_func_name(&obj) else {
            warn!("received RPC request without a function name");
            return Self::error_reply(ErrorKind::ServerReceive, "Invalid RPC object received");
        };

        match self.dispatch_table.get(&func_name) {
            Some(handler) => {
                trace!(%func_name, "dispatching RPC request");
                handler(&mut obj);
            }
            None => {
                warn!(%func_name, "RPC request for unbound function");
                S::set_exception(
                    &mut obj,
                    &RpcError::new(
                        ErrorKind::FunctionNotFound,
                        format!("RPC error: Called function: \"{func_name}\" not found"),
                    ),
                );
            }
        }

        Self::encode_reply(obj)
    }

    /// Typed view over the result cache bound to `func_name`. `None` when
    /// the name is unbound, bound without a cache, or bound with a
    /// different result type.
    pub fn get_func_cache<R: Send + 'static>(&self, func_name: &str) -> Option<FuncCache<'_, R>> {
        let bucket = self.caches.get(func_name)?.as_any();
        let bucket = bucket.downcast_ref::<Bucket<R>>()?;
        Some(FuncCache { entries: &bucket.0 })
    }

    /// Empties every function's result cache.
    pub fn clear_all_cache(&self) {
        for bucket in self.caches.values() {
            bucket.clear_entries();
        }
    }

    fn error_reply(kind: ErrorKind, mesg: &str) -> Vec<u8> {
        let mut obj = S::empty_object();
        S::set_exception(&mut obj, &RpcError::new(kind, mesg));
        Self::encode_reply(obj)
    }

    fn encode_reply(obj: S::SerialObject) -> Vec<u8> {
        match S::to_bytes(obj) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(%err, "failed to encode RPC reply");
                let mut obj = S::empty_object();
                S::set_exception(&mut obj, &RpcError::new(ErrorKind::ServerSend, err.message()));
                S::to_bytes(obj).unwrap_or_default()
            }
        }
    }
}

fn run_func<S, A, R, E, F>(func: &F, obj: &mut S::SerialObject) -> Result<()>
where
    S: SerialAdapter,
    A: ArgList<S>,
    R: RpcType,
    E: fmt::Display,
    F: Handler<A, R, E>,
{
    let mut pack = S::deserialize_pack::<R, A>(obj)?;

    let result = func
        .invoke(pack.args_mut())
        .map_err(|err| RpcError::new(ErrorKind::RemoteExecution, err.to_string()))?;

    pack.set_result(result);
    *obj = S::serialize_pack(&pack)?;
    Ok(())
}

fn run_cached_func<S, A, R, E, F>(
    func: &F,
    entries: &CacheEntries<R>,
    obj: &mut S::SerialObject,
) -> Result<()>
where
    S: SerialAdapter,
    A: ArgList<S>,
    R: RpcType + Clone,
    E: fmt::Display,
    F: Handler<A, R, E>,
{
    let mut pack = S::deserialize_pack::<R, A>(obj)?;

    // Unit results carry no payload worth memoizing; run the callback for
    // its side effects every time.
    if R::UNIT.is_some() {
        let result = func
            .invoke(pack.args_mut())
            .map_err(|err| RpcError::new(ErrorKind::RemoteExecution, err.to_string()))?;
        pack.set_result(result);
        *obj = S::serialize_pack(&pack)?;
        return Ok(());
    }

    // The key is the re-encoded request, fixed before the callback can
    // mutate any argument.
    let key = S::to_bytes(obj.clone())?;

    if let Some(result) = lock(entries).get(&key).cloned() {
        trace!(func_name = pack.func_name(), "result cache hit");
        pack.set_result(result);
        *obj = S::serialize_pack(&pack)?;
        return Ok(());
    }

    let result = func
        .invoke(pack.args_mut())
        .map_err(|err| RpcError::new(ErrorKind::RemoteExecution, err.to_string()))?;

    lock(entries).insert(key, result.clone());
    pack.set_result(result);
    *obj = S::serialize_pack(&pack)?;
    Ok(())
}
