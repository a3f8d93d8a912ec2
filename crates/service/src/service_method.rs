use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use http::Method;
use micro_call::call::CallFactory;
use micro_call::protocol::Request;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::adapter::AdapterKind;
use crate::arguments::Arguments;
use crate::converter::ConverterKind;
use crate::error::{ArgumentError, ConfigurationError, ServiceError};
use crate::metadata::MethodMetadata;
use crate::pending::PendingResult;
use crate::request_factory::{BaseUrl, RequestFactory};
use crate::service_call::ServiceCall;
use crate::type_ref::TypeRef;

/// Everything compiled from one declared method. Independent of the Rust type the response
/// is finally decoded into, so one plan serves every [`ServiceMethod`] of the method.
#[derive(Debug)]
pub(crate) struct MethodPlan {
    pub(crate) factory: RequestFactory,
    pub(crate) adapter: AdapterKind,
    pub(crate) converter: ConverterKind,
    pub(crate) response_type: TypeRef,
}

impl MethodPlan {
    pub(crate) fn parse(base_url: &BaseUrl, metadata: &MethodMetadata) -> Result<Self, ConfigurationError> {
        let name = metadata.name();
        let return_type = metadata.return_type();

        if return_type.has_unresolvable() {
            return Err(ConfigurationError::new(
                name,
                format!("method return type must not include a type variable or wildcard: {return_type}"),
            ));
        }
        if return_type.is_unit() {
            return Err(ConfigurationError::new(name, "service methods cannot return unit"));
        }

        let factory = RequestFactory::parse(base_url, metadata)?;
        let (adapter, response_type) =
            AdapterKind::resolve(return_type).map_err(|reason| ConfigurationError::new(name, reason))?;

        if *factory.http_method() == Method::HEAD && !response_type.is_unit() {
            return Err(ConfigurationError::new(name, "HEAD method must use unit as response type"));
        }

        let converter = ConverterKind::for_type(&response_type);
        debug!(method = name, %adapter, ?converter, "service method parsed");
        Ok(Self { factory, adapter, converter, response_type })
    }

    pub(crate) fn name(&self) -> &str {
        self.factory.method_name()
    }
}

/// One declared method, ready to be invoked any number of times.
///
/// Parsing happens once, in [`ServiceMethod::parse`] or through a [`Service`](crate::Service);
/// each [`ServiceMethod::invoke`] only binds arguments, creates a call and adapts the result.
pub struct ServiceMethod<T> {
    plan: Arc<MethodPlan>,
    call_factory: Arc<dyn CallFactory>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ServiceMethod<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Compiles `metadata`. Fails before any call is created if the method is misdeclared.
    pub fn parse(
        base_url: &BaseUrl,
        metadata: &MethodMetadata,
        call_factory: Arc<dyn CallFactory>,
    ) -> Result<Self, ConfigurationError> {
        let plan = MethodPlan::parse(base_url, metadata)?;
        Ok(Self::from_plan(Arc::new(plan), call_factory))
    }

    pub(crate) fn from_plan(plan: Arc<MethodPlan>, call_factory: Arc<dyn CallFactory>) -> Self {
        Self { plan, call_factory, _marker: PhantomData }
    }

    pub fn name(&self) -> &str {
        self.plan.name()
    }

    pub fn adapter(&self) -> AdapterKind {
        self.plan.adapter
    }

    pub fn converter(&self) -> ConverterKind {
        self.plan.converter
    }

    pub fn response_type(&self) -> &TypeRef {
        &self.plan.response_type
    }

    pub fn request_factory(&self) -> &RequestFactory {
        &self.plan.factory
    }

    /// Binds `args` without creating a call.
    pub fn to_request(&self, args: &Arguments) -> Result<Request, ArgumentError> {
        self.plan.factory.create(args)
    }

    /// Binds `args`, creates a call and hands it to the resolved adapter.
    ///
    /// With the [`AdapterKind::Direct`] adapter the call is executed before this returns; with
    /// [`AdapterKind::Pending`] it is enqueued; with [`AdapterKind::Call`] it is returned as is.
    pub async fn invoke(&self, args: &Arguments) -> Result<Invocation<T>, ServiceError> {
        let request = self.plan.factory.create(args)?;
        let call = ServiceCall::new(self.call_factory.new_call(request), Arc::clone(&self.plan));

        match self.plan.adapter {
            AdapterKind::Call => Ok(Invocation::Call(call)),
            AdapterKind::Direct => call.execute().await.map(Invocation::Value),
            AdapterKind::Pending => call.enqueue().map(Invocation::Pending),
        }
    }
}

impl<T> Clone for ServiceMethod<T> {
    fn clone(&self) -> Self {
        Self { plan: Arc::clone(&self.plan), call_factory: Arc::clone(&self.call_factory), _marker: PhantomData }
    }
}

impl<T> fmt::Debug for ServiceMethod<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceMethod")
            .field("name", &self.plan.name())
            .field("adapter", &self.plan.adapter)
            .field("response_type", &self.plan.response_type)
            .finish_non_exhaustive()
    }
}

/// The result of [`ServiceMethod::invoke`], shaped by the method's adapter.
#[derive(Debug)]
pub enum Invocation<T> {
    Call(ServiceCall<T>),
    Value(T),
    Pending(PendingResult<T>),
}

impl<T> Invocation<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Drives the invocation to its value, whatever the adapter: executes a returned call,
    /// awaits a pending result.
    pub async fn resolve(self) -> Result<T, ServiceError> {
        match self {
            Invocation::Call(call) => call.execute().await,
            Invocation::Value(value) => Ok(value),
            Invocation::Pending(pending) => pending.await,
        }
    }

    pub fn into_call(self) -> Option<ServiceCall<T>> {
        match self {
            Invocation::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Invocation::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_pending(self) -> Option<PendingResult<T>> {
        match self {
            Invocation::Pending(pending) => Some(pending),
            _ => None,
        }
    }
}
