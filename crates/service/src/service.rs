//! A named set of declared methods sharing one base URL and one call factory.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use micro_call::call::CallFactory;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::ConfigurationError;
use crate::metadata::MethodMetadata;
use crate::request_factory::{BaseUrl, BaseUrlError};
use crate::service_method::{MethodPlan, ServiceMethod};

/// Compiles declared methods on first use and caches the result, so concurrent lookups of the
/// same method share one parse.
#[derive(Clone)]
pub struct Service {
    inner: Arc<Inner>,
}

struct Inner {
    base_url: BaseUrl,
    call_factory: Arc<dyn CallFactory>,
    declared: HashMap<String, MethodMetadata>,
    plans: RwLock<HashMap<String, Arc<MethodPlan>>>,
}

impl Service {
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.inner.base_url
    }

    /// Names of every declared method, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.declared.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The method declared as `name`, decoding its responses into `T`.
    pub fn method<T>(&self, name: &str) -> Result<ServiceMethod<T>, ConfigurationError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let plan = self.plan(name)?;
        Ok(ServiceMethod::from_plan(plan, Arc::clone(&self.inner.call_factory)))
    }

    fn plan(&self, name: &str) -> Result<Arc<MethodPlan>, ConfigurationError> {
        if let Some(plan) = self.read_plans().get(name) {
            return Ok(Arc::clone(plan));
        }

        let metadata = self
            .inner
            .declared
            .get(name)
            .ok_or_else(|| ConfigurationError::new(name, "method is not declared on this service"))?;

        let mut plans = self.inner.plans.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        // another caller may have parsed it while we waited for the lock
        if let Some(plan) = plans.get(name) {
            return Ok(Arc::clone(plan));
        }
        let plan = Arc::new(MethodPlan::parse(&self.inner.base_url, metadata)?);
        plans.insert(name.to_string(), Arc::clone(&plan));
        Ok(plan)
    }

    fn read_plans(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<MethodPlan>>> {
        self.inner.plans.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("base_url", &self.inner.base_url)
            .field("methods", &self.method_names())
            .finish_non_exhaustive()
    }
}

#[derive(Error, Debug)]
pub enum ServiceBuildError {
    #[error("base url must be set")]
    MissingBaseUrl,

    #[error("invalid base url: {source}")]
    InvalidBaseUrl {
        #[from]
        source: BaseUrlError,
    },

    #[error("call factory must be set")]
    MissingCallFactory,

    #[error("method {name} is declared more than once")]
    DuplicateMethod { name: String },

    #[error("invalid method: {source}")]
    Configuration {
        #[from]
        source: ConfigurationError,
    },
}

pub struct ServiceBuilder {
    base_url: Option<String>,
    call_factory: Option<Arc<dyn CallFactory>>,
    methods: Vec<MethodMetadata>,
    validate_eagerly: bool,
}

impl ServiceBuilder {
    fn new() -> Self {
        Self { base_url: None, call_factory: None, methods: vec![], validate_eagerly: false }
    }

    /// Must be absolute and end with `/`.
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn call_factory<F: CallFactory + 'static>(mut self, call_factory: F) -> Self {
        self.call_factory = Some(Arc::new(call_factory));
        self
    }

    pub fn shared_call_factory(mut self, call_factory: Arc<dyn CallFactory>) -> Self {
        self.call_factory = Some(call_factory);
        self
    }

    pub fn declare(mut self, metadata: MethodMetadata) -> Self {
        self.methods.push(metadata);
        self
    }

    /// Parse every method in [`ServiceBuilder::build`] instead of on first use.
    pub fn validate_eagerly(mut self, validate_eagerly: bool) -> Self {
        self.validate_eagerly = validate_eagerly;
        self
    }

    pub fn build(self) -> Result<Service, ServiceBuildError> {
        let base_url = BaseUrl::parse(&self.base_url.ok_or(ServiceBuildError::MissingBaseUrl)?)?;
        let call_factory = self.call_factory.ok_or(ServiceBuildError::MissingCallFactory)?;

        let mut declared = HashMap::with_capacity(self.methods.len());
        for metadata in self.methods {
            let name = metadata.name().to_string();
            if declared.contains_key(&name) {
                return Err(ServiceBuildError::DuplicateMethod { name });
            }
            declared.insert(name, metadata);
        }

        let mut plans = HashMap::new();
        if self.validate_eagerly {
            for (name, metadata) in &declared {
                plans.insert(name.clone(), Arc::new(MethodPlan::parse(&base_url, metadata)?));
            }
            debug!(methods = plans.len(), "validated service methods");
        }

        info!(%base_url, methods = declared.len(), "service built");
        Ok(Service { inner: Arc::new(Inner { base_url, call_factory, declared, plans: RwLock::new(plans) }) })
    }
}

impl fmt::Debug for ServiceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("base_url", &self.base_url)
            .field("methods", &self.methods.len())
            .field("validate_eagerly", &self.validate_eagerly)
            .finish_non_exhaustive()
    }
}
