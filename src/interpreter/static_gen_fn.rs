//! Turning a model body into a generative function

use std::fmt;
use std::sync::Arc;

use crate::ad::Real;
use crate::datatypes::choice_map::ChoiceMap;
use crate::datatypes::value::Value;
use crate::error::GenResult;
use crate::generative::config::GenConfig;
use crate::generative::trace::Trace;
use crate::generative::traits::{GenFn, GenerativeFunction};
use crate::interpreter::handlers::{Assess, Generate, Simulate, Update};
use crate::interpreter::tracer::Model;
use crate::random::Key;

/// A generative function whose every operation is derived from one
/// [`Model`] body by running it under the matching handler
pub struct StaticGenFn<M> {
    model: M,
    name: String,
    config: GenConfig,
}

impl<M: Model> StaticGenFn<M> {
    pub fn new(model: M) -> Self {
        Self::with_config(model, GenConfig::default())
    }

    pub fn with_config(model: M, config: GenConfig) -> Self {
        let name = config.name.clone().unwrap_or_else(|| {
            let full = std::any::type_name::<M>();
            full.rsplit("::").next().unwrap_or(full).to_string()
        });
        Self {
            model,
            name,
            config,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }
}

impl<M> fmt::Debug for StaticGenFn<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticGenFn")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}

impl<M: Model> GenerativeFunction for StaticGenFn<M> {
    fn name(&self) -> &str {
        &self.name
    }

    fn simulate(self: Arc<Self>, key: Key, args: &[Value]) -> GenResult<Trace> {
        Simulate::new().handle(self, key, args)
    }

    fn importance(
        self: Arc<Self>,
        key: Key,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real)> {
        let (weight, trace) = Generate::new(constraints).handle(self, key, args)?;
        Ok((trace, weight))
    }

    fn assess(&self, choices: &ChoiceMap, args: &[Value]) -> GenResult<(Real, Value)> {
        Assess::new(choices).handle(self, args)
    }

    fn update(
        self: Arc<Self>,
        key: Key,
        trace: &Trace,
        constraints: &ChoiceMap,
        args: &[Value],
    ) -> GenResult<(Trace, Real, ChoiceMap)> {
        Update::new(trace, constraints).handle(self, key, args)
    }
}

/// Wrap a model body as a shared generative function
pub fn gen<M: Model>(model: M) -> GenFn {
    Arc::new(StaticGenFn::new(model))
}

/// Wrap a model body with explicit configuration
pub fn gen_with_config<M: Model>(model: M, config: GenConfig) -> GenFn {
    Arc::new(StaticGenFn::with_config(model, config))
}
