//! Effect-handler interpreter for static models
//!
//! - [`tracer`]: the `trace`/`cache` primitives, the [`Model`](tracer::Model)
//!   and [`Handler`](tracer::Handler) traits and the interpreter entry point
//! - [`handlers`]: one handler per generative function operation
//! - [`static_gen_fn`]: [`gen`](static_gen_fn::gen), which packages a model
//!   body as a generative function

pub mod handlers;
pub mod static_gen_fn;
pub mod tracer;

pub mod prelude {
    pub use super::handlers::prelude::*;
    pub use super::static_gen_fn::{gen, gen_with_config, StaticGenFn};
    pub use super::tracer::{interpret, Handler, Model, Tracer};
}

