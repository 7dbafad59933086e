//! Domain primitives shared by the thriftstock crates: the error model, the
//! `Sku` identifier and the aggregate/entity/value-object/event traits.
//!
//! Nothing here does IO.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::Sku;
pub use value_object::ValueObject;
