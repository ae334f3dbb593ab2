//! # cinder_component
//!
//! The leaf layer of the entity/component substrate.
//!
//! This crate provides:
//!
//! - [`Entity`]: lightweight `u64` entity identifiers.
//! - [`EntityAllocator`]: monotonically increasing, never-recycled ID allocator.
//! - [`Component`] trait and [`ComponentTypeId`]: what a component kind is.
//! - [`ComponentMap`] / [`ErasedMap`]: typed storage for one kind, and its
//!   type-erased face.
//! - [`Filter`]: required / forbidden / require-one presence predicates.

pub mod component;
pub mod entity;
pub mod filter;
pub mod map;

pub use component::{Component, ComponentTypeId};
pub use entity::{Entity, EntityAllocator};
pub use filter::{Filter, FilterBuilder};
pub use map::{ComponentMap, ErasedMap};
