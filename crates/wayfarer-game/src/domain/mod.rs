//! Domain layer: entities, turn buffers and persistence traits.

pub mod action;
pub mod campaign;
pub mod catalog;
pub mod event;
pub mod repository;
pub mod turn;
