//! Request and Response models for the cache server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    validate_key, AddMembersRequest, ExpireRequest, HashSetRequest, IncrRequest,
    RandomMembersQuery, SetRequest,
};
pub use responses::{
    AddMembersResponse, CounterResponse, DeleteResponse, ExpireResponse, GetResponse,
    HashResponse, HashSetResponse, HealthResponse, MembersResponse, SetResponse, StatsResponse,
};
