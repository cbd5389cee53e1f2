//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /set` - Store a string with optional TTL
//! - `GET /get/:key` - Retrieve a string and its remaining TTL
//! - `DELETE /del/:key` - Delete a key of any kind
//! - `POST /expire` - Restart a key's TTL
//! - `POST /incr` - Add to a counter
//! - `POST /sadd` - Add set members
//! - `GET /smembers/:key` - List set members
//! - `GET /srandmember/:key?count=N` - Sample distinct set members
//! - `PUT /hset` - Write hash fields
//! - `GET /hgetall/:key` - Read all hash fields
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
