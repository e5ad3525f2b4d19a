//! # Datanode Block Service
//!
//! Block-management service for one FerroDFS storage node. Owns the
//! authoritative per-block metadata table and services four RPCs: block
//! recovery, block info lookup, block copy, and block path lookup.
//!
//! ## Architecture Role
//!
//! ```text
//! [RPC transport] ──decoded requests──→ [BlockService]
//!                                            │
//!                         ┌──────────────────┼──────────────────┐
//!                         ↓                  ↓                  ↓
//!                  [ReplicaGateway]   [BlockTransfer]    [VolumeReader]
//!                   peer datanodes     target datanode    local disks
//! ```
//!
//! Transport, wire framing, and process bootstrapping live outside this
//! crate. The RPC layer delivers decoded, type-checked arguments and maps
//! typed results or [`BlockServiceError`] variants back to the wire.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Pure domain logic (entities, table, agreement, invariants)
//! - `ports/` - Port traits (inbound API, outbound SPI)
//! - `service.rs` - Application service implementing the API
//! - `events/` - Error taxonomy
//! - `test_utils` - In-memory adapters and manual clock
//!
//! ## Usage
//!
//! ```ignore
//! use dfs_block_service::{BlockService, BlockServiceConfig, DatanodeBlockApi};
//!
//! let service = BlockService::new(
//!     BlockServiceConfig::default(),
//!     local_node,
//!     replica_gateway,
//!     transfer_client,
//!     volume,
//!     clock,
//! );
//!
//! let record = service.get_block_info(requester, namespace_id, block).await?;
//! ```

pub mod domain;
pub mod events;
pub mod ports;
pub mod service;
pub mod test_utils;

pub use domain::*;
pub use events::BlockServiceError;
pub use ports::inbound::{BlockRegistry, DatanodeBlockApi};
pub use service::BlockService;
