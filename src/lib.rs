/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! # up-core
//!
//! `up-core` is the transport-agnostic messaging core of a uProtocol stack:
//! uEntities exchange envelope messages over pluggable transports (a pub/sub
//! fabric, a SOME/IP bus) through one uniform abstraction. The crate owns the
//! concurrency-safe plumbing beneath that abstraction:
//!
//! - [`UTransport`] / [`UTransportExt`]: the backend contract concrete
//!   transports implement, and the caller-facing send/register surface.
//! - [`ListenerHandle`] / [`CallableConn`]: the strong/weak pair that makes
//!   listener teardown deterministic and exactly-once even under concurrent
//!   delivery.
//! - [`SafeMap`]: a lock-guarded associative container with atomic bulk
//!   transactions and no iterator-shaped API.
//! - [`CyclicQueue`]: a bounded queue with a timeout-aware blocking pop.
//! - [`UuidBuilder`]: a monotonic 128-bit identifier generator with
//!   injectable time/entropy sources for deterministic testing.
//!
//! ## Registering a listener and sending
//!
//! A concrete backend implements the three `UTransport` operations; callers
//! only ever see `send` and `register_listener`:
//!
//! ```
//! use std::sync::Arc;
//! use up_core::{
//!     CallableConn, UMessage, UMessageBuilder, UStatus, UTransport, UTransportExt, UUri,
//! };
//! use up_core::utils::safe_map::SafeMap;
//! use async_trait::async_trait;
//!
//! /// Loopback backend: delivers every sent message to each listener whose
//! /// sink filter matches, tracking registrations in a `SafeMap`.
//! struct LoopbackTransport {
//!     source: UUri,
//!     listeners: SafeMap<UUri, CallableConn>,
//! }
//!
//! #[async_trait]
//! impl UTransport for LoopbackTransport {
//!     fn default_source(&self) -> &UUri {
//!         &self.source
//!     }
//!
//!     async fn do_send(&self, message: UMessage) -> Result<(), UStatus> {
//!         self.listeners.transact_read(|listeners| {
//!             for (filter, listener) in listeners {
//!                 if filter.matches(&message.attributes.source) {
//!                     listener.invoke(message.clone());
//!                 }
//!             }
//!         });
//!         Ok(())
//!     }
//!
//!     async fn do_register_listener(
//!         &self,
//!         sink_filter: &UUri,
//!         listener: CallableConn,
//!         _source_filter: Option<&UUri>,
//!     ) -> Result<(), UStatus> {
//!         self.listeners.insert(sink_filter.clone(), listener);
//!         Ok(())
//!     }
//!
//!     fn cleanup_listener(&self, listener: CallableConn) {
//!         self.listeners
//!             .transact_mut(|listeners| listeners.retain(|_, stored| *stored != listener));
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let topic = UUri::try_from_parts("loopback", 0x5BA0, 0x1, 0x8001).unwrap();
//! let transport: Arc<dyn UTransport> = Arc::new(LoopbackTransport {
//!     source: topic.clone(),
//!     listeners: SafeMap::new(),
//! });
//!
//! let handle = transport
//!     .register_listener(&topic, |message| println!("got {}", message.attributes.id), None)
//!     .await
//!     .unwrap();
//!
//! let message = UMessageBuilder::publish(topic).build().unwrap();
//! transport.send(message).await.unwrap();
//!
//! // Dropping the handle invalidates the weak side and runs
//! // `cleanup_listener` exactly once.
//! drop(handle);
//! # });
//! ```
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events. Library code emits events and
//! does not initialize a global subscriber; binaries and tests are
//! responsible for one-time `tracing_subscriber` initialization at process
//! boundaries.

pub mod datamodel;
pub mod transport;
pub mod utils;

pub use datamodel::umessage::{UAttributes, UMessage, UMessageBuilder, UMessageType};
pub use datamodel::ustatus::{UCode, UStatus};
pub use datamodel::uuid::UUID;
pub use datamodel::uuid_builder::UuidBuilder;
pub use datamodel::uuri::UUri;
pub use transport::{CallableConn, ListenerHandle, UTransport, UTransportExt};
pub use utils::cyclic_queue::CyclicQueue;
pub use utils::safe_map::SafeMap;
