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

//! Transport abstraction: the backend contract concrete transports implement
//! and the caller-facing send/register surface layered on top of it.
//!
//! A backend implements [`UTransport`] (`do_send`, `do_register_listener`,
//! `cleanup_listener`) and never manages listener lifetimes itself. Callers
//! go through [`UTransportExt`] on an `Arc`'d transport: `register_listener`
//! wires the callback into a [`crate::utils::callbacks`] connection, hands
//! the backend the weak [`CallableConn`] side, and returns the strong
//! [`ListenerHandle`]. Dropping the handle invalidates the weak side first
//! and then calls the backend's `cleanup_listener` exactly once.

use crate::datamodel::umessage::UMessage;
use crate::datamodel::ustatus::UStatus;
use crate::datamodel::uuri::UUri;
use crate::utils::callbacks::{self, Callable, ConnectionHandle};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

const UTRANSPORT_TAG: &str = "UTransport:";
const UTRANSPORT_FN_SEND_TAG: &str = "send():";
const UTRANSPORT_FN_REGISTER_LISTENER_TAG: &str = "register_listener():";

/// Weak side of a listener registration, held and invoked by the backend.
/// Guaranteed no-op once the matching [`ListenerHandle`] is gone.
pub type CallableConn = Callable<UMessage>;

/// Strong side of a listener registration, owned by the registering caller.
/// Move-only; dropping or releasing it tears the registration down.
pub type ListenerHandle = ConnectionHandle<UMessage>;

/// Backend contract implemented by concrete transports.
///
/// These are the only points where backend-specific networking or
/// serialization occurs; the core treats them as opaque.
#[async_trait]
pub trait UTransport: Send + Sync {
    /// The owning entity's own endpoint, fixed for the transport's lifetime.
    fn default_source(&self) -> &UUri;

    /// Delivers `message` over the backend.
    async fn do_send(&self, message: UMessage) -> Result<(), UStatus>;

    /// Connects `listener` to inbound messages matching `sink_filter` (and
    /// `source_filter`, when given). The backend stores the [`CallableConn`]
    /// and invokes it for each match; invoking a disconnected one is safe.
    async fn do_register_listener(
        &self,
        sink_filter: &UUri,
        listener: CallableConn,
        source_filter: Option<&UUri>,
    ) -> Result<(), UStatus>;

    /// Releases backend resources for a torn-down registration.
    ///
    /// Called exactly once per successfully registered listener, after
    /// `listener` already reads disconnected — so this may take backend
    /// locks without racing an in-flight invocation. Must not panic: it runs
    /// on the handle's drop path.
    fn cleanup_listener(&self, listener: CallableConn);
}

/// Caller-facing transport API, available on any `Arc<impl UTransport>`
/// (including `Arc<dyn UTransport>`).
#[async_trait]
pub trait UTransportExt {
    /// Sends `message` over this transport. Backend errors are returned
    /// verbatim; retry policy belongs to the caller.
    async fn send(&self, message: UMessage) -> Result<(), UStatus>;

    /// Registers `listener` for inbound messages matching `sink_filter` (and
    /// `source_filter`, when given).
    ///
    /// On success the returned [`ListenerHandle`] is the sole owner of the
    /// registration. On failure no callback is retained and any weak
    /// reference the backend saw already reads disconnected; the backend's
    /// `cleanup_listener` is not called for a registration it rejected.
    async fn register_listener<F>(
        &self,
        sink_filter: &UUri,
        listener: F,
        source_filter: Option<&UUri>,
    ) -> Result<ListenerHandle, UStatus>
    where
        F: Fn(UMessage) + Send + Sync + 'static;

    /// The transport's own endpoint address.
    fn get_default_source(&self) -> &UUri;
}

#[async_trait]
impl<T> UTransportExt for Arc<T>
where
    T: UTransport + ?Sized + 'static,
{
    async fn send(&self, message: UMessage) -> Result<(), UStatus> {
        let result = self.do_send(message).await;
        if let Err(ref status) = result {
            debug!(
                "{}:{} backend send failed: {}",
                UTRANSPORT_TAG, UTRANSPORT_FN_SEND_TAG, status
            );
        }
        result
    }

    async fn register_listener<F>(
        &self,
        sink_filter: &UUri,
        listener: F,
        source_filter: Option<&UUri>,
    ) -> Result<ListenerHandle, UStatus>
    where
        F: Fn(UMessage) + Send + Sync + 'static,
    {
        let transport = Arc::clone(self);
        let (handle, callable) = callbacks::establish(
            listener,
            Some(Box::new(move |conn: CallableConn| {
                transport.cleanup_listener(conn);
            })),
        );

        match self
            .do_register_listener(sink_filter, callable, source_filter)
            .await
        {
            Ok(()) => {
                debug!(
                    "{}:{} listener registered, sink filter: {}",
                    UTRANSPORT_TAG, UTRANSPORT_FN_REGISTER_LISTENER_TAG, sink_filter
                );
                Ok(handle)
            }
            Err(status) => {
                warn!(
                    "{}:{} backend rejected listener, sink filter: {}, error: {}",
                    UTRANSPORT_TAG, UTRANSPORT_FN_REGISTER_LISTENER_TAG, sink_filter, status
                );
                handle.abandon();
                Err(status)
            }
        }
    }

    fn get_default_source(&self) -> &UUri {
        self.default_source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::umessage::UMessageBuilder;
    use crate::datamodel::ustatus::UCode;
    use std::sync::Mutex;

    fn some_uri() -> UUri {
        UUri::try_from_parts("SomeAuth", 0x18000, 0x1, 0x0).expect("valid UUri")
    }

    struct FakeUTransport {
        source: UUri,
        next_send_status: Mutex<Option<UStatus>>,
        next_listen_status: Mutex<Option<UStatus>>,
        send_count: Mutex<usize>,
        last_sent_message: Mutex<Option<UMessage>>,
        last_listener: Mutex<Option<CallableConn>>,
        last_sink_filter: Mutex<Option<UUri>>,
        last_source_filter: Mutex<Option<UUri>>,
        cleanup_count: Mutex<usize>,
        last_cleanup_listener: Mutex<Option<CallableConn>>,
    }

    impl FakeUTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                source: some_uri(),
                next_send_status: Mutex::new(None),
                next_listen_status: Mutex::new(None),
                send_count: Mutex::new(0),
                last_sent_message: Mutex::new(None),
                last_listener: Mutex::new(None),
                last_sink_filter: Mutex::new(None),
                last_source_filter: Mutex::new(None),
                cleanup_count: Mutex::new(0),
                last_cleanup_listener: Mutex::new(None),
            })
        }

        fn mock_message(&self, message: UMessage) {
            let listener = self
                .last_listener
                .lock()
                .expect("lock last_listener")
                .clone()
                .expect("a listener must be registered first");
            listener.invoke(message);
        }
    }

    #[async_trait]
    impl UTransport for FakeUTransport {
        fn default_source(&self) -> &UUri {
            &self.source
        }

        async fn do_send(&self, message: UMessage) -> Result<(), UStatus> {
            *self.send_count.lock().expect("lock send_count") += 1;
            *self.last_sent_message.lock().expect("lock last_sent_message") = Some(message);
            match self.next_send_status.lock().expect("lock next_send_status").take() {
                Some(status) => Err(status),
                None => Ok(()),
            }
        }

        async fn do_register_listener(
            &self,
            sink_filter: &UUri,
            listener: CallableConn,
            source_filter: Option<&UUri>,
        ) -> Result<(), UStatus> {
            *self.last_listener.lock().expect("lock last_listener") = Some(listener);
            *self.last_sink_filter.lock().expect("lock last_sink_filter") =
                Some(sink_filter.clone());
            *self.last_source_filter.lock().expect("lock last_source_filter") =
                source_filter.cloned();
            match self
                .next_listen_status
                .lock()
                .expect("lock next_listen_status")
                .take()
            {
                Some(status) => Err(status),
                None => Ok(()),
            }
        }

        fn cleanup_listener(&self, listener: CallableConn) {
            *self.cleanup_count.lock().expect("lock cleanup_count") += 1;
            *self
                .last_cleanup_listener
                .lock()
                .expect("lock last_cleanup_listener") = Some(listener);
        }
    }

    fn publish_message(marker: &'static [u8]) -> UMessage {
        UMessageBuilder::publish(
            UUri::try_from_parts("SomeAuth", 0x18000, 0x1, 0x8001).expect("valid topic"),
        )
        .with_payload(marker)
        .build()
        .expect("message builds")
    }

    #[tokio::test]
    async fn send_delegates_to_backend_and_returns_its_status_verbatim() {
        let transport = FakeUTransport::new();

        assert!(transport.send(publish_message(b"first")).await.is_ok());
        assert_eq!(*transport.send_count.lock().expect("lock send_count"), 1);

        let backend_error = UStatus::fail_with_code(UCode::Unavailable, "link down");
        *transport
            .next_send_status
            .lock()
            .expect("lock next_send_status") = Some(backend_error.clone());

        let err = transport
            .send(publish_message(b"second"))
            .await
            .expect_err("backend failure must surface");
        assert_eq!(err, backend_error);
        assert_eq!(*transport.send_count.lock().expect("lock send_count"), 2);
    }

    #[tokio::test]
    async fn cleanup_gets_called_with_the_registered_listener() {
        let transport = FakeUTransport::new();
        let sink = transport.get_default_source().clone();

        let mut handle = transport
            .register_listener(&sink, |_message| {}, None)
            .await
            .expect("registration succeeds");

        assert!(handle.is_connected());
        {
            let last_listener = transport.last_listener.lock().expect("lock last_listener");
            assert!(last_listener.as_ref().is_some_and(CallableConn::is_connected));
        }
        assert_eq!(*transport.cleanup_count.lock().expect("lock cleanup_count"), 0);

        handle.release();

        assert!(!handle.is_connected());
        assert_eq!(*transport.cleanup_count.lock().expect("lock cleanup_count"), 1);
        let last_listener = transport.last_listener.lock().expect("lock last_listener");
        let last_cleaned = transport
            .last_cleanup_listener
            .lock()
            .expect("lock last_cleanup_listener");
        assert!(!last_listener.as_ref().expect("listener recorded").is_connected());
        assert_eq!(
            last_listener.as_ref().expect("listener recorded"),
            last_cleaned.as_ref().expect("cleaned listener recorded")
        );
    }

    #[tokio::test]
    async fn dropping_the_handle_cleans_up_exactly_once() {
        let transport = FakeUTransport::new();
        let sink = transport.get_default_source().clone();

        let handle = transport
            .register_listener(&sink, |_message| {}, None)
            .await
            .expect("registration succeeds");
        drop(handle);

        assert_eq!(*transport.cleanup_count.lock().expect("lock cleanup_count"), 1);
    }

    #[tokio::test]
    async fn delivered_messages_reach_the_callback_in_order() {
        let transport = FakeUTransport::new();
        let sink = transport.get_default_source().clone();
        let received = Arc::new(Mutex::new(Vec::new()));

        let recorder = received.clone();
        let _handle = transport
            .register_listener(
                &sink,
                move |message: UMessage| {
                    recorder.lock().expect("lock received").push(message);
                },
                None,
            )
            .await
            .expect("registration succeeds");

        let messages: Vec<UMessage> = [b"one" as &[u8], b"two", b"three"]
            .into_iter()
            .map(|marker| {
                UMessageBuilder::publish(
                    UUri::try_from_parts("SomeAuth", 0x18000, 0x1, 0x8001).expect("valid topic"),
                )
                .with_payload(marker)
                .build()
                .expect("message builds")
            })
            .collect();
        for message in &messages {
            transport.mock_message(message.clone());
        }

        assert_eq!(*received.lock().expect("lock received"), messages);
    }

    #[tokio::test]
    async fn no_callback_fires_after_the_handle_is_released() {
        let transport = FakeUTransport::new();
        let sink = transport.get_default_source().clone();
        let received = Arc::new(Mutex::new(Vec::new()));

        let recorder = received.clone();
        let mut handle = transport
            .register_listener(
                &sink,
                move |message: UMessage| {
                    recorder.lock().expect("lock received").push(message);
                },
                None,
            )
            .await
            .expect("registration succeeds");

        transport.mock_message(publish_message(b"before"));
        handle.release();
        transport.mock_message(publish_message(b"after"));

        assert_eq!(received.lock().expect("lock received").len(), 1);
    }

    #[tokio::test]
    async fn rejected_registration_leaves_no_usable_callback_and_no_cleanup() {
        let transport = FakeUTransport::new();
        let sink = transport.get_default_source().clone();
        *transport
            .next_listen_status
            .lock()
            .expect("lock next_listen_status") = Some(UStatus::fail_with_code(
            UCode::ResourceExhausted,
            "listener table full",
        ));

        let err = transport
            .register_listener(&sink, |_message| {}, None)
            .await
            .expect_err("backend rejection must surface");
        assert_eq!(err.code(), UCode::ResourceExhausted);

        // The weak side the backend stored is already disconnected and
        // invoking it does nothing.
        let stored = transport
            .last_listener
            .lock()
            .expect("lock last_listener")
            .clone()
            .expect("backend saw the listener");
        assert!(!stored.is_connected());
        stored.invoke(publish_message(b"late"));
        assert_eq!(*transport.cleanup_count.lock().expect("lock cleanup_count"), 0);
    }

    #[tokio::test]
    async fn filters_are_passed_through_to_the_backend() {
        let transport = FakeUTransport::new();
        let sink = UUri::try_from_parts("SomeAuth", 0x18000, 0x1, 0x8001).expect("valid sink");
        let source = UUri::try_from_parts("OtherAuth", 0x5678, 0x1, 0x0).expect("valid source");

        let _handle = transport
            .register_listener(&sink, |_message| {}, Some(&source))
            .await
            .expect("registration succeeds");

        assert_eq!(
            transport
                .last_sink_filter
                .lock()
                .expect("lock last_sink_filter")
                .clone(),
            Some(sink)
        );
        assert_eq!(
            transport
                .last_source_filter
                .lock()
                .expect("lock last_source_filter")
                .clone(),
            Some(source)
        );
    }

    #[test]
    fn default_source_is_a_pure_accessor() {
        let transport = FakeUTransport::new();
        assert_eq!(transport.get_default_source(), &some_uri());
    }
}
