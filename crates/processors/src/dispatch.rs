//! Routing a payload to the processor for its kind.

use std::{any::Any, panic::AssertUnwindSafe};

use {
    docbridge_media::{DocumentPayload, ProcessorKind},
    futures::FutureExt,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use docbridge_metrics::{counter, histogram, labels, processors as proc_metrics};

use crate::{
    error::{Error, Result},
    processor::{MountTarget, ProcessedResult},
    registry::ProcessorRegistry,
};

pub struct Dispatcher {
    registry: ProcessorRegistry,
}

impl Dispatcher {
    pub fn new(registry: ProcessorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// Hand `payload` to the processor for its kind.
    ///
    /// Unknown formats fail before any processor runs. Processor failures,
    /// including panics, come back as [`Error::Processing`].
    pub async fn process(
        &self,
        payload: &DocumentPayload,
        mount: &MountTarget,
    ) -> Result<ProcessedResult> {
        let kind = payload.kind();
        if kind == ProcessorKind::Unknown {
            #[cfg(feature = "metrics")]
            counter!(proc_metrics::UNSUPPORTED_TOTAL).increment(1);
            return Err(Error::unsupported(payload.file_name()));
        }

        let Some(processor) = self.registry.get(kind) else {
            return Err(Error::processing(kind, "no processor is registered"));
        };

        debug!(
            %kind,
            processor = processor.name(),
            file_name = payload.file_name(),
            bytes = payload.len(),
            "dispatching document"
        );

        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();
        #[cfg(feature = "metrics")]
        counter!(proc_metrics::INVOCATIONS_TOTAL, labels::KIND => kind.as_str()).increment(1);

        let outcome = AssertUnwindSafe(processor.process(payload.bytes(), mount))
            .catch_unwind()
            .await;

        #[cfg(feature = "metrics")]
        histogram!(proc_metrics::DURATION_SECONDS, labels::KIND => kind.as_str())
            .record(started.elapsed().as_secs_f64());

        let result = match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(failure)) => Err(Error::processing(kind, failure)),
            Err(panic) => {
                let message = panic_message(&*panic);
                warn!(%kind, processor = processor.name(), %message, "processor panicked");
                Err(Error::processing(kind, format!("processor panicked: {message}")))
            },
        };

        #[cfg(feature = "metrics")]
        if result.is_err() {
            counter!(proc_metrics::ERRORS_TOTAL, labels::KIND => kind.as_str()).increment(1);
        }

        result
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{builtin::ContainerProbe, processor::{DocumentProcessor, ProcessorFailure}},
        async_trait::async_trait,
        docbridge_media::SourceKind,
        std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    #[derive(Clone, Copy)]
    enum Behaviour {
        Succeed,
        Fail,
        Panic,
    }

    struct Scripted {
        kind: ProcessorKind,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DocumentProcessor for Scripted {
        fn kind(&self) -> ProcessorKind {
            self.kind
        }

        fn name(&self) -> &str {
            "scripted"
        }

        async fn process(
            &self,
            _bytes: &[u8],
            mount: &MountTarget,
        ) -> std::result::Result<ProcessedResult, ProcessorFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Succeed => Ok(ProcessedResult::Mounted {
                    target: mount.id().to_owned(),
                }),
                Behaviour::Fail => Err(ProcessorFailure::new("corrupt document")),
                Behaviour::Panic => panic!("renderer exploded"),
            }
        }
    }

    fn dispatcher(kind: ProcessorKind, behaviour: Behaviour) -> (Dispatcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ProcessorRegistry::new();
        registry.register(Box::new(Scripted {
            kind,
            behaviour,
            calls: Arc::clone(&calls),
        }));
        (Dispatcher::new(registry), calls)
    }

    fn payload(name: &str) -> DocumentPayload {
        DocumentPayload::new(b"PK\x03\x04".to_vec(), name, SourceKind::Channel).unwrap()
    }

    #[tokio::test]
    async fn routes_to_processor_with_mount_target() {
        let (dispatcher, calls) = dispatcher(ProcessorKind::Word, Behaviour::Succeed);
        let mount = MountTarget::new("viewer-root");
        let result = dispatcher.process(&payload("a.docx"), &mount).await.unwrap();
        assert_eq!(result, ProcessedResult::Mounted {
            target: "viewer-root".into()
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_kind_never_invokes_a_processor() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ProcessorRegistry::new();
        for kind in ProcessorKind::RENDERABLE {
            registry.register(Box::new(Scripted {
                kind,
                behaviour: Behaviour::Succeed,
                calls: Arc::clone(&calls),
            }));
        }
        let dispatcher = Dispatcher::new(registry);
        let mount = MountTarget::new("root");

        for name in ["data.csv", "noext", "archive.zip"] {
            let err = dispatcher.process(&payload(name), &mount).await.unwrap_err();
            assert!(matches!(err, Error::UnsupportedFormat { .. }), "{name}: {err}");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn processor_failure_is_wrapped_with_kind() {
        let (dispatcher, _) = dispatcher(ProcessorKind::Excel, Behaviour::Fail);
        let err = dispatcher
            .process(&payload("a.xlsx"), &MountTarget::new("root"))
            .await
            .unwrap_err();
        assert_eq!(err, Error::Processing {
            kind: ProcessorKind::Excel,
            message: "corrupt document".into(),
        });
    }

    #[tokio::test]
    async fn processor_panic_is_contained() {
        let (dispatcher, _) = dispatcher(ProcessorKind::Word, Behaviour::Panic);
        let err = dispatcher
            .process(&payload("a.doc"), &MountTarget::new("root"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::Processing { kind: ProcessorKind::Word, ref message } if message.contains("renderer exploded"))
        );
    }

    #[tokio::test]
    async fn missing_processor_is_a_processing_error() {
        let dispatcher = Dispatcher::new(ProcessorRegistry::with_defaults());
        let err = dispatcher
            .process(&payload("a.xlsx"), &MountTarget::new("root"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Processing {
            kind: ProcessorKind::Excel,
            ..
        }));
    }

    #[tokio::test]
    async fn probe_rejects_non_office_bytes() {
        let mut registry = ProcessorRegistry::new();
        registry.register(Box::new(ContainerProbe::new(ProcessorKind::Word)));
        let dispatcher = Dispatcher::new(registry);
        let pdf = DocumentPayload::new(b"%PDF".to_vec(), "a.docx", SourceKind::Upload).unwrap();
        let err = dispatcher
            .process(&pdf, &MountTarget::new("root"))
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to process word document"));
    }
}
